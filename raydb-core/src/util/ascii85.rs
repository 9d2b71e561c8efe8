//! Ascii85 without the Adobe framing, as used for callback payloads.

use thiserror::Error;

const FIRST: u8 = b'!';
const LAST: u8 = b'u';
const ZERO_GROUP: u8 = b'z';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Invalid character {0:?} at position {1}")]
    InvalidChar(char, usize),
    #[error("Group overflows 32 bits")]
    Overflow,
    #[error("Dangling single character at the end")]
    Truncated,
}

pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(4) * 5);
    for chunk in bytes.chunks(4) {
        let mut group = [0u8; 4];
        group[..chunk.len()].copy_from_slice(chunk);
        let word = u32::from_be_bytes(group);
        if word == 0 && chunk.len() == 4 {
            out.push(ZERO_GROUP as char);
            continue;
        }
        let mut digits = [0u8; 5];
        let mut rest = word;
        for digit in digits.iter_mut().rev() {
            *digit = (rest % 85) as u8 + FIRST;
            rest /= 85;
        }
        // A partial group of n bytes needs n + 1 characters
        for digit in &digits[..chunk.len() + 1] {
            out.push(*digit as char);
        }
    }
    out
}

pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(text.len() / 5 * 4 + 4);
    let mut group = [0u8; 5];
    let mut len = 0;
    for (pos, c) in text.chars().enumerate() {
        if c.is_ascii_whitespace() {
            continue;
        }
        if c == ZERO_GROUP as char && len == 0 {
            out.extend_from_slice(&[0; 4]);
            continue;
        }
        if !(FIRST as char..=LAST as char).contains(&c) {
            return Err(DecodeError::InvalidChar(c, pos));
        }
        group[len] = c as u8 - FIRST;
        len += 1;
        if len == 5 {
            out.extend_from_slice(&decode_group(&group)?);
            len = 0;
        }
    }
    match len {
        0 => {}
        1 => return Err(DecodeError::Truncated),
        n => {
            for digit in group.iter_mut().skip(n) {
                *digit = LAST - FIRST;
            }
            out.extend_from_slice(&decode_group(&group)?[..n - 1]);
        }
    }
    Ok(out)
}

fn decode_group(digits: &[u8; 5]) -> Result<[u8; 4], DecodeError> {
    let word = digits
        .iter()
        .try_fold(0u32, |acc, d| acc.checked_mul(85)?.checked_add(*d as u32))
        .ok_or(DecodeError::Overflow)?;
    Ok(word.to_be_bytes())
}
