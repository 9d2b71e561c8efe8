//! Truncation of long result lists and the compact id encoding
//! that lets a "show all" button carry the complete list.

use std::fmt;

use thiserror::Error;

use crate::util::ascii85;

pub const MAX_SUMMARY_ITEMS: usize = 9;
pub const MAX_FULL_ITEMS: usize = 20;

pub const LIST_CALLBACK_PREFIX: &str = "plst";
pub const CALLBACK_DATA_LIMIT: usize = 64;
const MAX_QUERY_CHARS: usize = 55;
const REQUERY_SENTINEL: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    /// The list was cut and a "show all" affordance should be attached.
    pub show_all: bool,
    /// The list was cut even in full view.
    pub truncated: bool,
}

pub fn paginate<T>(mut items: Vec<T>, full: bool) -> Page<T> {
    let max = if full { MAX_FULL_ITEMS } else { MAX_SUMMARY_ITEMS };
    let total = items.len();
    let over = total > max;
    if over {
        items.truncate(if full { max } else { max - 1 });
    }
    Page {
        items,
        total,
        show_all: over && !full,
        truncated: over,
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PackError {
    #[error("Id {0} does not fit into 16 bits")]
    OutOfRange(i64),
    #[error("Malformed id list")]
    Malformed,
}

impl From<ascii85::DecodeError> for PackError {
    fn from(_: ascii85::DecodeError) -> Self {
        Self::Malformed
    }
}

pub fn pack_ids(ids: &[i64]) -> Result<String, PackError> {
    let mut bytes = Vec::with_capacity(ids.len() * 2);
    for &id in ids {
        let id = i16::try_from(id).map_err(|_| PackError::OutOfRange(id))?;
        bytes.extend_from_slice(&id.to_le_bytes());
    }
    Ok(ascii85::encode(&bytes))
}

pub fn unpack_ids(packed: &str) -> Result<Vec<i64>, PackError> {
    let bytes = ascii85::decode(packed)?;
    if bytes.len() % 2 != 0 {
        return Err(PackError::Malformed);
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i64::from(i16::from_le_bytes([pair[0], pair[1]])))
        .collect())
}

/// Payload of the "show all" button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCallback {
    Ids { query: String, ids: Vec<i64> },
    /// The ids did not fit, the query has to run again.
    Requery { query: String },
}

impl ListCallback {
    /// Never fails, an id list that cannot be carried degrades
    /// to the requery form.
    pub fn encode(query: &str, ids: &[i64]) -> String {
        let query = clean_query(query);
        if let Ok(packed) = pack_ids(ids) {
            let data = format!("{LIST_CALLBACK_PREFIX}:{query}:{packed}");
            if data.len() <= CALLBACK_DATA_LIMIT {
                return data;
            }
        }
        format!("{LIST_CALLBACK_PREFIX}:{query}:{REQUERY_SENTINEL}")
    }

    pub fn decode(data: &str) -> Option<Self> {
        let rest = data
            .strip_prefix(LIST_CALLBACK_PREFIX)?
            .strip_prefix(':')?;
        let (query, packed) = rest.split_once(':')?;
        let query = query.to_string();
        if packed == REQUERY_SENTINEL {
            return Some(Self::Requery { query });
        }
        match unpack_ids(packed) {
            Ok(ids) => Some(Self::Ids { query, ids }),
            Err(_) => Some(Self::Requery { query }),
        }
    }

    pub fn query(&self) -> &str {
        match self {
            Self::Ids { query, .. } | Self::Requery { query } => query,
        }
    }
}

/// Drops separators and shortens the query on a char boundary
/// until the requery form fits into the payload limit.
fn clean_query(query: &str) -> String {
    let max_bytes =
        CALLBACK_DATA_LIMIT - LIST_CALLBACK_PREFIX.len() - REQUERY_SENTINEL.len() - 2;
    let mut cleaned = String::new();
    for c in query.chars().filter(|c| *c != ':').take(MAX_QUERY_CHARS) {
        if cleaned.len() + c.len_utf8() > max_bytes {
            break;
        }
        cleaned.push(c);
    }
    cleaned
}

impl fmt::Display for ListCallback {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Ids { query, ids } => f.write_str(&Self::encode(query, ids)),
            Self::Requery { query } => write!(
                f,
                "{LIST_CALLBACK_PREFIX}:{}:{REQUERY_SENTINEL}",
                clean_query(query)
            ),
        }
    }
}
