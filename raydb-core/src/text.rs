use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    static ref TOKEN_SEPARATOR: Regex =
        Regex::new(r#"[\s,.+=!@#$%^&*()'"«»<>/?`~|_-]+"#).expect("Token separator regex");
}

/// Folds letter variants that people use interchangeably.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace('ё', "е")
}

/// Splits free text into normalized search tokens.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    skip: HashSet<String>,
    synonyms: HashMap<String, String>,
}

impl Tokenizer {
    /// `synonyms` maps a canonical token to its alternative spellings.
    pub fn new(
        skip: impl IntoIterator<Item = String>,
        synonyms: impl IntoIterator<Item = (String, Vec<String>)>,
    ) -> Self {
        let skip = skip.into_iter().map(|s| normalize(&s)).collect();
        let synonyms = synonyms
            .into_iter()
            .flat_map(|(canonical, alternatives)| {
                let canonical = normalize(&canonical);
                alternatives
                    .into_iter()
                    .map(move |alt| (normalize(&alt), canonical.clone()))
            })
            .collect();
        Self { skip, synonyms }
    }

    /// Drops skip words and replaces synonyms.
    pub fn split_tokens(&self, text: &str) -> Vec<String> {
        split_raw_tokens(text)
            .into_iter()
            .filter(|t| !self.skip.contains(t))
            .map(|t| self.synonyms.get(&t).cloned().unwrap_or(t))
            .collect()
    }
}

/// Splits without any vocabulary processing.
pub fn split_raw_tokens(text: &str) -> Vec<String> {
    TOKEN_SEPARATOR
        .split(&normalize(text))
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Checks the first token against a list of keywords.
///
/// A keyword ending with `*` matches every token that starts with
/// the rest of it, but only if no `suffix` is requested. With a suffix
/// the token has to equal the keyword immediately followed by the
/// suffix, e.g. `main` + `6` matches `main6`.
pub fn has_keyword<T, K>(tokens: &[T], keywords: &[K], suffix: Option<&str>) -> bool
where
    T: AsRef<str>,
    K: AsRef<str>,
{
    let first: &str = match tokens.first() {
        Some(first) => first.as_ref(),
        None => return false,
    };
    keywords.iter().any(|k| {
        let k: &str = k.as_ref();
        match k.strip_suffix('*') {
            Some(prefix) => suffix.is_none() && first.starts_with(prefix),
            None => match suffix {
                Some(suffix) => {
                    first.len() == k.len() + suffix.len()
                        && first.starts_with(k)
                        && first.ends_with(suffix)
                }
                None => first == k,
            },
        }
    })
}
