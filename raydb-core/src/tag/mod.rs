//! The static table that maps OSM-style tags to search keywords.

use std::collections::HashMap;

use crate::text::normalize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagKeywords(HashMap<String, Vec<String>>);

impl TagKeywords {
    pub fn new(table: HashMap<String, Vec<String>>) -> Self {
        Self(
            table
                .into_iter()
                .map(|(tag, keywords)| {
                    let keywords = keywords.iter().map(|k| normalize(k)).collect();
                    (tag.trim().to_string(), keywords)
                })
                .collect(),
        )
    }

    /// Empty for unknown tags.
    pub fn keywords(&self, tag: Option<&str>) -> &[String] {
        tag.and_then(|tag| self.0.get(tag))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Checks the `key=value` form with lowercase latin parts.
pub fn is_valid_tag(tag: &str) -> bool {
    let mut parts = tag.split('=');
    let valid_part = |p: Option<&str>| {
        p.is_some_and(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_lowercase()))
    };
    valid_part(parts.next()) && valid_part(parts.next()) && parts.next().is_none()
}
