//! Field-level differences between two versions of a POI.
//!
//! Values are compared in their canonical text form (see [`crate::fields`]).
//! Lists are compared exactly as serialized, so a reordered list of links
//! or phones counts as a change even if no single value differs.

use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use crate::{
    entities::*,
    fields::{self, FieldError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: PoiField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Ordered by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff(Vec<FieldChange>);

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn changes(&self) -> &[FieldChange] {
        &self.0
    }

    pub fn into_changes(self) -> Vec<FieldChange> {
        self.0
    }

    pub fn contains(&self, field: PoiField) -> bool {
        self.0.iter().any(|c| c.field == field)
    }

    pub fn new_value(&self, field: PoiField) -> Option<Option<&str>> {
        self.0
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.new_value.as_deref())
    }

    /// The changed fields with their new values.
    pub fn new_values(&self) -> impl Iterator<Item = (PoiField, Option<&str>)> {
        self.0.iter().map(|c| (c.field, c.new_value.as_deref()))
    }

    /// Whether the full-text index needs an update.
    pub fn affects_index(&self) -> bool {
        self.0.iter().any(|c| c.field.is_indexed())
    }

    pub fn apply_to(&self, poi: &Poi) -> Result<Poi, FieldError> {
        let mut poi = poi.clone();
        for (field, value) in self.new_values() {
            fields::set_field(&mut poi, field, value)?;
        }
        Ok(poi)
    }
}

/// Compares `new` against `old`.
///
/// Without `old` every field that carries a value is reported,
/// as needed for the creation of a POI.
pub fn diff(new: &Poi, old: Option<&Poi>) -> Diff {
    Diff(
        PoiField::iter()
            .filter_map(|field| {
                let new_value = fields::field_value(new, field);
                let old_value = old.and_then(|old| fields::field_value(old, field));
                (new_value != old_value).then_some(FieldChange {
                    field,
                    old_value,
                    new_value,
                })
            })
            .collect(),
    )
}

/// Every field of `old` reported as removed.
pub fn diff_removal(old: &Poi) -> Diff {
    Diff(
        PoiField::iter()
            .filter_map(|field| {
                fields::field_value(old, field).map(|old_value| FieldChange {
                    field,
                    old_value: Some(old_value),
                    new_value: None,
                })
            })
            .collect(),
    )
}

/// The whole object as stored in audit rows for creation
/// and permanent deletion.
pub fn snapshot(poi: &Poi) -> Value {
    let mut map = Map::new();
    if let Some(key) = &poi.key {
        map.insert("key".to_string(), Value::String(key.clone()));
    }
    for field in PoiField::iter() {
        let value = fields::field_value(poi, field)
            .map(Value::String)
            .unwrap_or(Value::Null);
        map.insert(field.to_string(), value);
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raydb_entities::builders::*;

    fn cafe() -> Poi {
        Poi::build()
            .id(1)
            .name("A")
            .pos(30.0, 60.0)
            .keywords("cafe coffee")
            .link("Site", "https://a.example")
            .link("Menu", "https://a.example/menu")
            .phones(vec!["1", "2"])
            .finish()
    }

    #[test]
    fn diff_with_itself_is_empty() {
        let poi = cafe();
        assert!(diff(&poi, Some(&poi)).is_empty());
    }

    #[test]
    fn only_changed_fields_are_reported() {
        let old = cafe();
        let mut new = old.clone();
        new.name = "B".into();
        new.comment = Some("x".into());
        let d = diff(&new, Some(&old));
        assert_eq!(
            vec![
                FieldChange {
                    field: PoiField::Name,
                    old_value: Some("A".into()),
                    new_value: Some("B".into()),
                },
                FieldChange {
                    field: PoiField::Comment,
                    old_value: None,
                    new_value: Some("x".into()),
                },
            ],
            d.into_changes()
        );
    }

    #[test]
    fn applying_a_diff_reproduces_it() {
        let orig = cafe();
        let mut edited = orig.clone();
        edited.name = "Cafe B".into();
        edited.has_wifi = TriState::Yes;
        edited.phones.clear();
        edited.location.lat = 60.001;
        let d = diff(&edited, Some(&orig));
        let applied = d.apply_to(&orig).unwrap();
        assert_eq!(d, diff(&applied, Some(&orig)));
        assert!(diff(&applied, Some(&edited)).is_empty());
    }

    #[test]
    fn creation_reports_every_present_field() {
        let poi = cafe();
        let d = diff(&poi, None);
        assert!(d.contains(PoiField::Name));
        assert!(d.contains(PoiField::Links));
        assert!(d.contains(PoiField::NeedsCheck));
        assert!(!d.contains(PoiField::Comment));
        assert!(d.changes().iter().all(|c| c.old_value.is_none()));
    }

    #[test]
    fn removal_reports_every_present_field() {
        let d = diff_removal(&cafe());
        assert!(d.contains(PoiField::Keywords));
        assert!(d.changes().iter().all(|c| c.new_value.is_none()));
    }

    #[test]
    fn reordered_links_count_as_change() {
        let old = cafe();
        let mut new = old.clone();
        new.links.reverse();
        let d = diff(&new, Some(&old));
        assert_eq!(1, d.len());
        assert!(d.contains(PoiField::Links));
    }

    #[test]
    fn reordered_phones_count_as_change() {
        let old = cafe();
        let mut new = old.clone();
        new.phones.reverse();
        assert!(diff(&new, Some(&old)).contains(PoiField::Phones));
    }

    #[test]
    fn index_relevant_changes() {
        let old = cafe();
        let mut new = old.clone();
        new.comment = Some("quiet".into());
        assert!(!diff(&new, Some(&old)).affects_index());
        new.keywords.push_str(" tea");
        assert!(diff(&new, Some(&old)).affects_index());
    }

    #[test]
    fn snapshot_contains_all_fields() {
        let value = snapshot(&cafe());
        assert_eq!(Some("A"), value["name"].as_str());
        assert!(value["comment"].is_null());
        assert_eq!(Some("1; 2"), value["phones"].as_str());
    }
}
