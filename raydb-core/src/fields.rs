//! Canonical text form of every persisted POI attribute.
//!
//! Diffs, queue entries and audit rows all compare and store
//! values in this form.

use crate::entities::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("The field {0} is required")]
    Required(PoiField),
    #[error("Invalid value for {field}: {value}")]
    Invalid { field: PoiField, value: String },
}

pub fn field_value(poi: &Poi, field: PoiField) -> Option<String> {
    use PoiField as F;
    match field {
        F::Name => Some(poi.name.clone()),
        F::Lon => Some(poi.location.lon.to_string()),
        F::Lat => Some(poi.location.lat.to_string()),
        F::Description => poi.description.clone(),
        F::Keywords => non_empty(&poi.keywords),
        F::PhotoOut => poi.photo_out.clone(),
        F::PhotoIn => poi.photo_in.clone(),
        F::Tag => poi.tag.clone(),
        F::Hours => poi.hours.as_ref().map(|h| h.as_str().to_string()),
        F::Links => links_to_json(&poi.links),
        F::HasWifi => tri_state_to_text(poi.has_wifi),
        F::AcceptsCards => tri_state_to_text(poi.accepts_cards),
        F::Phones => phones_to_text(&poi.phones),
        F::Comment => poi.comment.clone(),
        F::Address => poi.address_part.clone(),
        F::House => poi.house.clone(),
        F::Floor => poi.floor.clone(),
        F::NeedsCheck => Some(if poi.needs_check { "1" } else { "0" }.to_string()),
    }
}

/// Inverse of [`field_value`].
pub fn set_field(poi: &mut Poi, field: PoiField, value: Option<&str>) -> Result<(), FieldError> {
    use PoiField as F;
    let invalid = |value: &str| FieldError::Invalid {
        field,
        value: value.to_string(),
    };
    let owned = value.map(ToString::to_string);
    match field {
        F::Name => poi.name = value.ok_or(FieldError::Required(field))?.to_string(),
        F::Lon | F::Lat => {
            let value = value.ok_or(FieldError::Required(field))?;
            let deg: f64 = value.parse().map_err(|_| invalid(value))?;
            let (lon, lat) = if field == F::Lon {
                (deg, poi.location.lat)
            } else {
                (poi.location.lon, deg)
            };
            poi.location = Location::try_new(lon, lat).map_err(|_| invalid(value))?;
        }
        F::Description => poi.description = owned,
        F::Keywords => poi.keywords = owned.unwrap_or_default(),
        F::PhotoOut => poi.photo_out = owned,
        F::PhotoIn => poi.photo_in = owned,
        F::Tag => poi.tag = owned,
        F::Hours => poi.hours = owned.map(OpeningHours::parse),
        F::Links => {
            poi.links = match value {
                Some(value) => links_from_json(value).ok_or_else(|| invalid(value))?,
                None => vec![],
            }
        }
        F::HasWifi => {
            poi.has_wifi =
                tri_state_from_text(value).ok_or_else(|| invalid(value.unwrap_or_default()))?
        }
        F::AcceptsCards => {
            poi.accepts_cards =
                tri_state_from_text(value).ok_or_else(|| invalid(value.unwrap_or_default()))?
        }
        F::Phones => poi.phones = value.map(phones_from_text).unwrap_or_default(),
        F::Comment => poi.comment = owned,
        F::Address => poi.address_part = owned,
        F::House => poi.house = owned,
        F::Floor => poi.floor = owned,
        F::NeedsCheck => {
            poi.needs_check = match value {
                Some("1") => true,
                Some("0") | None => false,
                Some(value) => return Err(invalid(value)),
            }
        }
    }
    Ok(())
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn tri_state_to_text(v: TriState) -> Option<String> {
    match v {
        TriState::Unknown => None,
        TriState::Yes => Some("1".to_string()),
        TriState::No => Some("0".to_string()),
    }
}

fn tri_state_from_text(v: Option<&str>) -> Option<TriState> {
    match v {
        None => Some(TriState::Unknown),
        Some("1") => Some(TriState::Yes),
        Some("0") => Some(TriState::No),
        Some(_) => None,
    }
}

pub fn phones_to_text(phones: &[String]) -> Option<String> {
    if phones.is_empty() {
        None
    } else {
        Some(phones.join("; "))
    }
}

pub fn phones_from_text(s: &str) -> Vec<String> {
    s.split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Links are stored as a JSON array of `[title, url]` pairs.
pub fn links_to_json(links: &[Link]) -> Option<String> {
    if links.is_empty() {
        return None;
    }
    let pairs: Vec<[&str; 2]> = links
        .iter()
        .map(|l| [l.title.as_str(), l.url.as_str()])
        .collect();
    serde_json::to_string(&pairs).ok()
}

pub fn links_from_json(s: &str) -> Option<Vec<Link>> {
    let pairs: Vec<(String, String)> = serde_json::from_str(s).ok()?;
    Some(
        pairs
            .into_iter()
            .map(|(title, url)| Link { title, url })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use raydb_entities::builders::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_field_survives_a_round_trip() {
        let orig = Poi::build()
            .name("Shop")
            .pos(30.31, 59.93)
            .keywords("shop food")
            .tag("shop=convenience")
            .hours("Mo-Fr 09:00-18:00")
            .phones(vec!["+7 900", "+7 901"])
            .link("Site", "https://example.com")
            .wifi(Some(false))
            .needs_check(true)
            .floor("2")
            .finish();
        let mut copy = Poi::new("", Location { lon: 0.0, lat: 0.0 });
        for field in PoiField::iter() {
            set_field(&mut copy, field, field_value(&orig, field).as_deref()).unwrap();
        }
        for field in PoiField::iter() {
            assert_eq!(field_value(&orig, field), field_value(&copy, field), "{field}");
        }
        assert_eq!(orig.links, copy.links);
    }

    #[test]
    fn empty_lists_are_absent() {
        let poi = Poi::build().name("x").finish();
        assert_eq!(None, field_value(&poi, PoiField::Links));
        assert_eq!(None, field_value(&poi, PoiField::Phones));
        assert_eq!(None, field_value(&poi, PoiField::HasWifi));
        assert_eq!(Some("0".to_string()), field_value(&poi, PoiField::NeedsCheck));
    }

    #[test]
    fn links_are_json_pairs() {
        let poi = Poi::build().link("Site", "https://a.b").finish();
        assert_eq!(
            Some(r#"[["Site","https://a.b"]]"#.to_string()),
            field_value(&poi, PoiField::Links)
        );
    }

    #[test]
    fn reject_invalid_values() {
        let mut poi = Poi::build().finish();
        assert!(set_field(&mut poi, PoiField::Lat, Some("95.0")).is_err());
        assert!(set_field(&mut poi, PoiField::HasWifi, Some("maybe")).is_err());
        assert!(set_field(&mut poi, PoiField::Name, None).is_err());
        assert!(set_field(&mut poi, PoiField::Links, Some("not json")).is_err());
    }
}
