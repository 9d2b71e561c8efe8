use super::ImportError;
use crate::{reindex::reindex, *};
use raydb_core::fields::{phones_from_text, phones_to_text};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    io::{Read, Write},
};

#[derive(Debug, Serialize, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: String,
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Serialize, Deserialize)]
struct Geometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: serde_json::Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct Properties {
    #[serde(rename = "$rowid", skip_serializing_if = "Option::is_none")]
    rowid: Option<i64>,
    #[serde(rename = "$created", skip_serializing_if = "Option::is_none")]
    created: Option<i64>,
    #[serde(rename = "$updated", skip_serializing_if = "Option::is_none")]
    updated: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    house: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    floor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phones: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wifi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cards: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_out: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    needs_check: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete_reason: Option<String>,
}

const YES: &str = "yes";
const NO: &str = "no";

fn yes_no(value: TriState) -> Option<String> {
    match value {
        TriState::Unknown => None,
        TriState::Yes => Some(YES.into()),
        TriState::No => Some(NO.into()),
    }
}

fn tri_state(value: Option<&str>) -> TriState {
    match value.map(str::trim) {
        Some(v) if v.starts_with('y') => TriState::Yes,
        Some(v) if v.starts_with('n') => TriState::No,
        _ => TriState::Unknown,
    }
}

/// `title url; title url; ...`
fn links_to_text(links: &[Link]) -> Option<String> {
    if links.is_empty() {
        return None;
    }
    let text = links
        .iter()
        .map(|l| {
            if l.title.is_empty() {
                l.url.clone()
            } else {
                format!("{} {}", l.title, l.url)
            }
        })
        .collect::<Vec<_>>()
        .join("; ");
    Some(text)
}

fn links_from_text(text: &str) -> Vec<Link> {
    text.split(';')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| match l.rsplit_once(char::is_whitespace) {
            Some((title, url)) => Link::new(title.trim(), url),
            None => Link::new(l, l),
        })
        .collect()
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

impl From<&Poi> for Properties {
    fn from(poi: &Poi) -> Self {
        Self {
            rowid: poi.id.map(PoiId::to_inner),
            created: poi.created.map(|t| t.as_secs()),
            updated: poi.updated.map(|t| t.as_secs()),
            name: Some(poi.name.clone()),
            key: poi.key.clone(),
            keywords: non_empty(&poi.keywords),
            tag: poi.tag.clone(),
            description: poi.description.clone(),
            comment: poi.comment.clone(),
            address: poi.address_part.clone(),
            house: poi.house.clone(),
            floor: poi.floor.clone(),
            hours: poi.hours.as_ref().map(|h| h.as_str().to_string()),
            links: links_to_text(&poi.links),
            phones: phones_to_text(&poi.phones),
            wifi: yes_no(poi.has_wifi),
            cards: yes_no(poi.accepts_cards),
            photo_out: poi.photo_out.clone(),
            photo_in: poi.photo_in.clone(),
            needs_check: poi.needs_check.then(|| YES.to_string()),
            index: (!poi.in_index).then(|| NO.to_string()),
            delete_reason: poi.delete_reason.clone(),
        }
    }
}

fn feature_to_poi(index: usize, feature: Feature) -> std::result::Result<Option<Poi>, ImportError> {
    let invalid = |reason: String| ImportError::InvalidFeature { index, reason };
    let Some(geometry) = feature.geometry else {
        return Ok(None);
    };
    if geometry.kind != "Point" {
        return Ok(None);
    }
    let (lon, lat): (f64, f64) = serde_json::from_value(geometry.coordinates)
        .map_err(|err| invalid(format!("coordinates: {err}")))?;
    let location = Location::try_new(lon, lat).map_err(|err| invalid(err.to_string()))?;
    let p = feature.properties;
    let name = p
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| invalid("no name".into()))?;
    let mut poi = Poi::new(name, location);
    poi.id = p.rowid.map(PoiId::new);
    poi.key = p.key;
    poi.keywords = p.keywords.unwrap_or_default();
    poi.tag = p.tag;
    poi.description = p.description;
    poi.comment = p.comment;
    poi.address_part = p.address;
    poi.house = p.house;
    poi.floor = p.floor;
    poi.hours = p.hours.map(OpeningHours::parse);
    poi.links = p.links.as_deref().map(links_from_text).unwrap_or_default();
    poi.phones = p.phones.as_deref().map(phones_from_text).unwrap_or_default();
    poi.has_wifi = tri_state(p.wifi.as_deref());
    poi.accepts_cards = tri_state(p.cards.as_deref());
    poi.photo_out = p.photo_out;
    poi.photo_in = p.photo_in;
    poi.needs_check = p.needs_check.as_deref() == Some(YES);
    poi.in_index = p.index.as_deref() != Some(NO);
    poi.delete_reason = p.delete_reason;
    poi.created = p.created.map(Timestamp::from_secs);
    poi.updated = p.updated.map(Timestamp::from_secs);
    Ok(Some(poi))
}

/// Checks keys and house references before anything is touched.
fn validate(pois: &[Poi]) -> std::result::Result<(), ImportError> {
    let mut keys = HashSet::new();
    for key in pois.iter().filter_map(|p| p.key.as_deref()) {
        if !keys.insert(key) {
            return Err(ImportError::DuplicateKey(key.to_string()));
        }
    }
    for poi in pois {
        if let Some(house) = poi.house.as_deref() {
            if !keys.contains(house) {
                return Err(ImportError::MissingHouse {
                    name: poi.name.clone(),
                    house: house.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Writes every stored POI as a point feature, including
/// deleted ones.
pub fn export_geojson<W: Write>(connections: &sqlite::Connections, writer: W) -> Result<usize> {
    let pois = connections.shared()?.all_pois()?;
    let features: Vec<_> = pois
        .iter()
        .map(|poi| Feature {
            kind: "Feature".into(),
            geometry: Some(Geometry {
                kind: "Point".into(),
                coordinates: serde_json::json!([poi.location.lon, poi.location.lat]),
            }),
            properties: poi.into(),
        })
        .collect();
    let count = features.len();
    let collection = FeatureCollection {
        kind: "FeatureCollection".into(),
        features,
    };
    serde_json::to_writer_pretty(writer, &collection)?;
    info!("Exported {} POIs", count);
    Ok(count)
}

/// Replaces all stored POIs with the point features of a
/// collection and rebuilds the index.
pub fn import_geojson<R: Read>(
    connections: &sqlite::Connections,
    indexer: &mut dyn PoiIndexer,
    tags: &TagKeywords,
    reader: R,
) -> Result<usize> {
    let collection: FeatureCollection = serde_json::from_reader(reader)?;
    let mut pois = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        if let Some(poi) = feature_to_poi(index, feature)? {
            pois.push(poi);
        }
    }
    validate(&pois)?;

    let replaced = connections.exclusive()?.transaction(|conn| {
        let replaced: Vec<_> = conn.all_pois()?.into_iter().filter_map(|p| p.id).collect();
        let purged = conn.purge_all_pois()?;
        debug!("Purged {} POIs before import", purged);
        for poi in &pois {
            conn.insert_poi(poi)?;
        }
        Ok::<_, RepoError>(replaced)
    })?;
    let count = pois.len();
    info!("Imported {} POIs", count);
    for id in replaced {
        indexer.remove_by_id(id)?;
    }
    reindex(connections, indexer, tags)?;
    Ok(count)
}
