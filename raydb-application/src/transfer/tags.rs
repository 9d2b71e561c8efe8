use crate::{reindex::refresh_poi_index, *};
use raydb_core::tag::is_valid_tag;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    io::{Read, Write},
};

/// One line of the tab-delimited tag sheet.
#[derive(Debug, Serialize, Deserialize)]
struct TagRow {
    id: String,
    name: String,
    tag: Option<String>,
    /// The first keyword of the tag, a hint for editors.
    #[serde(rename = "type")]
    kind: Option<String>,
    description: Option<String>,
    comment: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TagImport {
    pub updated: Vec<PoiId>,
    /// Tags missing from the keyword table, mapped to the
    /// type given in the sheet.
    pub unknown: BTreeMap<String, String>,
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().delimiter(b'\t').from_writer(writer)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader)
}

/// Lists all POIs except buildings and entrances.
pub fn export_tags<W: Write>(
    connections: &sqlite::Connections,
    tags: &TagKeywords,
    writer: W,
) -> Result<usize> {
    let pois = connections.shared()?.all_pois()?;
    let mut wtr = csv_writer(writer);
    let mut count = 0;
    for poi in pois.iter().filter(|p| !p.is_address_infrastructure()) {
        let Some(id) = poi.id else {
            continue;
        };
        wtr.serialize(TagRow {
            id: id.to_string(),
            name: poi.name.clone(),
            tag: poi.tag.clone(),
            kind: tags.keywords(poi.tag.as_deref()).first().cloned(),
            description: poi.description.clone(),
            comment: poi.comment.clone(),
            address: poi.address_part.clone(),
        })?;
        count += 1;
    }
    wtr.flush()?;
    Ok(count)
}

/// Applies the tags of an edited sheet.
///
/// Rows without a numeric id or without a tag are skipped,
/// as are POIs that no longer exist.
pub fn import_tags<R: Read>(
    connections: &sqlite::Connections,
    indexer: &mut dyn PoiIndexer,
    tags: &TagKeywords,
    reader: R,
) -> Result<TagImport> {
    let mut rows = vec![];
    for row in csv_reader(reader).deserialize() {
        let row: TagRow = row?;
        let Ok(id) = row.id.trim().parse::<i64>() else {
            continue;
        };
        let Some(tag) = row.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        if !is_valid_tag(tag) {
            warn!("Skipping invalid tag {:?} of POI {}", tag, id);
            continue;
        }
        let kind = row.kind.as_deref().map(str::trim).unwrap_or_default();
        rows.push((PoiId::new(id), tag.to_string(), kind.to_string()));
    }

    let result = connections.exclusive()?.transaction(|conn| {
        let mut result = TagImport::default();
        for (id, tag, kind) in rows {
            let Some(mut poi) = conn.try_get_poi_by_id(id)? else {
                debug!("Skipping tag of missing POI {}", id);
                continue;
            };
            if poi.tag.as_deref() != Some(tag.as_str()) {
                poi.tag = Some(tag.clone());
                conn.update_poi(&poi)?;
                result.updated.push(id);
            }
            if !tags.contains(&tag) {
                let entry = result.unknown.entry(tag).or_default();
                if entry.is_empty() {
                    *entry = kind;
                }
            }
        }
        Ok::<_, RepoError>(result)
    })?;

    for id in &result.updated {
        refresh_poi_index(connections, indexer, tags, *id);
    }
    info!(
        "Updated tags of {} POIs, {} unknown tags",
        result.updated.len(),
        result.unknown.len()
    );
    Ok(result)
}
