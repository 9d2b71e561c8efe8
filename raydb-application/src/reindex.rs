use super::*;

/// Rebuilds the whole full-text index from the store.
pub fn reindex(
    connections: &sqlite::Connections,
    indexer: &mut dyn PoiIndexer,
    tags: &TagKeywords,
) -> Result<usize> {
    let count = usecases::reindex_all(&connections.shared()?, indexer, tags)?;
    Ok(count)
}

// A stale index entry is tolerated, so failures are only logged.
pub(crate) fn refresh_poi_index(
    connections: &sqlite::Connections,
    indexer: &mut dyn PoiIndexer,
    tags: &TagKeywords,
    id: PoiId,
) {
    if let Err(err) = reindex_stored_poi(connections, indexer, tags, id) {
        error!("Failed to reindex POI {}: {}", id, err);
    }
}

fn reindex_stored_poi(
    connections: &sqlite::Connections,
    indexer: &mut dyn PoiIndexer,
    tags: &TagKeywords,
    id: PoiId,
) -> Result<()> {
    match connections.shared()?.try_get_poi_by_id(id)? {
        Some(poi) => usecases::reindex_poi(&*indexer, tags, &poi)?,
        None => indexer.remove_by_id(id)?,
    }
    indexer.flush_index()?;
    Ok(())
}
