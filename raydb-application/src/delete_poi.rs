use super::*;
use crate::reindex::refresh_poi_index;

/// Soft deletion, the POI leaves the index.
pub fn delete_poi(
    connections: &sqlite::Connections,
    indexer: &mut dyn PoiIndexer,
    tags: &TagKeywords,
    user: &UserInfo,
    id: PoiId,
    reason: &str,
) -> Result<Poi> {
    let poi = connections
        .exclusive()?
        .transaction(|conn| usecases::delete_poi(conn, user, id, reason))?;
    refresh_poi_index(connections, indexer, tags, id);
    Ok(poi)
}

pub fn restore_poi(
    connections: &sqlite::Connections,
    indexer: &mut dyn PoiIndexer,
    tags: &TagKeywords,
    user: &UserInfo,
    id: PoiId,
) -> Result<Poi> {
    let poi = connections
        .exclusive()?
        .transaction(|conn| usecases::restore_poi(conn, user, id))?;
    refresh_poi_index(connections, indexer, tags, id);
    Ok(poi)
}

pub fn purge_poi(
    connections: &sqlite::Connections,
    indexer: &mut dyn PoiIndexer,
    user: &UserInfo,
    id: PoiId,
) -> Result<()> {
    connections
        .exclusive()?
        .transaction(|conn| usecases::purge_poi(conn, user, id))?;
    if let Err(err) = indexer
        .remove_by_id(id)
        .and_then(|_| indexer.flush_index())
    {
        error!("Failed to remove purged POI {} from index: {}", id, err);
    }
    Ok(())
}
