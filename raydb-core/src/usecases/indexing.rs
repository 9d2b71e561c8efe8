use super::prelude::*;
use crate::tag::TagKeywords;

/// Brings the index entry of a single POI up to date.
pub fn reindex_poi<I>(index: &I, tags: &TagKeywords, poi: &Poi) -> Result<()>
where
    I: PoiIndexer + ?Sized,
{
    let Some(id) = poi.id else {
        return Err(Error::NotPersisted);
    };
    if poi.is_searchable() {
        index
            .add_or_update_poi(poi, tags.keywords(poi.tag.as_deref()))
            .map_err(Error::Index)?;
    } else {
        index.remove_by_id(id).map_err(Error::Index)?;
    }
    Ok(())
}

/// Rebuilds the index entries of all POIs, returns how many
/// have been indexed.
pub fn reindex_all<R, I>(repo: &R, index: &mut I, tags: &TagKeywords) -> Result<usize>
where
    R: PoiRepo,
    I: PoiIndexer + ?Sized,
{
    let pois = repo.all_pois()?;
    let mut count = 0;
    for poi in &pois {
        reindex_poi(&*index, tags, poi)?;
        if poi.is_searchable() {
            count += 1;
        }
    }
    index.flush_index().map_err(Error::Index)?;
    log::info!("Indexed {} of {} POIs", count, pois.len());
    Ok(count)
}
