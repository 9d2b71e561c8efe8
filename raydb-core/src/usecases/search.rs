use super::prelude::*;

pub const MAX_SEARCH_RESULTS: usize = 100;

/// Keyword search over the full-text index.
///
/// Rows that are no longer searchable but have not been
/// removed from the index yet are dropped here.
pub fn find_pois<R, I>(repo: &R, index: &I, tokens: &[String]) -> Result<Vec<Poi>>
where
    R: PoiRepo,
    I: PoiIndex + ?Sized,
{
    if tokens.is_empty() {
        return Ok(vec![]);
    }
    let query = tokens.join(" ");
    let ids = index
        .query_poi_ids(&query, MAX_SEARCH_RESULTS)
        .map_err(Error::Index)?;
    let pois: Vec<_> = repo
        .get_poi_by_ids(&ids)?
        .into_iter()
        .filter(Poi::is_searchable)
        .collect();
    log::info!("Search {:?} {:?}: {} results", query, tokens, pois.len());
    Ok(pois)
}
