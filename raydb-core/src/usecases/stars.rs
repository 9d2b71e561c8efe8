use super::prelude::*;
use crate::ranking::StarInfo;

pub fn get_stars<R: StarRepo>(repo: &R, user: Option<UserId>, ids: &[PoiId]) -> Result<StarInfo> {
    let counts = repo.count_stars(ids)?;
    let starred_by_user = match user {
        Some(user) => repo.starred_by(user, ids)?.into_iter().collect(),
        None => Default::default(),
    };
    Ok(StarInfo {
        counts,
        starred_by_user,
    })
}

/// Returns whether the POI is starred afterwards.
pub fn toggle_star<R: PoiRepo + StarRepo>(repo: &R, user: UserId, id: PoiId) -> Result<bool> {
    let poi = repo.try_get_poi_by_id(id)?.ok_or(Error::PoiMissing)?;
    if poi.is_deleted() {
        return Err(Error::Deleted);
    }
    if repo.starred_by(user, &[id])?.is_empty() {
        repo.star_poi(user, id)?;
        Ok(true)
    } else {
        repo.unstar_poi(user, id)?;
        Ok(false)
    }
}
