mod address;
mod error;
mod files;
mod indexing;
mod moderation;
mod review;
mod roles;
mod save;
mod search;
mod stars;

#[cfg(test)]
pub mod tests;

pub use self::{
    address::*, error::Error, files::*, indexing::*, moderation::*, review::*, roles::*,
    save::*, search::*, stars::*,
};

mod prelude {
    pub use super::error::Error;
    pub type Result<T> = std::result::Result<T, Error>;
    pub use crate::{db::*, entities::*, repositories::*, RepoError};
}
use self::prelude::*;

pub fn get_poi<R: PoiRepo>(repo: &R, id: PoiId) -> Result<Poi> {
    repo.try_get_poi_by_id(id)?.ok_or(Error::PoiMissing)
}

pub fn get_poi_by_key<R: PoiRepo>(repo: &R, key: &str) -> Result<Option<Poi>> {
    match repo.get_poi_by_key(key) {
        Ok(poi) => Ok(Some(poi)),
        Err(RepoError::NotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Loads the POIs in the given order, silently skipping
/// ids that no longer exist.
pub fn get_pois<R: PoiRepo>(repo: &R, ids: &[PoiId]) -> Result<Vec<Poi>> {
    Ok(repo.get_poi_by_ids(ids)?)
}
