// Low-level database access traits.
// Each repository is responsible for a single entity and
// its relationships. Related entities are only referenced
// by their id and never modified or loaded by another
// repository.

use std::collections::HashMap;

use crate::{entities::*, review::FloorFilter};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The requested object could not be found")]
    NotFound,
    #[error("The object already exists")]
    AlreadyExists,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoiStats {
    pub buildings: usize,
    pub entrances: usize,
    /// Active POIs that are not part of the address infrastructure.
    pub pois: usize,
}

pub trait PoiRepo {
    fn get_poi_by_id(&self, id: PoiId) -> Result<Poi>;
    fn try_get_poi_by_id(&self, id: PoiId) -> Result<Option<Poi>> {
        match self.get_poi_by_id(id) {
            Ok(poi) => Ok(Some(poi)),
            Err(Error::NotFound) => Ok(None),
            Err(err) => Err(err),
        }
    }
    fn get_poi_by_key(&self, key: &str) -> Result<Poi>;
    // In the order of the given ids, unknown ids are skipped
    fn get_poi_by_ids(&self, ids: &[PoiId]) -> Result<Vec<Poi>>;

    // Only active and indexed POIs that are not buildings or entrances
    fn get_poi_by_house(&self, house: &str, floor: Option<&FloorFilter>) -> Result<Vec<Poi>>;
    fn get_poi_by_tag(&self, tag: &str) -> Result<Vec<Poi>>;
    // Keys of the active entrances of a building
    fn get_entrances(&self, house: &str) -> Result<Vec<String>>;
    // Active buildings that have a key
    fn get_houses(&self) -> Result<Vec<Poi>>;
    // Active POIs ordered by distance, nearest first
    fn get_poi_around(
        &self,
        location: Location,
        count: usize,
        floor: Option<&FloorFilter>,
    ) -> Result<Vec<Poi>>;

    // Including soft-deleted ones
    fn all_pois(&self) -> Result<Vec<Poi>>;
    fn all_indexable_pois(&self) -> Result<Vec<Poi>>;
    fn count_pois(&self) -> Result<PoiStats>;

    // Assigns a new id unless the POI already has one.
    // Keeps given timestamps, otherwise sets `created` and `updated`.
    fn insert_poi(&self, poi: &Poi) -> Result<PoiId>;
    // Overwrites every field and sets `updated`
    fn update_poi(&self, poi: &Poi) -> Result<()>;
    // Returns the previous value
    fn set_poi_updated(&self, id: PoiId, updated: Option<Timestamp>) -> Result<Option<Timestamp>>;
    fn set_needs_check(&self, id: PoiId, needs_check: bool) -> Result<()>;
    fn delete_poi(&self, id: PoiId, reason: &str) -> Result<()>;
    fn restore_poi(&self, id: PoiId) -> Result<()>;
    /// Removes the row with its pending queue entries and stars.
    /// Ids of new POIs never repeat a purged one.
    fn purge_poi(&self, id: PoiId) -> Result<()>;
    fn purge_all_pois(&self) -> Result<usize>;

    // Active, oldest `created` first
    fn get_next_unchecked(&self) -> Result<Option<Poi>>;
    // Active, newest `created` first
    fn get_last_pois(&self, count: usize) -> Result<Vec<Poi>>;
    // Soft-deleted, newest `updated` first
    fn get_last_deleted(&self, count: usize) -> Result<Vec<Poi>>;
    // Active and not part of the address infrastructure
    fn get_random_pois(&self, count: usize) -> Result<Vec<Poi>>;

    fn get_poi_ages(&self, ids: &[PoiId], now: Timestamp) -> Result<HashMap<PoiId, i64>> {
        Ok(self
            .get_poi_by_ids(ids)?
            .into_iter()
            .filter_map(|p| {
                let id = p.id?;
                let age = p.updated.map(|u| u.hours_until(now)).unwrap_or(i64::MAX);
                Some((id, age))
            })
            .collect())
    }
}

pub trait QueueRepo {
    fn add_queue_entries(&self, entries: &[NewQueueEntry]) -> Result<usize>;
    // Newest first
    fn get_queue(&self, count: usize) -> Result<Vec<QueueEntry>>;
    fn get_queue_msg(&self, id: QueueId) -> Result<QueueEntry>;
    fn delete_queue(&self, id: QueueId) -> Result<()>;
    fn count_queue(&self) -> Result<usize>;
}

pub trait AuditRepo {
    fn add_audit_entries(&self, entries: &[AuditEntry]) -> Result<()>;
    // Newest first
    fn get_last_audit(&self, count: usize) -> Result<Vec<AuditEntry>>;
    // Oldest first
    fn get_audit_of_poi(&self, id: PoiId) -> Result<Vec<AuditEntry>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMember {
    pub user_id: UserId,
    pub name: Option<String>,
}

pub trait RoleRepo {
    fn get_roles(&self, user: UserId) -> Result<Vec<Role>>;
    fn add_user_to_role(&self, user: &RoleMember, role: Role, added_by: UserId) -> Result<()>;
    fn remove_user_from_role(&self, user: UserId, role: Role) -> Result<()>;
    fn get_role_users(&self, role: Role) -> Result<Vec<RoleMember>>;
}

pub trait FileIdRepo {
    // Keeps an existing token for the same path
    fn store_file_id(&self, path: &str, size: u64, file_id: &str) -> Result<()>;
    // Only returns tokens whose stored size equals the given size
    fn find_file_ids(&self, paths: &HashMap<String, u64>) -> Result<HashMap<String, String>>;
    fn find_path_for_file_id(&self, file_id: &str) -> Result<Option<String>>;
}

pub trait StarRepo {
    fn star_poi(&self, user: UserId, poi: PoiId) -> Result<()>;
    fn unstar_poi(&self, user: UserId, poi: PoiId) -> Result<()>;
    fn count_stars(&self, pois: &[PoiId]) -> Result<HashMap<PoiId, usize>>;
    fn starred_by(&self, user: UserId, pois: &[PoiId]) -> Result<Vec<PoiId>>;
}
