use crate::{entities::*, repositories::*};
use anyhow::Result as Fallible;

pub trait Db: PoiRepo + QueueRepo + AuditRepo + RoleRepo + FileIdRepo + StarRepo {}

impl<T> Db for T where T: PoiRepo + QueueRepo + AuditRepo + RoleRepo + FileIdRepo + StarRepo {}

pub trait Indexer {
    fn flush_index(&mut self) -> Fallible<()>;
}

pub trait IdIndexer: Indexer {
    fn remove_by_id(&self, id: PoiId) -> Fallible<()>;
}

pub trait PoiIndex {
    // Conjunctive full-text query over name, keywords and
    // the keywords of the tag
    fn query_poi_ids(&self, text: &str, limit: usize) -> Fallible<Vec<PoiId>>;
}

pub trait PoiIndexer: IdIndexer + PoiIndex {
    // `tag_keywords` comes from the static tag table
    fn add_or_update_poi(&self, poi: &Poi, tag_keywords: &[String]) -> Fallible<()>;
}
