#![allow(clippy::extra_unused_lifetimes)]

// NOTE:
// All timestamps are stored as unix timestamps in seconds.

use super::schema::*;

#[derive(Insertable, AsChangeset)]
#[diesel(table_name = poi, treat_none_as_null = true)]
pub struct NewPoi<'a> {
    /// Assigned by the database if missing.
    pub id: Option<i64>,
    pub str_id: Option<&'a str>,
    pub name: &'a str,
    pub lon: f64,
    pub lat: f64,
    pub keywords: &'a str,
    pub tag: Option<&'a str>,
    pub description: Option<&'a str>,
    pub comment: Option<&'a str>,
    pub address: Option<&'a str>,
    pub house: Option<&'a str>,
    pub floor: Option<&'a str>,
    pub phones: Option<String>,
    pub links: Option<String>,
    pub has_wifi: Option<i16>,
    pub accepts_cards: Option<i16>,
    pub hours: Option<&'a str>,
    pub needs_check: bool,
    pub in_index: bool,
    pub delete_reason: Option<&'a str>,
    pub photo_out: Option<&'a str>,
    pub photo_in: Option<&'a str>,
    pub created: i64,
    pub updated: Option<i64>,
}

#[derive(Queryable, Selectable)]
#[diesel(table_name = poi)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Poi {
    pub id: i64,
    pub str_id: Option<String>,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
    pub keywords: String,
    pub tag: Option<String>,
    pub description: Option<String>,
    pub comment: Option<String>,
    pub address: Option<String>,
    pub house: Option<String>,
    pub floor: Option<String>,
    pub phones: Option<String>,
    pub links: Option<String>,
    pub has_wifi: Option<i16>,
    pub accepts_cards: Option<i16>,
    pub hours: Option<String>,
    pub needs_check: bool,
    pub in_index: bool,
    pub delete_reason: Option<String>,
    pub photo_out: Option<String>,
    pub photo_in: Option<String>,
    pub created: i64,
    pub updated: Option<i64>,
}

#[derive(Insertable)]
#[diesel(table_name = poi_audit)]
pub struct NewAuditEntry<'a> {
    pub user_id: i64,
    pub approved_by: Option<i64>,
    pub poi_id: i64,
    pub field: &'a str,
    pub old_value: Option<&'a str>,
    pub new_value: Option<&'a str>,
    pub ts: i64,
}

#[derive(Queryable)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: i64,
    pub approved_by: Option<i64>,
    pub poi_id: i64,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub ts: i64,
}

#[derive(Insertable)]
#[diesel(table_name = poi_queue)]
pub struct NewQueueEntry<'a> {
    pub user_id: i64,
    pub user_name: Option<&'a str>,
    pub poi_id: i64,
    pub field: &'a str,
    pub old_value: Option<&'a str>,
    pub new_value: Option<&'a str>,
    pub ts: i64,
}

#[derive(Queryable)]
pub struct QueueEntry {
    pub id: i64,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub poi_id: i64,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub ts: i64,
}

#[derive(Insertable, Queryable)]
#[diesel(table_name = roles)]
pub struct RoleMember {
    pub user_id: i64,
    pub name: Option<String>,
    pub role: String,
    pub added_by: i64,
}

#[derive(Insertable, Queryable)]
#[diesel(table_name = file_ids)]
pub struct FileId {
    pub path: String,
    pub size: i64,
    pub file_id: String,
}

#[derive(Insertable)]
#[diesel(table_name = stars)]
pub struct Star {
    pub user_id: i64,
    pub poi_id: i64,
}
