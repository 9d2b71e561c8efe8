use super::prelude::*;
use crate::review::FloorFilter;
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
};

type RepoResult<T> = std::result::Result<T, RepoError>;

pub fn now() -> Timestamp {
    Timestamp::from_secs(1_700_000_000)
}

pub fn moderator(id: i64) -> UserInfo {
    let mut user = UserInfo::new(UserId::new(id), Some(format!("mod{id}")), now());
    user.roles.push(Role::Moderator);
    user
}

pub fn admin(id: i64) -> UserInfo {
    let mut user = UserInfo::new(UserId::new(id), Some(format!("admin{id}")), now());
    user.roles.push(Role::Admin);
    user
}

pub fn visitor(id: i64) -> UserInfo {
    UserInfo::new(UserId::new(id), Some(format!("user{id}")), now())
}

#[derive(Default)]
pub struct MockDb {
    pub pois: RefCell<Vec<Poi>>,
    pub queue: RefCell<Vec<QueueEntry>>,
    pub audit: RefCell<Vec<AuditEntry>>,
    pub roles: RefCell<Vec<(RoleMember, Role)>>,
    pub file_ids: RefCell<Vec<(String, u64, String)>>,
    pub stars: RefCell<Vec<(UserId, PoiId)>>,
    pub clock: Cell<i64>,
    next_id: Cell<i64>,
}

impl MockDb {
    // Every write advances the clock by a second
    fn tick(&self) -> Timestamp {
        self.clock.set(self.clock.get() + 1);
        now() + time::Duration::seconds(self.clock.get())
    }

    fn with_poi<T>(&self, id: PoiId, f: impl FnOnce(&mut Poi) -> T) -> RepoResult<T> {
        let mut pois = self.pois.borrow_mut();
        let poi = pois
            .iter_mut()
            .find(|p| p.id == Some(id))
            .ok_or(RepoError::NotFound)?;
        Ok(f(poi))
    }

    pub fn poi(&self, id: PoiId) -> Poi {
        self.get_poi_by_id(id).unwrap()
    }
}

fn is_active(p: &Poi) -> bool {
    !p.is_deleted()
}

impl PoiRepo for MockDb {
    fn get_poi_by_id(&self, id: PoiId) -> RepoResult<Poi> {
        self.pois
            .borrow()
            .iter()
            .find(|p| p.id == Some(id))
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    fn get_poi_by_key(&self, key: &str) -> RepoResult<Poi> {
        self.pois
            .borrow()
            .iter()
            .find(|p| p.key.as_deref() == Some(key))
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    fn get_poi_by_ids(&self, ids: &[PoiId]) -> RepoResult<Vec<Poi>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.get_poi_by_id(*id).ok())
            .collect())
    }

    fn get_poi_by_house(&self, house: &str, floor: Option<&FloorFilter>) -> RepoResult<Vec<Poi>> {
        Ok(self
            .pois
            .borrow()
            .iter()
            .filter(|p| p.house.as_deref() == Some(house) && p.is_searchable())
            .filter(|p| floor.map_or(true, |f| f.matches(p.floor.as_deref())))
            .cloned()
            .collect())
    }

    fn get_poi_by_tag(&self, tag: &str) -> RepoResult<Vec<Poi>> {
        Ok(self
            .pois
            .borrow()
            .iter()
            .filter(|p| p.tag.as_deref() == Some(tag) && is_active(p))
            .cloned()
            .collect())
    }

    fn get_entrances(&self, house: &str) -> RepoResult<Vec<String>> {
        Ok(self
            .pois
            .borrow()
            .iter()
            .filter(|p| p.is_entrance() && is_active(p) && p.house.as_deref() == Some(house))
            .filter_map(|p| p.key.clone())
            .collect())
    }

    fn get_houses(&self) -> RepoResult<Vec<Poi>> {
        Ok(self
            .pois
            .borrow()
            .iter()
            .filter(|p| p.is_building() && is_active(p) && p.key.is_some())
            .cloned()
            .collect())
    }

    fn get_poi_around(
        &self,
        location: Location,
        count: usize,
        floor: Option<&FloorFilter>,
    ) -> RepoResult<Vec<Poi>> {
        let mut pois: Vec<_> = self
            .pois
            .borrow()
            .iter()
            .filter(|p| p.is_searchable())
            .filter(|p| floor.map_or(true, |f| f.matches(p.floor.as_deref())))
            .cloned()
            .collect();
        pois.sort_by(|a, b| {
            location
                .distance(&a.location)
                .to_meters()
                .total_cmp(&location.distance(&b.location).to_meters())
        });
        pois.truncate(count);
        Ok(pois)
    }

    fn all_pois(&self) -> RepoResult<Vec<Poi>> {
        Ok(self.pois.borrow().clone())
    }

    fn all_indexable_pois(&self) -> RepoResult<Vec<Poi>> {
        Ok(self
            .pois
            .borrow()
            .iter()
            .filter(|p| p.is_searchable())
            .cloned()
            .collect())
    }

    fn count_pois(&self) -> RepoResult<PoiStats> {
        let pois = self.pois.borrow();
        Ok(PoiStats {
            buildings: pois.iter().filter(|p| p.is_building() && is_active(p)).count(),
            entrances: pois.iter().filter(|p| p.is_entrance() && is_active(p)).count(),
            pois: pois
                .iter()
                .filter(|p| is_active(p) && !p.is_address_infrastructure())
                .count(),
        })
    }

    fn insert_poi(&self, poi: &Poi) -> RepoResult<PoiId> {
        let id = match poi.id {
            Some(id) => {
                if self.get_poi_by_id(id).is_ok() {
                    return Err(RepoError::AlreadyExists);
                }
                self.next_id.set(self.next_id.get().max(i64::from(id)));
                id
            }
            None => {
                self.next_id.set(self.next_id.get() + 1);
                PoiId::new(self.next_id.get())
            }
        };
        let ts = self.tick();
        let mut poi = poi.clone();
        poi.id = Some(id);
        poi.created = poi.created.or(Some(ts));
        poi.updated = poi.updated.or(poi.created);
        self.pois.borrow_mut().push(poi);
        Ok(id)
    }

    fn update_poi(&self, poi: &Poi) -> RepoResult<()> {
        let id = poi.id.ok_or(RepoError::NotFound)?;
        let ts = self.tick();
        self.with_poi(id, |p| {
            let created = p.created;
            *p = poi.clone();
            p.created = created;
            p.updated = Some(ts);
        })
    }

    fn set_poi_updated(
        &self,
        id: PoiId,
        updated: Option<Timestamp>,
    ) -> RepoResult<Option<Timestamp>> {
        self.with_poi(id, |p| std::mem::replace(&mut p.updated, updated))
    }

    fn set_needs_check(&self, id: PoiId, needs_check: bool) -> RepoResult<()> {
        self.with_poi(id, |p| p.needs_check = needs_check)
    }

    fn delete_poi(&self, id: PoiId, reason: &str) -> RepoResult<()> {
        let ts = self.tick();
        self.with_poi(id, |p| {
            p.delete_reason = Some(reason.to_string());
            p.updated = Some(ts);
        })
    }

    fn restore_poi(&self, id: PoiId) -> RepoResult<()> {
        let ts = self.tick();
        self.with_poi(id, |p| {
            p.delete_reason = None;
            p.updated = Some(ts);
        })
    }

    fn purge_poi(&self, id: PoiId) -> RepoResult<()> {
        let mut pois = self.pois.borrow_mut();
        let len = pois.len();
        pois.retain(|p| p.id != Some(id));
        if pois.len() == len {
            return Err(RepoError::NotFound);
        }
        self.queue.borrow_mut().retain(|e| e.poi_id != id);
        self.stars.borrow_mut().retain(|(_, poi)| *poi != id);
        Ok(())
    }

    fn purge_all_pois(&self) -> RepoResult<usize> {
        self.queue.borrow_mut().clear();
        self.stars.borrow_mut().clear();
        Ok(self.pois.borrow_mut().drain(..).count())
    }

    fn get_next_unchecked(&self) -> RepoResult<Option<Poi>> {
        Ok(self
            .pois
            .borrow()
            .iter()
            .filter(|p| p.needs_check && is_active(p))
            .min_by_key(|p| p.created)
            .cloned())
    }

    fn get_last_pois(&self, count: usize) -> RepoResult<Vec<Poi>> {
        let mut pois: Vec<_> = self
            .pois
            .borrow()
            .iter()
            .filter(|p| is_active(p))
            .cloned()
            .collect();
        pois.sort_by_key(|p| std::cmp::Reverse(p.created));
        pois.truncate(count);
        Ok(pois)
    }

    fn get_last_deleted(&self, count: usize) -> RepoResult<Vec<Poi>> {
        let mut pois: Vec<_> = self
            .pois
            .borrow()
            .iter()
            .filter(|p| p.is_deleted())
            .cloned()
            .collect();
        pois.sort_by_key(|p| std::cmp::Reverse(p.updated));
        pois.truncate(count);
        Ok(pois)
    }

    fn get_random_pois(&self, count: usize) -> RepoResult<Vec<Poi>> {
        Ok(self
            .pois
            .borrow()
            .iter()
            .filter(|p| is_active(p) && !p.is_address_infrastructure())
            .take(count)
            .cloned()
            .collect())
    }
}

impl QueueRepo for MockDb {
    fn add_queue_entries(&self, entries: &[NewQueueEntry]) -> RepoResult<usize> {
        for entry in entries {
            let ts = self.tick();
            let mut queue = self.queue.borrow_mut();
            let id = QueueId::new(queue.len() as i64 + 1);
            queue.push(QueueEntry {
                id,
                submitter: entry.submitter.clone(),
                created_at: ts,
                poi_id: entry.poi_id,
                change: entry.change.clone(),
            });
        }
        Ok(entries.len())
    }

    fn get_queue(&self, count: usize) -> RepoResult<Vec<QueueEntry>> {
        let mut queue = self.queue.borrow().clone();
        queue.sort_by_key(|e| std::cmp::Reverse(e.created_at));
        queue.truncate(count);
        Ok(queue)
    }

    fn get_queue_msg(&self, id: QueueId) -> RepoResult<QueueEntry> {
        self.queue
            .borrow()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    fn delete_queue(&self, id: QueueId) -> RepoResult<()> {
        self.queue.borrow_mut().retain(|e| e.id != id);
        Ok(())
    }

    fn count_queue(&self) -> RepoResult<usize> {
        Ok(self.queue.borrow().len())
    }
}

impl AuditRepo for MockDb {
    fn add_audit_entries(&self, entries: &[AuditEntry]) -> RepoResult<()> {
        for entry in entries {
            let ts = self.tick();
            let mut entry = entry.clone();
            entry.created_at.get_or_insert(ts);
            self.audit.borrow_mut().push(entry);
        }
        Ok(())
    }

    fn get_last_audit(&self, count: usize) -> RepoResult<Vec<AuditEntry>> {
        Ok(self
            .audit
            .borrow()
            .iter()
            .rev()
            .take(count)
            .cloned()
            .collect())
    }

    fn get_audit_of_poi(&self, id: PoiId) -> RepoResult<Vec<AuditEntry>> {
        Ok(self
            .audit
            .borrow()
            .iter()
            .filter(|e| e.poi_id == id)
            .cloned()
            .collect())
    }
}

impl RoleRepo for MockDb {
    fn get_roles(&self, user: UserId) -> RepoResult<Vec<Role>> {
        Ok(self
            .roles
            .borrow()
            .iter()
            .filter(|(m, _)| m.user_id == user)
            .map(|(_, r)| *r)
            .collect())
    }

    fn add_user_to_role(&self, user: &RoleMember, role: Role, _: UserId) -> RepoResult<()> {
        let mut roles = self.roles.borrow_mut();
        if roles.iter().any(|(m, r)| m.user_id == user.user_id && *r == role) {
            return Err(RepoError::AlreadyExists);
        }
        roles.push((user.clone(), role));
        Ok(())
    }

    fn remove_user_from_role(&self, user: UserId, role: Role) -> RepoResult<()> {
        self.roles
            .borrow_mut()
            .retain(|(m, r)| !(m.user_id == user && *r == role));
        Ok(())
    }

    fn get_role_users(&self, role: Role) -> RepoResult<Vec<RoleMember>> {
        Ok(self
            .roles
            .borrow()
            .iter()
            .filter(|(_, r)| *r == role)
            .map(|(m, _)| m.clone())
            .collect())
    }
}

impl FileIdRepo for MockDb {
    fn store_file_id(&self, path: &str, size: u64, file_id: &str) -> RepoResult<()> {
        let mut file_ids = self.file_ids.borrow_mut();
        if !file_ids.iter().any(|(p, _, _)| p == path) {
            file_ids.push((path.to_string(), size, file_id.to_string()));
        }
        Ok(())
    }

    fn find_file_ids(&self, paths: &HashMap<String, u64>) -> RepoResult<HashMap<String, String>> {
        Ok(self
            .file_ids
            .borrow()
            .iter()
            .filter(|(path, size, _)| paths.get(path) == Some(size))
            .map(|(path, _, id)| (path.clone(), id.clone()))
            .collect())
    }

    fn find_path_for_file_id(&self, file_id: &str) -> RepoResult<Option<String>> {
        Ok(self
            .file_ids
            .borrow()
            .iter()
            .find(|(_, _, id)| id == file_id)
            .map(|(path, _, _)| path.clone()))
    }
}

impl StarRepo for MockDb {
    fn star_poi(&self, user: UserId, poi: PoiId) -> RepoResult<()> {
        let mut stars = self.stars.borrow_mut();
        if !stars.contains(&(user, poi)) {
            stars.push((user, poi));
        }
        Ok(())
    }

    fn unstar_poi(&self, user: UserId, poi: PoiId) -> RepoResult<()> {
        self.stars.borrow_mut().retain(|s| *s != (user, poi));
        Ok(())
    }

    fn count_stars(&self, pois: &[PoiId]) -> RepoResult<HashMap<PoiId, usize>> {
        let mut counts = HashMap::new();
        for (_, poi) in self.stars.borrow().iter().filter(|(_, p)| pois.contains(p)) {
            *counts.entry(*poi).or_default() += 1;
        }
        Ok(counts)
    }

    fn starred_by(&self, user: UserId, pois: &[PoiId]) -> RepoResult<Vec<PoiId>> {
        Ok(self
            .stars
            .borrow()
            .iter()
            .filter(|(u, p)| *u == user && pois.contains(p))
            .map(|(_, p)| *p)
            .collect())
    }
}

/// An index that matches every token against name and keywords.
#[derive(Default)]
pub struct MockIndex {
    pub docs: RefCell<Vec<(PoiId, String)>>,
}

impl Indexer for MockIndex {
    fn flush_index(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl IdIndexer for MockIndex {
    fn remove_by_id(&self, id: PoiId) -> anyhow::Result<()> {
        self.docs.borrow_mut().retain(|(doc, _)| *doc != id);
        Ok(())
    }
}

impl PoiIndex for MockIndex {
    fn query_poi_ids(&self, text: &str, limit: usize) -> anyhow::Result<Vec<PoiId>> {
        let tokens: Vec<_> = text.split_whitespace().collect();
        Ok(self
            .docs
            .borrow()
            .iter()
            .filter(|(_, doc)| tokens.iter().all(|t| doc.split(' ').any(|w| w == *t)))
            .map(|(id, _)| *id)
            .take(limit)
            .collect())
    }
}

impl PoiIndexer for MockIndex {
    fn add_or_update_poi(&self, poi: &Poi, tag_keywords: &[String]) -> anyhow::Result<()> {
        let Some(id) = poi.id else {
            return Ok(());
        };
        self.remove_by_id(id)?;
        let doc = format!("{} {} {}", poi.name, poi.keywords, tag_keywords.join(" "))
            .to_lowercase();
        self.docs.borrow_mut().push((id, doc));
        Ok(())
    }
}
