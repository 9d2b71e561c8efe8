use super::prelude::*;
use crate::{authorization::authorize_moderator, fields};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueOutcome {
    Applied { poi_id: PoiId, reindex: bool },
    /// The POI vanished in the meantime, the entry has been dropped.
    PoiMissing(QueueEntry),
}

/// Pending changes, newest first.
pub fn get_queue<R: QueueRepo>(repo: &R, user: &UserInfo, count: usize) -> Result<Vec<QueueEntry>> {
    authorize_moderator(user)?;
    Ok(repo.get_queue(count)?)
}

pub fn get_queue_entry<R: QueueRepo>(repo: &R, user: &UserInfo, id: QueueId) -> Result<QueueEntry> {
    authorize_moderator(user)?;
    Ok(repo.get_queue_msg(id)?)
}

pub fn apply_queue<R>(repo: &R, approver: &UserInfo, id: QueueId) -> Result<QueueOutcome>
where
    R: PoiRepo + QueueRepo + AuditRepo,
{
    authorize_moderator(approver)?;
    let entry = repo.get_queue_msg(id)?;
    let (field, new_value) = match &entry.change {
        QueueChange::Field {
            field, new_value, ..
        } => (*field, new_value.clone()),
        QueueChange::Message(_) => return Err(Error::MessageNotApplicable),
    };
    let Some(mut poi) = repo.try_get_poi_by_id(entry.poi_id)? else {
        log::warn!("Dropping queue entry {} of missing POI {}", id, entry.poi_id);
        repo.delete_queue(id)?;
        return Ok(QueueOutcome::PoiMissing(entry));
    };
    let old_value = fields::field_value(&poi, field);
    fields::set_field(&mut poi, field, new_value.as_deref())?;
    repo.update_poi(&poi)?;
    repo.add_audit_entries(&[AuditEntry {
        submitter: entry.submitter.user_id,
        approver: Some(approver.id),
        poi_id: entry.poi_id,
        change: AuditChange::Field {
            field,
            old_value,
            new_value,
        },
        created_at: None,
    }])?;
    repo.delete_queue(id)?;
    log::info!(
        "User {} applied {} of POI {} proposed by {}",
        approver.id,
        field,
        entry.poi_id,
        entry.submitter.user_id
    );
    Ok(QueueOutcome::Applied {
        poi_id: entry.poi_id,
        reindex: field.is_indexed(),
    })
}

/// Dismisses an entry without touching the POI.
pub fn delete_queue<R: QueueRepo>(repo: &R, user: &UserInfo, id: QueueId) -> Result<()> {
    authorize_moderator(user)?;
    repo.delete_queue(id)?;
    log::debug!("User {} dismissed queue entry {}", user.id, id);
    Ok(())
}

/// The oldest POI that has been created without a moderator.
pub fn next_unchecked<R: PoiRepo>(repo: &R, user: &UserInfo) -> Result<Option<Poi>> {
    authorize_moderator(user)?;
    Ok(repo.get_next_unchecked()?)
}

pub fn validate_poi<R: PoiRepo>(repo: &R, user: &UserInfo, id: PoiId) -> Result<()> {
    authorize_moderator(user)?;
    repo.set_needs_check(id, false)?;
    Ok(())
}

pub fn get_last_audit<R: AuditRepo>(repo: &R, user: &UserInfo, count: usize) -> Result<Vec<AuditEntry>> {
    authorize_moderator(user)?;
    Ok(repo.get_last_audit(count)?)
}

pub fn get_last_pois<R: PoiRepo>(repo: &R, count: usize) -> Result<Vec<Poi>> {
    Ok(repo.get_last_pois(count)?)
}

pub fn get_last_deleted<R: PoiRepo>(repo: &R, user: &UserInfo, count: usize) -> Result<Vec<Poi>> {
    authorize_moderator(user)?;
    Ok(repo.get_last_deleted(count)?)
}

pub fn get_random_poi<R: PoiRepo>(repo: &R) -> Result<Option<Poi>> {
    Ok(repo.get_random_pois(1)?.into_iter().next())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub pois: PoiStats,
    pub queue: usize,
}

pub fn get_stats<R: PoiRepo + QueueRepo>(repo: &R) -> Result<Stats> {
    Ok(Stats {
        pois: repo.count_pois()?,
        queue: repo.count_queue()?,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        super::{
            purge_poi, save_poi, submit_message,
            tests::{moderator, visitor, MockDb},
            SaveOutcome,
        },
        *,
    };
    use raydb_entities::builders::*;

    fn setup() -> (MockDb, PoiId) {
        let db = MockDb::default();
        let poi = Poi::build().name("Cafe").pos(30.0, 60.0).keywords("coffee").finish();
        let id = save_poi(&db, &moderator(1), poi).unwrap().poi_id();
        (db, id)
    }

    #[test]
    fn should_apply_queued_change_with_audit() {
        let (db, id) = setup();
        let mut poi = db.poi(id);
        poi.keywords = "coffee tea".into();
        poi.comment = Some("cozy".into());
        save_poi(&db, &visitor(7), poi).unwrap();
        let queue = get_queue(&db, &moderator(1), 10).unwrap();
        assert_eq!(2, queue.len());
        // newest first
        assert!(queue[0].created_at > queue[1].created_at);

        let keywords = queue
            .iter()
            .find(|e| e.change.field_name() == "keywords")
            .unwrap();
        let audit_len = db.get_audit_of_poi(id).unwrap().len();
        let outcome = apply_queue(&db, &moderator(2), keywords.id).unwrap();
        assert_eq!(
            QueueOutcome::Applied {
                poi_id: id,
                reindex: true
            },
            outcome
        );
        assert_eq!("coffee tea", db.poi(id).keywords);
        assert_eq!(1, db.count_queue().unwrap());
        assert_eq!(audit_len + 1, db.get_audit_of_poi(id).unwrap().len());

        let audit = db.get_last_audit(1).unwrap();
        assert_eq!(UserId::new(7), audit[0].submitter);
        assert_eq!(Some(UserId::new(2)), audit[0].approver);
        assert_eq!(
            AuditChange::Field {
                field: PoiField::Keywords,
                old_value: Some("coffee".into()),
                new_value: Some("coffee tea".into()),
            },
            audit[0].change
        );
    }

    #[test]
    fn should_dismiss_without_touching_the_poi() {
        let (db, id) = setup();
        let mut poi = db.poi(id);
        poi.name = "Bar".into();
        save_poi(&db, &visitor(7), poi).unwrap();
        let audit_len = db.audit.borrow().len();
        let entry = &get_queue(&db, &moderator(1), 1).unwrap()[0];
        delete_queue(&db, &moderator(1), entry.id).unwrap();
        assert_eq!("Cafe", db.poi(id).name);
        assert_eq!(0, db.count_queue().unwrap());
        assert_eq!(audit_len, db.audit.borrow().len());
    }

    #[test]
    fn should_not_apply_messages() {
        let (db, id) = setup();
        submit_message(&db, &visitor(7), &db.poi(id), "wrong hours").unwrap();
        let entry = &get_queue(&db, &moderator(1), 1).unwrap()[0];
        assert!(matches!(
            apply_queue(&db, &moderator(1), entry.id),
            Err(Error::MessageNotApplicable)
        ));
    }

    #[test]
    fn should_drop_entries_of_missing_pois() {
        let (db, id) = setup();
        let mut poi = db.poi(id);
        poi.name = "Bar".into();
        save_poi(&db, &visitor(7), poi).unwrap();
        // Gone without a purge that would have taken the entry along
        db.pois.borrow_mut().retain(|p| p.id != Some(id));
        let entry = get_queue(&db, &moderator(1), 1).unwrap().remove(0);
        let outcome = apply_queue(&db, &moderator(1), entry.id).unwrap();
        assert_eq!(QueueOutcome::PoiMissing(entry), outcome);
        assert_eq!(0, db.count_queue().unwrap());
    }

    #[test]
    fn should_drop_pending_changes_with_purged_poi() {
        let (db, cafe) = setup();
        let bar = save_poi(&db, &moderator(1), Poi::build().name("Bar").finish())
            .unwrap()
            .poi_id();
        let mut poi = db.poi(bar);
        poi.name = "Pub".into();
        save_poi(&db, &visitor(7), poi).unwrap();
        let entry = get_queue(&db, &moderator(1), 1).unwrap().remove(0);

        purge_poi(&db, &moderator(1), bar).unwrap();
        assert_eq!(0, db.count_queue().unwrap());
        let pharmacy = save_poi(&db, &moderator(1), Poi::build().name("Pharmacy").finish())
            .unwrap()
            .poi_id();
        assert_ne!(bar, pharmacy);
        assert_ne!(cafe, pharmacy);
        assert!(apply_queue(&db, &moderator(1), entry.id).is_err());
        assert_eq!("Pharmacy", db.poi(pharmacy).name);
    }

    #[test]
    fn should_reject_visitors() {
        let (db, _) = setup();
        assert!(matches!(get_queue(&db, &visitor(3), 5), Err(Error::Forbidden)));
        assert!(matches!(next_unchecked(&db, &visitor(3)), Err(Error::Forbidden)));
    }

    #[test]
    fn should_feed_unchecked_oldest_first() {
        let db = MockDb::default();
        let first = save_poi(&db, &visitor(3), Poi::build().name("One").finish()).unwrap();
        save_poi(&db, &visitor(4), Poi::build().name("Two").finish()).unwrap();
        let next = next_unchecked(&db, &moderator(1)).unwrap().unwrap();
        assert_eq!(Some(first.poi_id()), next.id);
        let audit_len = db.audit.borrow().len();
        validate_poi(&db, &moderator(1), first.poi_id()).unwrap();
        assert!(!db.poi(first.poi_id()).needs_check);
        assert_eq!(audit_len, db.audit.borrow().len());
        let next = next_unchecked(&db, &moderator(1)).unwrap().unwrap();
        assert_eq!("Two", next.name);
        assert!(matches!(first, SaveOutcome::Inserted(_)));
    }

    #[test]
    fn should_count_pois_and_queue() {
        let (db, id) = setup();
        db.insert_poi(&Poi::build().name("B").tag(TAG_BUILDING).finish()).unwrap();
        let mut poi = db.poi(id);
        poi.name = "Bar".into();
        save_poi(&db, &visitor(7), poi).unwrap();
        let stats = get_stats(&db).unwrap();
        assert_eq!(1, stats.pois.buildings);
        assert_eq!(1, stats.pois.pois);
        assert_eq!(1, stats.queue);
    }
}
