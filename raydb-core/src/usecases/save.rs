use super::prelude::*;
use crate::{
    authorization::authorize_moderator,
    diff::{diff, snapshot, Diff},
};

/// What happened to an edited POI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted(PoiId),
    Updated { id: PoiId, reindex: bool },
    /// The changes await moderation, the live row is untouched.
    Queued { id: PoiId, entries: usize },
    Unchanged(PoiId),
}

impl SaveOutcome {
    pub fn poi_id(&self) -> PoiId {
        match self {
            Self::Inserted(id)
            | Self::Updated { id, .. }
            | Self::Queued { id, .. }
            | Self::Unchanged(id) => *id,
        }
    }

    /// Whether the full-text index has to be refreshed.
    pub fn needs_reindex(&self) -> bool {
        match self {
            Self::Inserted(_) => true,
            Self::Updated { reindex, .. } => *reindex,
            Self::Queued { .. } | Self::Unchanged(_) => false,
        }
    }
}

/// Persists the result of an edit dialogue.
///
/// New POIs are always stored, but flagged for a check unless a
/// moderator created them. Changes of existing POIs by other users
/// are queued field by field.
pub fn save_poi<R>(repo: &R, user: &UserInfo, mut poi: Poi) -> Result<SaveOutcome>
where
    R: PoiRepo + QueueRepo + AuditRepo,
{
    let Some(id) = poi.id else {
        if !user.is_moderator() {
            poi.needs_check = true;
        }
        return create_poi(repo, user, &poi).map(SaveOutcome::Inserted);
    };
    let old = repo.try_get_poi_by_id(id)?.ok_or(Error::PoiMissing)?;
    // Both are maintained by the store
    poi.created = old.created;
    poi.updated = old.updated;
    let changes = diff(&poi, Some(&old));
    if changes.is_empty() {
        return Ok(SaveOutcome::Unchanged(id));
    }
    if user.is_moderator() {
        let reindex = changes.affects_index();
        // Only the changed fields reach the store, the rest of the
        // caller's copy may be outdated
        let updated = changes.apply_to(&old)?;
        update_poi(repo, user, &updated, changes)?;
        Ok(SaveOutcome::Updated { id, reindex })
    } else {
        let entries = propose_changes(repo, user, id, changes)?;
        Ok(SaveOutcome::Queued { id, entries })
    }
}

pub fn create_poi<R>(repo: &R, user: &UserInfo, poi: &Poi) -> Result<PoiId>
where
    R: PoiRepo + AuditRepo,
{
    let id = repo.insert_poi(poi)?;
    let mut stored = poi.clone();
    stored.id = Some(id);
    repo.add_audit_entries(&[AuditEntry {
        submitter: user.id,
        approver: Some(user.id),
        poi_id: id,
        change: AuditChange::Created {
            snapshot: snapshot(&stored).to_string(),
        },
        created_at: None,
    }])?;
    log::info!("User {} created POI {} ({})", user.id, id, poi.name);
    Ok(id)
}

fn update_poi<R>(repo: &R, user: &UserInfo, poi: &Poi, changes: Diff) -> Result<()>
where
    R: PoiRepo + AuditRepo,
{
    let id = poi.id.ok_or(Error::NotPersisted)?;
    repo.update_poi(poi)?;
    let entries: Vec<_> = changes
        .into_changes()
        .into_iter()
        .map(|c| AuditEntry {
            submitter: user.id,
            approver: Some(user.id),
            poi_id: id,
            change: AuditChange::Field {
                field: c.field,
                old_value: c.old_value,
                new_value: c.new_value,
            },
            created_at: None,
        })
        .collect();
    log::info!("User {} changed {} fields of POI {}", user.id, entries.len(), id);
    repo.add_audit_entries(&entries)?;
    Ok(())
}

fn submitter(user: &UserInfo) -> Submitter {
    Submitter {
        user_id: user.id,
        user_name: user.name.clone(),
    }
}

fn propose_changes<R: QueueRepo>(
    repo: &R,
    user: &UserInfo,
    id: PoiId,
    changes: Diff,
) -> Result<usize> {
    let entries: Vec<_> = changes
        .into_changes()
        .into_iter()
        .map(|c| NewQueueEntry {
            submitter: submitter(user),
            poi_id: id,
            change: QueueChange::Field {
                field: c.field,
                old_value: c.old_value,
                new_value: c.new_value,
            },
        })
        .collect();
    let count = repo.add_queue_entries(&entries)?;
    log::info!("User {} proposed {} changes of POI {}", user.id, count, id);
    Ok(count)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Queued(PoiId),
    /// There is nothing to attach the message to, so it only
    /// reaches the moderators directly.
    Unattached,
}

/// A free-text note about a POI from a user.
pub fn submit_message<R: QueueRepo>(
    repo: &R,
    user: &UserInfo,
    poi: &Poi,
    text: &str,
) -> Result<MessageOutcome> {
    let Some(id) = poi.id else {
        return Ok(MessageOutcome::Unattached);
    };
    repo.add_queue_entries(&[NewQueueEntry {
        submitter: submitter(user),
        poi_id: id,
        change: QueueChange::Message(text.trim().to_string()),
    }])?;
    Ok(MessageOutcome::Queued(id))
}

pub fn delete_poi<R>(repo: &R, user: &UserInfo, id: PoiId, reason: &str) -> Result<Poi>
where
    R: PoiRepo + AuditRepo,
{
    authorize_moderator(user)?;
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(Error::EmptyReason);
    }
    let poi = repo.try_get_poi_by_id(id)?.ok_or(Error::PoiMissing)?;
    if poi.is_deleted() {
        return Err(Error::Deleted);
    }
    repo.delete_poi(id, reason)?;
    repo.add_audit_entries(&[AuditEntry {
        submitter: user.id,
        approver: Some(user.id),
        poi_id: id,
        change: AuditChange::DeleteReason {
            old: None,
            new: Some(reason.to_string()),
        },
        created_at: None,
    }])?;
    log::info!("User {} deleted POI {}: {}", user.id, id, reason);
    Ok(repo.get_poi_by_id(id)?)
}

pub fn restore_poi<R>(repo: &R, user: &UserInfo, id: PoiId) -> Result<Poi>
where
    R: PoiRepo + AuditRepo,
{
    authorize_moderator(user)?;
    let poi = repo.try_get_poi_by_id(id)?.ok_or(Error::PoiMissing)?;
    let Some(reason) = poi.delete_reason else {
        return Err(Error::NotDeleted);
    };
    repo.restore_poi(id)?;
    repo.add_audit_entries(&[AuditEntry {
        submitter: user.id,
        approver: Some(user.id),
        poi_id: id,
        change: AuditChange::DeleteReason {
            old: Some(reason),
            new: None,
        },
        created_at: None,
    }])?;
    log::info!("User {} restored POI {}", user.id, id);
    Ok(repo.get_poi_by_id(id)?)
}

/// Removes a POI permanently, keeping a snapshot in the audit log.
pub fn purge_poi<R>(repo: &R, user: &UserInfo, id: PoiId) -> Result<()>
where
    R: PoiRepo + AuditRepo,
{
    authorize_moderator(user)?;
    let poi = repo.try_get_poi_by_id(id)?.ok_or(Error::PoiMissing)?;
    repo.purge_poi(id)?;
    repo.add_audit_entries(&[AuditEntry {
        submitter: user.id,
        approver: Some(user.id),
        poi_id: id,
        change: AuditChange::Removed {
            snapshot: snapshot(&poi).to_string(),
        },
        created_at: None,
    }])?;
    log::warn!("User {} purged POI {} ({})", user.id, id, poi.name);
    Ok(())
}
