use super::*;
use crate::reindex::refresh_poi_index;
use raydb_core::review::ReviewSession;

pub fn apply_queue(
    connections: &sqlite::Connections,
    indexer: &mut dyn PoiIndexer,
    tags: &TagKeywords,
    approver: &UserInfo,
    id: QueueId,
) -> Result<usecases::QueueOutcome> {
    let outcome = connections
        .exclusive()?
        .transaction(|conn| usecases::apply_queue(conn, approver, id))?;
    if let usecases::QueueOutcome::Applied {
        poi_id,
        reindex: true,
    } = outcome
    {
        refresh_poi_index(connections, indexer, tags, poi_id);
    }
    Ok(outcome)
}

pub fn delete_queue(connections: &sqlite::Connections, user: &UserInfo, id: QueueId) -> Result<()> {
    connections
        .exclusive()?
        .transaction(|conn| usecases::delete_queue(conn, user, id))?;
    Ok(())
}

/// Clears the check flag of a POI that has been created by
/// an ordinary user.
pub fn validate_poi(connections: &sqlite::Connections, user: &UserInfo, id: PoiId) -> Result<()> {
    connections
        .exclusive()?
        .transaction(|conn| usecases::validate_poi(conn, user, id))?;
    info!("User {} validated POI {}", user.id, id);
    Ok(())
}

pub fn toggle_review(
    connections: &sqlite::Connections,
    user: &UserInfo,
    session: &mut ReviewSession,
    id: PoiId,
    now: Timestamp,
) -> Result<Option<Timestamp>> {
    let updated = connections
        .exclusive()?
        .transaction(|conn| usecases::toggle_review(conn, user, session, id, now))?;
    Ok(updated)
}

pub fn grant_moderator(
    connections: &sqlite::Connections,
    admin: &UserInfo,
    member: &RoleMember,
) -> Result<()> {
    connections
        .exclusive()?
        .transaction(|conn| usecases::grant_moderator(conn, admin, member))?;
    Ok(())
}

pub fn revoke_moderator(
    connections: &sqlite::Connections,
    admin: &UserInfo,
    user: UserId,
) -> Result<()> {
    connections
        .exclusive()?
        .transaction(|conn| usecases::revoke_moderator(conn, admin, user))?;
    Ok(())
}
