use super::*;
use crate::{
    notify::{notify_poi_event, user_label, Moderators},
    reindex::refresh_poi_index,
};

/// Stores the outcome of an edit dialogue.
///
/// Changes that wait for a moderator and POIs that have been
/// added by ordinary users are announced to all moderators.
pub fn save_poi(
    connections: &sqlite::Connections,
    indexer: &mut dyn PoiIndexer,
    tags: &TagKeywords,
    moderators: Moderators,
    user: &UserInfo,
    poi: Poi,
) -> Result<usecases::SaveOutcome> {
    let name = poi.name.clone();
    let outcome = connections
        .exclusive()?
        .transaction(|conn| usecases::save_poi(conn, user, poi))
        .map_err(|err| {
            warn!("Failed to save POI {}: {}", name, err);
            err
        })?;

    if outcome.needs_reindex() {
        refresh_poi_index(connections, indexer, tags, outcome.poi_id());
    }

    match &outcome {
        usecases::SaveOutcome::Queued { id, entries } => {
            let text = format!(
                "{} proposed {} changes of {}",
                user_label(user),
                entries,
                name
            );
            notify_poi_event(connections, moderators, *id, &text);
        }
        usecases::SaveOutcome::Inserted(id) if !user.is_moderator() => {
            let text = format!("{} added {}", user_label(user), name);
            notify_poi_event(connections, moderators, *id, &text);
        }
        _ => {}
    }
    Ok(outcome)
}

/// A free-text note about a POI.
///
/// Notes about stored POIs are queued for moderation, notes
/// about POIs that have not been saved yet go straight to the
/// moderators.
pub fn submit_message(
    connections: &sqlite::Connections,
    moderators: Moderators,
    user: &UserInfo,
    poi: &Poi,
    text: &str,
) -> Result<usecases::MessageOutcome> {
    let outcome = connections
        .exclusive()?
        .transaction(|conn| usecases::submit_message(conn, user, poi, text))?;
    if outcome == usecases::MessageOutcome::Unattached {
        let note = format!("Message from {} about {}: {}", user_label(user), poi.name, text.trim());
        moderators.broadcast(connections, &note, None)?;
    }
    Ok(outcome)
}
