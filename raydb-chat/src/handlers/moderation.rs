use raydb_application::prelude as flows;
use raydb_core::{
    entities::*,
    gateways::messenger::{Controls, MessageId},
    repositories::RoleMember,
    usecases::{self, QueueOutcome},
};

use crate::{
    callback::{button, Callback},
    dialogue::Dialogue,
    render, Bot, Result, UserSession,
};

const LOG_PAGE: usize = 20;

const QUEUE_EMPTY: &str = "The queue is empty.";
const ALL_CHECKED: &str = "Every place has been checked.";

fn queue_controls(entry: &QueueEntry) -> Controls {
    let mut row = vec![];
    if matches!(entry.change, QueueChange::Field { .. }) {
        row.push(button("Apply", Callback::ApplyQueue(entry.id)));
    }
    row.push(button("Dismiss", Callback::DismissQueue(entry.id)));
    row.push(button("Open", Callback::Poi(entry.poi_id)));
    Controls::default().row(row)
}

impl Bot {
    /// Surfaces the newest pending change, one at a time.
    ///
    /// Entries of POIs that no longer exist are dropped on the way,
    /// an empty queue moves on to the POIs that need a check.
    pub(super) fn show_next_queued(&mut self, session: &mut UserSession, now: Timestamp) -> Result<()> {
        let user = session.info.id;
        loop {
            let next = {
                let db = self.connections.shared()?;
                match usecases::get_queue(&db, &session.info, 1)?.pop() {
                    Some(entry) => {
                        let poi = usecases::get_pois(&db, &[entry.poi_id])?.pop();
                        Some((entry, poi))
                    }
                    None => None,
                }
            };
            let Some((entry, poi)) = next else {
                return self.next_unchecked_or(session, now, QUEUE_EMPTY);
            };
            let Some(poi) = poi else {
                flows::delete_queue(&self.connections, &session.info, entry.id)?;
                let text = format!("POI {} no longer exists, its change has been dropped.", entry.poi_id);
                self.send(user, &text, None)?;
                continue;
            };
            self.send(user, &render::queue_entry(&entry, &poi.name), Some(&queue_controls(&entry)))?;
            return Ok(());
        }
    }

    pub(super) fn apply_queue(
        &mut self,
        session: &mut UserSession,
        id: QueueId,
        message: MessageId,
        now: Timestamp,
    ) -> Result<()> {
        let mut index = self.search_engine.clone();
        let outcome = flows::apply_queue(
            &self.connections,
            &mut index,
            &self.config.tags,
            &session.info,
            id,
        )?;
        self.clear_controls(session.info.id, message);
        let reply = match outcome {
            QueueOutcome::Applied { poi_id, .. } => format!("Applied to POI {poi_id}."),
            QueueOutcome::PoiMissing(entry) => format!(
                "POI {} no longer exists, the change has been dropped.",
                entry.poi_id
            ),
        };
        self.send(session.info.id, &reply, None)?;
        self.show_next_queued(session, now)
    }

    pub(super) fn dismiss_queue(
        &mut self,
        session: &mut UserSession,
        id: QueueId,
        message: MessageId,
        now: Timestamp,
    ) -> Result<()> {
        flows::delete_queue(&self.connections, &session.info, id)?;
        self.clear_controls(session.info.id, message);
        self.send(session.info.id, "Dismissed.", None)?;
        self.show_next_queued(session, now)
    }

    fn clear_controls(&self, user: UserId, message: MessageId) {
        if let Err(err) = self.messenger.edit_controls(user, message, &Controls::default()) {
            warn!("Could not remove the buttons of message {}: {}", message, err);
        }
    }

    pub(super) fn show_unchecked(&mut self, session: &mut UserSession, now: Timestamp) -> Result<()> {
        self.next_unchecked_or(session, now, ALL_CHECKED)
    }

    fn next_unchecked_or(&mut self, session: &mut UserSession, now: Timestamp, empty: &str) -> Result<()> {
        match usecases::next_unchecked(&self.connections.shared()?, &session.info)? {
            Some(poi) => self.send_card(session, &poi, now),
            None => {
                self.send(session.info.id, empty, None)?;
                Ok(())
            }
        }
    }

    /// Clears the flag and moves on to whatever waits next.
    pub(super) fn validate(&mut self, session: &mut UserSession, id: PoiId, now: Timestamp) -> Result<()> {
        flows::validate_poi(&self.connections, &session.info, id)?;
        self.send(session.info.id, "Marked as checked.", None)?;
        self.show_next_queued(session, now)
    }

    /// Without an id the POI being edited is meant.
    pub(super) fn ask_delete_reason(&mut self, session: &mut UserSession, id: Option<PoiId>) -> Result<()> {
        if !session.info.is_moderator() {
            return Err(usecases::Error::Forbidden.into());
        }
        let id = id
            .or_else(|| session.edit_session().and_then(|s| s.poi.id))
            .ok_or(usecases::Error::NotPersisted)?;
        session.dialogue = Dialogue::DeleteReason(id);
        self.send(session.info.id, "Why should it be deleted?", None)?;
        Ok(())
    }

    /// An empty reason keeps asking.
    pub(super) fn delete_with_reason(&mut self, session: &mut UserSession, id: PoiId, reason: &str) -> Result<()> {
        let mut index = self.search_engine.clone();
        let poi = flows::delete_poi(
            &self.connections,
            &mut index,
            &self.config.tags,
            &session.info,
            id,
            reason.trim(),
        )?;
        session.dialogue = Dialogue::Idle;
        self.send(session.info.id, &format!("{} has been deleted.", poi.name), None)?;
        Ok(())
    }

    pub(super) fn restore(&mut self, session: &mut UserSession, id: PoiId, now: Timestamp) -> Result<()> {
        let mut index = self.search_engine.clone();
        let poi = flows::restore_poi(&self.connections, &mut index, &self.config.tags, &session.info, id)?;
        self.send(session.info.id, &format!("{} is back.", poi.name), None)?;
        self.send_card(session, &poi, now)
    }

    pub(super) fn show_audit(&mut self, session: &mut UserSession) -> Result<()> {
        let entries = usecases::get_last_audit(&self.connections.shared()?, &session.info, LOG_PAGE)?;
        let text = if entries.is_empty() {
            "No changes yet.".to_string()
        } else {
            entries.iter().map(render::audit_entry).collect::<Vec<_>>().join("\n")
        };
        self.send(session.info.id, &text, None)?;
        Ok(())
    }

    pub(super) fn show_deleted(&mut self, session: &mut UserSession) -> Result<()> {
        let pois = usecases::get_last_deleted(&self.connections.shared()?, &session.info, LOG_PAGE)?;
        self.send_poi_links(session.info.id, "Recently deleted:", &pois)
    }

    /// `/grant <user id> [name]`
    pub(super) fn grant(&mut self, session: &mut UserSession, args: &str) -> Result<()> {
        let (id, name) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
        let Ok(user_id) = id.parse::<UserId>() else {
            self.send(session.info.id, "Usage: /grant <user id> [name]", None)?;
            return Ok(());
        };
        let name = name.trim();
        let member = RoleMember {
            user_id,
            name: (!name.is_empty()).then(|| name.to_string()),
        };
        flows::grant_moderator(&self.connections, &session.info, &member)?;
        self.send(session.info.id, &format!("{user_id} is a moderator now."), None)?;
        Ok(())
    }

    /// `/revoke <user id>`
    pub(super) fn revoke(&mut self, session: &mut UserSession, args: &str) -> Result<()> {
        let Ok(user_id) = args.trim().parse::<UserId>() else {
            self.send(session.info.id, "Usage: /revoke <user id>", None)?;
            return Ok(());
        };
        flows::revoke_moderator(&self.connections, &session.info, user_id)?;
        self.send(session.info.id, &format!("{user_id} is no longer a moderator."), None)?;
        Ok(())
    }
}
