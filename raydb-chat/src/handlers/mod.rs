//! Routing of inbound events to the dialogue they belong to.

use raydb_application::prelude as flows;
use raydb_core::{
    edit::{AttrKind, EditCommand, EditState},
    entities::*,
    gateways::messenger::{Controls, MessageId},
    usecases,
};

use crate::{
    callback::{button, Callback},
    dialogue::Dialogue,
    render, Bot, Result, UserSession,
};

mod edit;
mod moderation;
mod review;
mod search;

const LOCATION_SAVED: &str = "Got your location, results will be sorted by distance.";
const UNKNOWN_COMMAND: &str = "Unknown command, see /help.";
const REPORT_PROMPT: &str = "What should the moderators know? Send a message.";
const REPORT_SENT: &str = "Thank you, the moderators have been told.";
const REPLY_SENT: &str = "Your answer has been passed on.";

fn start_controls() -> Controls {
    Controls::default().row(vec![
        button("Add a place", Callback::New),
        button("Message the moderators", Callback::Report),
    ])
}

impl Bot {
    pub(crate) fn on_command(
        &mut self,
        session: &mut UserSession,
        name: &str,
        args: &str,
        now: Timestamp,
    ) -> Result<()> {
        let user = session.info.id;
        match name {
            "start" | "help" => {
                session.dialogue = Dialogue::Idle;
                self.send(user, render::HELP, Some(&start_controls()))?;
            }
            "cancel" => self.cancel(session)?,
            "new" => self.start_new(session)?,
            "msg" => self.start_report(session)?,
            "unlink" => self.edit_command(
                session,
                EditCommand::UnlinkPhoto {
                    name: args.to_string(),
                },
            )?,
            "delete" => self.ask_delete_reason(session, None)?,
            "queue" => self.show_next_queued(session, now)?,
            "unchecked" => self.show_unchecked(session, now)?,
            "audit" => self.show_audit(session)?,
            "deleted" => self.show_deleted(session)?,
            "recent" => self.show_recent(session)?,
            "random" => self.show_random(session, now)?,
            "stats" => self.show_stats(session)?,
            "grant" => self.grant(session, args)?,
            "revoke" => self.revoke(session, args)?,
            "review" => self.start_review(session, args, now)?,
            name => match name.strip_prefix("poi").and_then(|id| id.parse::<PoiId>().ok()) {
                Some(id) => self.show_poi(session, id, now)?,
                None => {
                    self.send(user, UNKNOWN_COMMAND, None)?;
                }
            },
        }
        Ok(())
    }

    pub(crate) fn on_text(&mut self, session: &mut UserSession, text: &str, now: Timestamp) -> Result<()> {
        match session.dialogue.clone() {
            Dialogue::Edit(edit) => self.edit_text(session, edit, text),
            Dialogue::Address(context) => self.continue_address(session, &context, text, now),
            Dialogue::DeleteReason(id) => self.delete_with_reason(session, id, text),
            Dialogue::Report => self.report(session, text),
            Dialogue::Idle | Dialogue::Review(_) => self.search(session, text, now),
        }
    }

    pub(crate) fn on_location(
        &mut self,
        session: &mut UserSession,
        location: Location,
        now: Timestamp,
    ) -> Result<()> {
        session.info.set_location(location, now);
        let wants_location = matches!(
            session.edit_session().map(|s| s.state),
            Some(EditState::LocationPending | EditState::EditingAttribute(AttrKind::Location))
        );
        if wants_location {
            return self.edit_command(session, EditCommand::Location(location));
        }
        self.send(session.info.id, LOCATION_SAVED, None)?;
        Ok(())
    }

    pub(crate) fn on_photo(&mut self, session: &mut UserSession, file_id: &str) -> Result<()> {
        self.link_photo(session, file_id)
    }

    pub(crate) fn on_callback(
        &mut self,
        session: &mut UserSession,
        callback: Callback,
        message: MessageId,
        now: Timestamp,
    ) -> Result<()> {
        match callback {
            Callback::Poi(id) => self.show_poi(session, id, now),
            Callback::Location(id) => self.show_location(session, id),
            Callback::Star(id) => self.star(session, id, message, now),
            Callback::List(list) => self.show_list(session, list, now),
            Callback::New => self.start_new(session),
            Callback::Report => self.start_report(session),
            Callback::EditPoi(id) => self.start_edit(session, id),
            Callback::EditAttr(attr) => self.edit_attr(session, attr, now),
            Callback::ChooseHouse(key) => self.choose_house(session, &key),
            Callback::KeepAttr => self.edit_command(session, EditCommand::CancelAttr),
            Callback::Save => self.save(session, now),
            Callback::Cancel => self.cancel(session),
            Callback::Queue => self.show_next_queued(session, now),
            Callback::ApplyQueue(id) => self.apply_queue(session, id, message, now),
            Callback::DismissQueue(id) => self.dismiss_queue(session, id, message, now),
            Callback::Validate(id) => self.validate(session, id, now),
            Callback::Delete(id) => self.ask_delete_reason(session, Some(id)),
            Callback::Restore(id) => self.restore(session, id, now),
            Callback::ReviewFloor { house, floor } => {
                self.review_house(session, &house, Some(&floor), now)
            }
            Callback::ToggleReview(id) => self.toggle_review(session, id, message, now),
        }
    }

    fn cancel(&mut self, session: &mut UserSession) -> Result<()> {
        if let Dialogue::Edit(edit) = &session.dialogue {
            let edit = edit.clone();
            self.apply_edit(session, edit, EditCommand::Cancel)?;
        }
        session.dialogue = Dialogue::Idle;
        self.send(session.info.id, "Cancelled.", None)?;
        Ok(())
    }

    fn start_report(&mut self, session: &mut UserSession) -> Result<()> {
        session.dialogue = Dialogue::Report;
        self.send(session.info.id, REPORT_PROMPT, None)?;
        Ok(())
    }

    fn report(&mut self, session: &mut UserSession, text: &str) -> Result<()> {
        session.dialogue = Dialogue::Idle;
        let from = session
            .info
            .name
            .clone()
            .unwrap_or_else(|| session.info.id.to_string());
        let sent = self.moderators().broadcast(
            &self.connections,
            &format!("Message from {from}: {}", text.trim()),
            None,
        )?;
        info!("User {} reported to {} moderators", session.info.id, sent);
        self.send(session.info.id, REPORT_SENT, None)?;
        Ok(())
    }

    /// Passes an answer on to the author of a forwarded message.
    ///
    /// Either side has to be a moderator. When a moderator answers,
    /// the other moderators learn that it has been taken care of.
    pub(crate) fn relay_reply(&mut self, session: &mut UserSession, to: UserId, text: &str) -> Result<()> {
        let from = &session.info;
        if !from.is_moderator() {
            let roles = usecases::load_roles(&self.connections.shared()?, to, self.config.admin)?;
            if roles.is_empty() {
                return Err(usecases::Error::Forbidden.into());
            }
        }
        let label = flows::user_label(from);
        let reply = format!("Answer from {label}:\n{}\n\nReply to this message to answer.", text.trim());
        self.send(to, &reply, None)?;
        if from.is_moderator() {
            let note = format!("{label} has answered {to}.");
            self.moderators().broadcast_except(&self.connections, &note, from.id)?;
        }
        info!("User {} answered {}", from.id, to);
        self.send(from.id, REPLY_SENT, None)?;
        Ok(())
    }

    fn show_stats(&mut self, session: &mut UserSession) -> Result<()> {
        let stats = usecases::get_stats(&self.connections.shared()?)?;
        self.send(session.info.id, &render::stats(&stats), None)?;
        Ok(())
    }
}
