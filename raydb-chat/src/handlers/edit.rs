use raydb_application::prelude as flows;
use raydb_core::{
    address::AddressMatch,
    edit::{AttrKind, AttrValue, EditCommand, EditContext, EditError, EditSession, EditState, PhotoSlot},
    entities::*,
    gateways::messenger::Controls,
    usecases::{self, MessageOutcome, SaveOutcome},
};
use strum::IntoEnumIterator;

use crate::{
    callback::{button, Callback},
    dialogue::Dialogue,
    render, Bot, Result, UserSession,
};

const NOTHING_EDITED: &str = "Nothing is being edited, send /new to add a place.";
const UNKNOWN_PHOTO: &str = "Only photos that have been uploaded to the directory can be linked.";

fn confirmation_controls() -> Controls {
    let buttons = AttrKind::iter()
        .map(|attr| button(render::attr_label(attr), Callback::EditAttr(attr)))
        .collect();
    Controls::grid(buttons, 3).row(vec![
        button("Save", Callback::Save),
        button("Cancel", Callback::Cancel),
    ])
}

fn keep_button() -> Controls {
    Controls::default().row(vec![button("Keep", Callback::KeepAttr)])
}

impl Bot {
    pub(super) fn start_new(&mut self, session: &mut UserSession) -> Result<()> {
        session.dialogue = Dialogue::Edit(EditSession::create());
        self.prompt(session, None)
    }

    pub(super) fn start_edit(&mut self, session: &mut UserSession, id: PoiId) -> Result<()> {
        let poi = usecases::get_poi(&self.connections.shared()?, id)?;
        if poi.is_deleted() {
            return Err(usecases::Error::Deleted.into());
        }
        session.dialogue = Dialogue::Edit(EditSession::edit(poi));
        self.prompt(session, None)
    }

    /// Free text on the confirmation card is a note to the moderators.
    pub(super) fn edit_text(&mut self, session: &mut UserSession, edit: EditSession, text: &str) -> Result<()> {
        if edit.state != EditState::Confirming {
            return self.apply_edit(session, edit, EditCommand::Text(text.to_string()));
        }
        let outcome = flows::submit_message(
            &self.connections,
            self.moderators(),
            &session.info,
            &edit.poi,
            text.trim(),
        )?;
        let reply = match outcome {
            MessageOutcome::Queued(_) => "Thank you, the moderators will have a look.",
            MessageOutcome::Unattached => "Thank you, the moderators have been told.",
        };
        self.send(session.info.id, reply, None)?;
        Ok(())
    }

    pub(super) fn edit_command(&mut self, session: &mut UserSession, cmd: EditCommand) -> Result<()> {
        match session.edit_session().cloned() {
            Some(edit) => self.apply_edit(session, edit, cmd),
            None => {
                self.send(session.info.id, NOTHING_EDITED, None)?;
                Ok(())
            }
        }
    }

    /// A rejected command leaves the dialogue where it was.
    pub(super) fn apply_edit(
        &mut self,
        session: &mut UserSession,
        edit: EditSession,
        cmd: EditCommand,
    ) -> Result<()> {
        let ctx = EditContext {
            tokenizer: &self.config.tokenizer,
            default_link_title: &self.config.default_link_title,
        };
        let next = edit.apply(cmd, &ctx).map_err(usecases::Error::from)?;
        session.dialogue = match next.state {
            EditState::Idle => Dialogue::Idle,
            _ => Dialogue::Edit(next),
        };
        self.prompt(session, None)
    }

    pub(super) fn edit_attr(&mut self, session: &mut UserSession, attr: AttrKind, now: Timestamp) -> Result<()> {
        let Some(edit) = session.edit_session().cloned() else {
            self.send(session.info.id, NOTHING_EDITED, None)?;
            return Ok(());
        };
        let ctx = EditContext {
            tokenizer: &self.config.tokenizer,
            default_link_title: &self.config.default_link_title,
        };
        let next = edit
            .apply(EditCommand::Edit(attr), &ctx)
            .map_err(usecases::Error::from)?;
        let near = session.info.location(now).unwrap_or(next.poi.location);
        session.dialogue = Dialogue::Edit(next);
        self.prompt(session, Some(near))
    }

    /// Picks a building while editing, otherwise opens it.
    pub(super) fn choose_house(&mut self, session: &mut UserSession, key: &str) -> Result<()> {
        let picking = matches!(
            session.edit_session().map(|s| s.state),
            Some(EditState::EditingAttribute(AttrKind::House))
        );
        if !picking {
            let found = AddressMatch::Building {
                key: key.to_string(),
            };
            let now = session.info.last_access;
            return self.show_address(session, found, now);
        }
        let house = usecases::get_poi_by_key(&self.connections.shared()?, key)?
            .ok_or(usecases::Error::PoiMissing)?;
        self.edit_command(
            session,
            EditCommand::ChooseHouse {
                key: key.to_string(),
                name: house.name,
            },
        )
    }

    pub(super) fn link_photo(&mut self, session: &mut UserSession, file_id: &str) -> Result<()> {
        let Some(edit) = session.edit_session().cloned() else {
            self.send(session.info.id, NOTHING_EDITED, None)?;
            return Ok(());
        };
        let Some(name) = usecases::find_path_for_file_id(&self.connections.shared()?, file_id)? else {
            self.send(session.info.id, UNKNOWN_PHOTO, None)?;
            return Ok(());
        };
        let slot = if edit.poi.photo_out.is_none() {
            PhotoSlot::Outside
        } else {
            PhotoSlot::Inside
        };
        self.apply_edit(session, edit, EditCommand::SetPhoto { slot, name })
    }

    /// Storage failures keep the dialogue, so saving can be retried.
    pub(super) fn save(&mut self, session: &mut UserSession, now: Timestamp) -> Result<()> {
        let Some(edit) = session.edit_session().cloned() else {
            self.send(session.info.id, NOTHING_EDITED, None)?;
            return Ok(());
        };
        if edit.state != EditState::Confirming {
            return Err(usecases::Error::Edit(EditError::Unexpected).into());
        }
        let mut index = self.search_engine.clone();
        let outcome = flows::save_poi(
            &self.connections,
            &mut index,
            &self.config.tags,
            self.moderators(),
            &session.info,
            edit.poi.clone(),
        )?;
        self.apply_edit(session, edit, EditCommand::Saved)?;
        let user = session.info.id;
        let reply = match &outcome {
            SaveOutcome::Inserted(_) if !session.info.is_moderator() => {
                "Saved, thank you! The moderators will check the new place.".to_string()
            }
            SaveOutcome::Inserted(_) | SaveOutcome::Updated { .. } => "Saved.".to_string(),
            SaveOutcome::Queued { entries, .. } => {
                format!("Thank you, {entries} changes will be checked by the moderators.")
            }
            SaveOutcome::Unchanged(_) => "Nothing has changed.".to_string(),
        };
        self.send(user, &reply, None)?;
        if matches!(outcome, SaveOutcome::Inserted(_) | SaveOutcome::Updated { .. }) {
            let poi = usecases::get_poi(&self.connections.shared()?, outcome.poi_id())?;
            self.send_card(session, &poi, now)?;
        }
        Ok(())
    }

    /// Asks for whatever the current step needs.
    fn prompt(&self, session: &UserSession, near: Option<Location>) -> Result<()> {
        let Some(edit) = session.edit_session() else {
            return Ok(());
        };
        let user = session.info.id;
        match edit.state {
            EditState::Idle => {}
            EditState::Naming => {
                self.send(user, "What is the name of the place?", None)?;
            }
            EditState::LocationPending => {
                let text = format!("Where is {}? Share the location or send `lat, lon`.", edit.poi.name);
                self.send(user, &text, None)?;
            }
            EditState::KeywordsPending => {
                self.send(user, "Send a few keywords that describe it.", None)?;
            }
            EditState::Confirming => {
                self.send(user, &render::confirmation(edit), Some(&confirmation_controls()))?;
            }
            EditState::EditingAttribute(AttrKind::House) => {
                let near = near.unwrap_or(edit.poi.location);
                let houses = usecases::nearest_houses(&self.connections.shared()?, near)?;
                let buttons = houses
                    .into_iter()
                    .filter_map(|h| h.key.map(|key| button(h.name, Callback::ChooseHouse(key))))
                    .collect();
                let controls = Controls::grid(buttons, 1).row(vec![button("Keep", Callback::KeepAttr)]);
                self.send(user, render::attr_prompt(AttrKind::House), Some(&controls))?;
            }
            EditState::EditingAttribute(attr) => {
                let text = format!("{}\nNow: {}", render::attr_prompt(attr), current_value(edit, attr));
                self.send(user, &text, Some(&keep_button()))?;
            }
        }
        Ok(())
    }
}

fn current_value(edit: &EditSession, attr: AttrKind) -> String {
    AttrValue::of(&edit.poi, attr).to_string()
}
