//! # raydb-chat
//!
//! Turns inbound chat events into application flows and answers
//! through a [`Messenger`].

#[macro_use]
extern crate log;

use std::path::PathBuf;

use rand::{rngs::StdRng, SeedableRng};
use raydb_application::prelude::Moderators;
use raydb_core::{
    entities::*,
    gateways::messenger::{Controls, MessageId, Messenger},
    responses::PredefinedResponse,
    session::SessionStore,
    tag::TagKeywords,
    text::Tokenizer,
    usecases,
};
use raydb_db_sqlite::Connections;
use raydb_db_tantivy::SearchEngine;
use time::{Duration, UtcOffset};

mod callback;
mod dialogue;
mod error;
mod handlers;
mod render;


pub use self::{
    callback::Callback,
    dialogue::{Dialogue, UserSession},
    error::{Error, Result},
};

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub admin: Option<UserId>,
    /// Only the admin gets answers while this is set.
    pub maintenance: bool,
    pub tokenizer: Tokenizer,
    pub default_link_title: String,
    pub tags: TagKeywords,
    pub address: AddressConfig,
    /// Checked before addresses and keywords.
    pub responses: Vec<PredefinedResponse>,
    /// Opening hours are evaluated in local time.
    pub utc_offset: UtcOffset,
    pub session_timeout: Duration,
    pub location_timeout: Duration,
    pub photos_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Text(String),
    Location(Location),
    /// An uploaded photo, referenced by its messenger file id.
    Photo(String),
    Command { name: String, args: String },
    Callback { data: String, message: MessageId },
    /// An answer to a message that has been forwarded from `to`.
    Reply { to: UserId, text: String },
}

impl Input {
    /// `/name args` becomes a command, everything else plain text.
    pub fn parse_line(line: &str) -> Self {
        let line = line.trim();
        match line.strip_prefix('/') {
            Some(command) if !command.is_empty() => {
                let (name, args) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
                Self::Command {
                    name: name.to_lowercase(),
                    args: args.trim().to_string(),
                }
            }
            _ => Self::Text(line.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub user: UserId,
    pub user_name: Option<String>,
    pub input: Input,
}

pub struct Bot {
    connections: Connections,
    search_engine: SearchEngine,
    messenger: Box<dyn Messenger>,
    sessions: SessionStore<UserSession>,
    config: BotConfig,
    rng: StdRng,
}

const MAINTENANCE: &str = "The bot is under maintenance, please come back later.";

impl Bot {
    pub fn new(
        connections: Connections,
        search_engine: SearchEngine,
        messenger: Box<dyn Messenger>,
        config: BotConfig,
    ) -> Self {
        Self {
            connections,
            search_engine,
            messenger,
            sessions: SessionStore::new(config.session_timeout),
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Shuffles of unlocated search results become reproducible.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn session(&self, user: UserId) -> Option<&UserSession> {
        self.sessions.get(user)
    }

    /// Processes one inbound event. Failures are answered,
    /// never propagated.
    pub fn handle(&mut self, event: Event, now: Timestamp) {
        let Event {
            user,
            user_name,
            input,
        } = event;
        if self.config.maintenance && self.config.admin != Some(user) {
            if let Err(err) = self.messenger.send_text(user, MAINTENANCE, None) {
                warn!("Could not answer {}: {}", user, err);
            }
            return;
        }
        let timeout = self.sessions.timeout();
        let mut session = self
            .sessions
            .remove(user)
            // Not swept yet but already expired
            .filter(|s| now - s.info.last_access <= timeout)
            .unwrap_or_else(|| {
                let info = UserInfo::new(user, user_name.clone(), now)
                    .with_location_timeout(self.config.location_timeout);
                UserSession::new(info)
            });
        session.info.last_access = now;
        if user_name.is_some() {
            session.info.name = user_name;
        }
        if let Err(err) = self.dispatch(&mut session, input, now) {
            if err.is_user_error() {
                debug!("Rejected input of {}: {}", user, err);
            } else {
                error!("Failed to handle event of {}: {}", user, err);
            }
            if let Err(err) = self.messenger.send_text(user, &err.reply(), None) {
                warn!("Could not answer {}: {}", user, err);
            }
        }
        self.sessions.insert(user, session, now);
    }

    /// Drops idle sessions, returns how many were dropped.
    pub fn sweep(&mut self, now: Timestamp) -> usize {
        let evicted = self.sessions.sweep(now);
        if !evicted.is_empty() {
            debug!("Dropped {} idle sessions", evicted.len());
        }
        evicted.len()
    }

    fn dispatch(&mut self, session: &mut UserSession, input: Input, now: Timestamp) -> Result<()> {
        let user = session.info.id;
        session.info.roles =
            usecases::load_roles(&self.connections.shared()?, user, self.config.admin)?;
        match input {
            Input::Command { name, args } => self.on_command(session, &name, &args, now),
            Input::Text(text) => self.on_text(session, &text, now),
            Input::Location(location) => self.on_location(session, location, now),
            Input::Photo(file_id) => self.on_photo(session, &file_id),
            Input::Reply { to, text } => self.relay_reply(session, to, &text),
            Input::Callback { data, message } => match Callback::decode(&data) {
                Some(callback) => self.on_callback(session, callback, message, now),
                None => {
                    warn!("Unknown callback data {:?} from {}", data, user);
                    Ok(())
                }
            },
        }
    }

    fn moderators(&self) -> Moderators<'_> {
        Moderators {
            messenger: &*self.messenger,
            admin: self.config.admin,
        }
    }

    fn send(&self, to: UserId, text: &str, controls: Option<&Controls>) -> Result<MessageId> {
        let controls = controls.filter(|c| !c.is_empty());
        Ok(self.messenger.send_text(to, text, controls)?)
    }
}
