//! What the bot remembers about a user between two events.

use raydb_core::{
    address::AddressContext, edit::EditSession, entities::*, review::ReviewSession,
};

/// The multi-step conversation a user is in.
///
/// Starting a new command replaces whatever was going on before.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Dialogue {
    #[default]
    Idle,
    Edit(EditSession),
    /// Waiting for a house or apartment number.
    Address(AddressContext),
    /// Waiting for the reason of a deletion.
    DeleteReason(PoiId),
    /// Waiting for a message to the moderators.
    Report,
    Review(ReviewSession),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserSession {
    pub info: UserInfo,
    pub dialogue: Dialogue,
}

impl UserSession {
    pub fn new(info: UserInfo) -> Self {
        Self {
            info,
            dialogue: Dialogue::Idle,
        }
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        match &self.dialogue {
            Dialogue::Edit(session) => Some(session),
            _ => None,
        }
    }
}
