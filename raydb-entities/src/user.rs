use strum::{AsRefStr, Display, EnumString};
use time::Duration;

use crate::{geo::*, id::*, time::*};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Admin,
    Moderator,
}

/// What the directory knows about a messenger account
/// while the user is active.
#[derive(Debug, Clone, PartialEq)]
pub struct UserInfo {
    pub id: UserId,
    pub name: Option<String>,
    pub roles: Vec<Role>,
    pub last_access: Timestamp,
    location: Option<(Location, Timestamp)>,
    location_timeout: Duration,
}

impl UserInfo {
    /// A shared location is only trusted for a few minutes.
    pub const LOCATION_TIMEOUT: Duration = Duration::minutes(5);

    pub fn new(id: UserId, name: Option<String>, now: Timestamp) -> Self {
        Self {
            id,
            name,
            roles: vec![],
            last_access: now,
            location: None,
            location_timeout: Self::LOCATION_TIMEOUT,
        }
    }

    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.location_timeout = timeout;
        self
    }

    pub fn is_moderator(&self) -> bool {
        self.roles
            .iter()
            .any(|r| matches!(r, Role::Admin | Role::Moderator))
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }

    pub fn set_location(&mut self, location: Location, now: Timestamp) {
        self.location = Some((location, now));
    }

    pub fn location(&self, now: Timestamp) -> Option<Location> {
        self.location
            .filter(|(_, at)| now - *at <= self.location_timeout)
            .map(|(loc, _)| loc)
    }
}
