use std::{fmt, num::ParseIntError, str::FromStr};

/// Row identity of a persisted POI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoiId(i64);

impl PoiId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn to_inner(self) -> i64 {
        self.0
    }
}

impl From<i64> for PoiId {
    fn from(from: i64) -> Self {
        Self(from)
    }
}

impl From<PoiId> for i64 {
    fn from(from: PoiId) -> Self {
        from.0
    }
}

impl FromStr for PoiId {
    type Err = ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl fmt::Display for PoiId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messenger account identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn to_inner(self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(from: i64) -> Self {
        Self(from)
    }
}

impl From<UserId> for i64 {
    fn from(from: UserId) -> Self {
        from.0
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(i64);

impl QueueId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn to_inner(self) -> i64 {
        self.0
    }
}

impl From<i64> for QueueId {
    fn from(from: i64) -> Self {
        Self(from)
    }
}

impl FromStr for QueueId {
    type Err = ParseIntError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ids_from_callback_data() {
        assert_eq!(PoiId::new(42), " 42".parse().unwrap());
        assert_eq!(UserId::new(-7), "-7".parse().unwrap());
        assert!("x1".parse::<QueueId>().is_err());
    }
}
