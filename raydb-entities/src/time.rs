use std::{
    fmt,
    ops::{Add, Sub},
};
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// A point in time with a precision of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Self::truncate(OffsetDateTime::now_utc())
    }

    pub fn from_secs(secs: i64) -> Self {
        // Out of range values can only originate from corrupt rows.
        let ts = OffsetDateTime::from_unix_timestamp(secs).unwrap_or(OffsetDateTime::UNIX_EPOCH);
        Self(ts)
    }

    pub fn as_secs(&self) -> i64 {
        self.0.unix_timestamp()
    }

    pub fn to_offset_date_time(self) -> OffsetDateTime {
        self.0
    }

    /// Wall clock time at the given UTC offset.
    pub fn to_local(self, offset: UtcOffset) -> PrimitiveDateTime {
        let local = self.0.to_offset(offset);
        PrimitiveDateTime::new(local.date(), local.time())
    }

    /// Whole hours that elapsed between `self` and `now`.
    pub fn hours_until(self, now: Timestamp) -> i64 {
        (now.0 - self.0).whole_hours()
    }

    fn truncate(ts: OffsetDateTime) -> Self {
        Self::from_secs(ts.unix_timestamp())
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(from: OffsetDateTime) -> Self {
        Self::truncate(from)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self::Output {
        Self::truncate(self.0 + rhs)
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Self;
    fn sub(self, rhs: Duration) -> Self::Output {
        Self::truncate(self.0 - rhs)
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;
    fn sub(self, rhs: Timestamp) -> Self::Output {
        self.0 - rhs.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_from_into_secs() {
        let t1 = Timestamp::now();
        let t2 = Timestamp::from_secs(t1.as_secs());
        assert_eq!(t1, t2);
    }

    #[test]
    fn elapsed_hours() {
        let t1 = Timestamp::from_secs(1_000_000);
        let t2 = t1 + Duration::minutes(150);
        assert_eq!(2, t1.hours_until(t2));
        assert_eq!(Duration::minutes(150), t2 - t1);
    }
}
