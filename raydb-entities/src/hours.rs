//! Opening hours in the subset of the OpenStreetMap `opening_hours`
//! syntax that the editor produces, e.g.
//! `Mo-Fr 09:00-13:00,14:00-18:00; Sa 10:00-15:00; Su off` or `24/7`.

use std::fmt;
use time::PrimitiveDateTime;

pub const WEEKDAYS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpeningHours {
    src: String,
    schedule: Option<Schedule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Schedule {
    AlwaysOpen,
    Rules(Vec<Rule>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    days: [bool; 7],
    spans: Vec<Span>,
}

/// Minutes since midnight, `end` may be `<= start` for spans
/// that continue after midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: u16,
    end: u16,
}

impl OpeningHours {
    /// Never fails: a source that cannot be interpreted is kept
    /// as is and reports neither open nor closed.
    pub fn parse(src: impl Into<String>) -> Self {
        let src = src.into();
        let schedule = parse_schedule(&src);
        Self { src, schedule }
    }

    pub fn as_str(&self) -> &str {
        &self.src
    }

    pub fn is_recognized(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn is_24_7(&self) -> bool {
        matches!(self.schedule, Some(Schedule::AlwaysOpen))
    }

    /// `None` if the schedule could not be interpreted.
    pub fn is_open(&self, at: PrimitiveDateTime) -> Option<bool> {
        let rules = match self.schedule.as_ref()? {
            Schedule::AlwaysOpen => return Some(true),
            Schedule::Rules(rules) => rules,
        };
        let day = at.weekday().number_days_from_monday() as usize;
        let prev_day = (day + 6) % 7;
        let minute = at.hour() as u16 * 60 + at.minute() as u16;

        let open_today = effective_rule(rules, day)
            .map(|rule| {
                rule.spans.iter().any(|s| {
                    if s.end > s.start {
                        (s.start..s.end).contains(&minute)
                    } else {
                        minute >= s.start
                    }
                })
            })
            .unwrap_or(false);
        let open_since_yesterday = effective_rule(rules, prev_day)
            .map(|rule| {
                rule.spans
                    .iter()
                    .any(|s| s.end <= s.start && minute < s.end)
            })
            .unwrap_or(false);
        Some(open_today || open_since_yesterday)
    }
}

impl fmt::Display for OpeningHours {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.src)
    }
}

// Later rules override earlier ones for the days they mention.
fn effective_rule(rules: &[Rule], day: usize) -> Option<&Rule> {
    rules.iter().rev().find(|r| r.days[day])
}

fn parse_schedule(src: &str) -> Option<Schedule> {
    let src = src.trim();
    if src == "24/7" {
        return Some(Schedule::AlwaysOpen);
    }
    let rules = src
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_rule)
        .collect::<Option<Vec<_>>>()?;
    if rules.is_empty() {
        return None;
    }
    Some(Schedule::Rules(rules))
}

fn parse_rule(s: &str) -> Option<Rule> {
    let (days, times) = match s.split_once(char::is_whitespace) {
        Some((head, tail)) if head.starts_with(|c: char| c.is_ascii_alphabetic()) => {
            (parse_days(head)?, tail.trim())
        }
        _ if s.starts_with(|c: char| c.is_ascii_alphabetic()) => return None,
        _ => ([true; 7], s),
    };
    let spans = if times == "off" || times == "closed" {
        vec![]
    } else {
        times
            .split(',')
            .map(|t| parse_span(t.trim()))
            .collect::<Option<Vec<_>>>()?
    };
    Some(Rule { days, spans })
}

fn parse_days(s: &str) -> Option<[bool; 7]> {
    let mut days = [false; 7];
    for part in s.split(',') {
        match part.split_once('-') {
            Some((from, to)) => {
                let from = weekday_index(from)?;
                let to = weekday_index(to)?;
                let mut d = from;
                loop {
                    days[d] = true;
                    if d == to {
                        break;
                    }
                    d = (d + 1) % 7;
                }
            }
            None => days[weekday_index(part)?] = true,
        }
    }
    Some(days)
}

fn weekday_index(s: &str) -> Option<usize> {
    WEEKDAYS.iter().position(|d| *d == s)
}

fn parse_span(s: &str) -> Option<Span> {
    let (start, end) = s.split_once('-')?;
    let start = parse_time(start.trim())?;
    let end = parse_time(end.trim())?;
    let start = if start == MINUTES_PER_DAY { 0 } else { start };
    let end = if end == MINUTES_PER_DAY { 0 } else { end };
    Some(Span { start, end })
}

fn parse_time(s: &str) -> Option<u16> {
    let (h, m) = s.split_once(':')?;
    let h: u16 = h.parse().ok()?;
    let m: u16 = m.parse().ok()?;
    if h > 24 || m > 59 || (h == 24 && m > 0) {
        return None;
    }
    Some(h * 60 + m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn always_open() {
        let oh = OpeningHours::parse("24/7");
        assert!(oh.is_24_7());
        assert_eq!(Some(true), oh.is_open(datetime!(2024-03-03 03:00)));
    }

    #[test]
    fn weekdays_with_lunch_break() {
        let oh = OpeningHours::parse("Mo-Fr 09:00-13:00,14:00-18:00; Sa 10:00-15:00");
        // 2024-03-04 is a Monday
        assert_eq!(Some(true), oh.is_open(datetime!(2024-03-04 09:00)));
        assert_eq!(Some(false), oh.is_open(datetime!(2024-03-04 13:30)));
        assert_eq!(Some(false), oh.is_open(datetime!(2024-03-04 18:00)));
        assert_eq!(Some(true), oh.is_open(datetime!(2024-03-09 14:59)));
        assert_eq!(Some(false), oh.is_open(datetime!(2024-03-10 12:00)));
    }

    #[test]
    fn later_rules_override_earlier_ones() {
        let oh = OpeningHours::parse("Mo-Su 10:00-20:00; Su off");
        assert_eq!(Some(true), oh.is_open(datetime!(2024-03-09 12:00)));
        assert_eq!(Some(false), oh.is_open(datetime!(2024-03-10 12:00)));
    }

    #[test]
    fn spans_after_midnight() {
        let oh = OpeningHours::parse("Fr 20:00-02:00");
        assert_eq!(Some(true), oh.is_open(datetime!(2024-03-08 23:00)));
        assert_eq!(Some(true), oh.is_open(datetime!(2024-03-09 01:30)));
        assert_eq!(Some(false), oh.is_open(datetime!(2024-03-09 02:00)));
        assert_eq!(Some(false), oh.is_open(datetime!(2024-03-07 01:00)));
    }

    #[test]
    fn open_until_midnight() {
        let oh = OpeningHours::parse("10:00-24:00");
        assert_eq!(Some(true), oh.is_open(datetime!(2024-03-08 23:59)));
        assert_eq!(Some(false), oh.is_open(datetime!(2024-03-09 00:30)));
    }

    #[test]
    fn keep_unsupported_source() {
        let oh = OpeningHours::parse("sunrise-sunset");
        assert!(!oh.is_recognized());
        assert_eq!("sunrise-sunset", oh.as_str());
        assert_eq!(None, oh.is_open(datetime!(2024-03-08 12:00)));
    }
}
