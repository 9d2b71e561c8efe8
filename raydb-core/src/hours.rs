//! The free form in which editors type opening hours.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref HUMAN_HOURS: Regex = Regex::new(concat!(
        r"^(?:(пн|вт|ср|чт|пт|сб|вс)(?:\s*-\s*(пн|вт|ср|чт|пт|сб|вс))?\s+)?",
        r"(\d\d?(?:[:.]\d\d)?)\s*-\s*(\d\d(?:[:.]\d\d)?)",
        r"(?:\s+об?е?д?\s+(\d\d?(?:[:.]\d\d)?)\s*-\s*(\d\d(?:[:.]\d\d)?))?$"
    ))
    .expect("Human hours regex");
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unrecognized hours: {0}")]
pub struct HoursError(pub String);

fn weekday(abbr: &str) -> &'static str {
    match abbr {
        "пн" => "Mo",
        "вт" => "Tu",
        "ср" => "We",
        "чт" => "Th",
        "пт" => "Fr",
        "сб" => "Sa",
        _ => "Su",
    }
}

fn norm_time(t: &str) -> String {
    let t = t.replace('.', ":");
    let t = if t.contains(':') { t } else { format!("{t}:00") };
    format!("{t:0>5}")
}

/// Converts e.g. `пн-пт 9-18 обед 13-14, сб 10-15` into
/// `Mo-Fr 09:00-13:00,14:00-18:00; Sa 10:00-15:00`.
pub fn parse_human(src: &str) -> Result<String, HoursError> {
    let mut rules = vec![];
    for part in src.split(',') {
        let normalized = part.trim().to_lowercase();
        let caps = HUMAN_HOURS
            .captures(&normalized)
            .ok_or_else(|| HoursError(part.trim().to_string()))?;
        let mut rule = match caps.get(1) {
            Some(first) => weekday(first.as_str()).to_string(),
            None => "Mo-Su".to_string(),
        };
        if let Some(last) = caps.get(2) {
            rule.push('-');
            rule.push_str(weekday(last.as_str()));
        }
        let time = |i: usize| caps.get(i).map(|m| norm_time(m.as_str()));
        let (open, close) = (time(3).unwrap_or_default(), time(4).unwrap_or_default());
        match (time(5), time(6)) {
            (Some(lunch_start), Some(lunch_end)) => {
                rule.push_str(&format!(" {open}-{lunch_start},{lunch_end}-{close}"))
            }
            _ => rule.push_str(&format!(" {open}-{close}")),
        }
        rules.push(rule);
    }
    Ok(rules.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use raydb_entities::hours::OpeningHours;

    #[test]
    fn every_day_without_weekdays() {
        assert_eq!("Mo-Su 10:00-20:00", parse_human("10-20").unwrap());
    }

    #[test]
    fn weekdays_and_lunch() {
        assert_eq!(
            "Mo-Fr 09:30-13:00,14:00-18:00; Sa 10:00-15:00",
            parse_human("Пн-пт 9:30-18 обед 13-14, сб 10-15").unwrap()
        );
    }

    #[test]
    fn dots_as_separator() {
        assert_eq!("Su 11:00-16:30", parse_human("вс 11.00-16.30").unwrap());
    }

    #[test]
    fn result_is_recognized() {
        let src = parse_human("пн-сб 8-22, вс 10-18").unwrap();
        assert!(OpeningHours::parse(src).is_recognized());
    }

    #[test]
    fn report_offending_part() {
        assert_eq!(
            Err(HoursError("круглосуточно".into())),
            parse_human("пн 9-18, круглосуточно")
        );
    }
}
