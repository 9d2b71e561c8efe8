//! Review sweeps: a moderator walks through the POIs of a building
//! or around a location and marks each one as looked at.
//!
//! Marking only moves the `updated` timestamp, no field changes and
//! therefore no audit rows are involved.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::entities::*;

pub const MAX_REVIEW_ITEMS: usize = 14;
pub const AROUND_COUNT: usize = 30;
/// POIs updated within this many hours go to the end of the list.
pub const STALE_AFTER_HOURS: i64 = 10;
/// POIs updated within this many hours count as reviewed.
pub const REVIEWED_WITHIN_HOURS: i64 = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
    #[error("The POI {0} is not part of the review")]
    NoRecord(PoiId),
}

/// Restricts a review to a single floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloorFilter {
    /// Only POIs without a floor.
    Without,
    Floor(String),
}

impl FloorFilter {
    /// `-` stands for POIs without a floor, `*` for all floors.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "*" => None,
            "-" => Some(Self::Without),
            floor => Some(Self::Floor(floor.to_string())),
        }
    }

    pub fn matches(&self, floor: Option<&str>) -> bool {
        match self {
            Self::Without => floor.is_none(),
            Self::Floor(f) => floor == Some(f.as_str()),
        }
    }
}

fn age_in_hours(poi: &Poi, now: Timestamp) -> i64 {
    poi.updated
        .map(|updated| updated.hours_until(now))
        .unwrap_or(i64::MAX)
}

/// Nearest first when a reference is known, then stable with the
/// stale ones in front, at most [`MAX_REVIEW_ITEMS`].
pub fn order_for_review(mut pois: Vec<Poi>, reference: Option<Location>, now: Timestamp) -> Vec<Poi> {
    if let Some(reference) = reference {
        pois.sort_by(|a, b| {
            reference
                .distance(&a.location)
                .to_meters()
                .total_cmp(&reference.distance(&b.location).to_meters())
        });
    }
    pois.sort_by_key(|p| age_in_hours(p, now) <= STALE_AFTER_HOURS);
    pois.truncate(MAX_REVIEW_ITEMS);
    pois
}

/// Distinct floors, only if there is something to choose from.
pub fn floor_choices(pois: &[Poi]) -> Option<Vec<Option<String>>> {
    let floors: BTreeSet<Option<&str>> = pois.iter().map(|p| p.floor.as_deref()).collect();
    if floors.len() < 2 {
        return None;
    }
    Some(floors.into_iter().map(|f| f.map(ToString::to_string)).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Phones,
    Links,
    Address,
    Keywords,
    PhotoOut,
    PhotoIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistEntry {
    pub poi_id: Option<PoiId>,
    pub name: String,
    pub wifi: Option<bool>,
    pub cards: Option<bool>,
    pub missing: Vec<MissingField>,
    /// Shortened opening hours, `None` if unknown.
    pub hours: Option<String>,
    pub reviewed: bool,
}

impl ChecklistEntry {
    pub fn new(poi: &Poi, now: Timestamp) -> Self {
        let checks = [
            (poi.phones.is_empty(), MissingField::Phones),
            (poi.links.is_empty(), MissingField::Links),
            (is_blank(&poi.address_part), MissingField::Address),
            (poi.keywords.trim().is_empty(), MissingField::Keywords),
            (is_blank(&poi.photo_out), MissingField::PhotoOut),
            (is_blank(&poi.photo_in), MissingField::PhotoIn),
        ];
        Self {
            poi_id: poi.id,
            name: poi.name.clone(),
            wifi: poi.has_wifi.into(),
            cards: poi.accepts_cards.into(),
            missing: checks
                .into_iter()
                .filter_map(|(missing, field)| missing.then_some(field))
                .collect(),
            hours: poi.hours.as_ref().map(|h| h.as_str().replace(":00", "")),
            reviewed: age_in_hours(poi, now) <= REVIEWED_WITHIN_HOURS,
        }
    }
}

fn is_blank(s: &Option<String>) -> bool {
    s.as_deref().map(str::is_empty).unwrap_or(true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unmarked,
    Marked { previous: Option<Timestamp> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSession {
    items: Vec<(PoiId, Mark)>,
    pub house: Option<String>,
    pub floor: Option<FloorFilter>,
}

impl ReviewSession {
    pub fn new(pois: &[Poi], house: Option<String>, floor: Option<FloorFilter>) -> Self {
        Self {
            items: pois
                .iter()
                .filter_map(|p| p.id)
                .map(|id| (id, Mark::Unmarked))
                .collect(),
            house,
            floor,
        }
    }

    pub fn poi_ids(&self) -> Vec<PoiId> {
        self.items.iter().map(|(id, _)| *id).collect()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_REVIEW_ITEMS
    }

    /// Returns the new `updated` timestamp of the POI.
    ///
    /// The first toggle marks the POI as reviewed now, the second
    /// one restores the timestamp it had before.
    pub fn toggle(
        &mut self,
        id: PoiId,
        current: Option<Timestamp>,
        now: Timestamp,
    ) -> Result<Option<Timestamp>, ReviewError> {
        let (_, mark) = self
            .items
            .iter_mut()
            .find(|(item, _)| *item == id)
            .ok_or(ReviewError::NoRecord(id))?;
        let (next, updated) = match *mark {
            Mark::Unmarked => (Mark::Marked { previous: current }, Some(now)),
            Mark::Marked { previous } => (Mark::Unmarked, previous),
        };
        *mark = next;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raydb_entities::builders::*;
    use time::Duration;

    fn now() -> Timestamp {
        Timestamp::from_secs(1_700_000_000)
    }

    fn poi(id: i64, lon: f64, updated_hours_ago: Option<i64>) -> Poi {
        let mut poi = Poi::build().id(id).name("x").pos(lon, 60.0).finish();
        poi.updated = updated_hours_ago.map(|h| now() - Duration::hours(h));
        poi
    }

    fn ids(pois: &[Poi]) -> Vec<i64> {
        pois.iter().filter_map(|p| p.id).map(i64::from).collect()
    }

    #[test]
    fn stale_pois_first_then_by_distance() {
        let pois = vec![
            poi(1, 30.003, Some(1)),
            poi(2, 30.002, None),
            poi(3, 30.001, Some(20)),
            poi(4, 30.000, Some(2)),
        ];
        let reference = Location::try_new(30.0, 60.0).ok();
        let ordered = order_for_review(pois, reference, now());
        assert_eq!(vec![3, 2, 4, 1], ids(&ordered));
    }

    #[test]
    fn keep_at_most_fourteen() {
        let pois = (0..20).map(|i| poi(i, 30.0, None)).collect();
        assert_eq!(MAX_REVIEW_ITEMS, order_for_review(pois, None, now()).len());
    }

    #[test]
    fn offer_floors_only_if_there_are_several() {
        let mut a = poi(1, 30.0, None);
        let mut b = poi(2, 30.0, None);
        a.floor = Some("1".into());
        b.floor = Some("1".into());
        assert_eq!(None, floor_choices(&[a.clone(), b.clone()]));
        b.floor = None;
        assert_eq!(
            Some(vec![None, Some("1".to_string())]),
            floor_choices(&[a, b])
        );
    }

    #[test]
    fn floor_filter() {
        assert_eq!(None, FloorFilter::parse("*"));
        let without = FloorFilter::parse("-").unwrap();
        assert!(without.matches(None));
        assert!(!without.matches(Some("2")));
        assert!(FloorFilter::parse("2").unwrap().matches(Some("2")));
    }

    #[test]
    fn checklist_entry() {
        let mut p = Poi::build()
            .id(1)
            .name("Cafe")
            .keywords("cafe")
            .wifi(Some(true))
            .phones(vec!["+7 1"])
            .hours("Mo-Fr 09:00-18:30")
            .finish();
        p.updated = Some(now() - Duration::hours(49));
        let entry = ChecklistEntry::new(&p, now());
        assert_eq!(Some(true), entry.wifi);
        assert_eq!(None, entry.cards);
        assert_eq!(
            vec![
                MissingField::Links,
                MissingField::Address,
                MissingField::PhotoOut,
                MissingField::PhotoIn
            ],
            entry.missing
        );
        assert_eq!(Some("Mo-Fr 09-18:30"), entry.hours.as_deref());
        assert!(entry.reviewed);

        p.updated = Some(now() - Duration::hours(51));
        assert!(!ChecklistEntry::new(&p, now()).reviewed);
    }

    #[test]
    fn toggle_twice_restores_the_timestamp() {
        let before = Some(now() - Duration::days(30));
        let mut session = ReviewSession::new(&[poi(1, 30.0, None)], None, None);
        let id = PoiId::new(1);
        assert_eq!(Ok(Some(now())), session.toggle(id, before, now()));
        assert_eq!(Ok(before), session.toggle(id, Some(now()), now()));
        assert_eq!(
            Err(ReviewError::NoRecord(PoiId::new(2))),
            session.toggle(PoiId::new(2), None, now())
        );
    }
}
