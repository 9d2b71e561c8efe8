use super::prelude::*;
use crate::{
    authorization::authorize_moderator,
    review::{
        floor_choices, order_for_review, ChecklistEntry, FloorFilter, ReviewSession,
        AROUND_COUNT, MAX_REVIEW_ITEMS,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum ReviewStart {
    Ready {
        session: ReviewSession,
        pois: Vec<Poi>,
    },
    /// The building is too large to guess where the moderator stands.
    NeedsLocation,
}

/// Floors to choose from before a review of a building starts.
pub fn review_floor_options<R: PoiRepo>(
    repo: &R,
    user: &UserInfo,
    house: &str,
) -> Result<Option<Vec<Option<String>>>> {
    authorize_moderator(user)?;
    Ok(floor_choices(&repo.get_poi_by_house(house, None)?))
}

pub fn start_review_by_house<R: PoiRepo>(
    repo: &R,
    user: &UserInfo,
    house: &str,
    floor: Option<FloorFilter>,
    now: Timestamp,
) -> Result<ReviewStart> {
    authorize_moderator(user)?;
    let pois = repo.get_poi_by_house(house, floor.as_ref())?;
    let reference = user.location(now).or_else(|| {
        if pois.len() <= MAX_REVIEW_ITEMS {
            pois.first().map(|p| p.location)
        } else {
            None
        }
    });
    if reference.is_none() && !pois.is_empty() {
        return Ok(ReviewStart::NeedsLocation);
    }
    let pois = order_for_review(pois, reference, now);
    let session = ReviewSession::new(&pois, Some(house.to_string()), floor);
    Ok(ReviewStart::Ready { session, pois })
}

pub fn start_review_around<R: PoiRepo>(
    repo: &R,
    user: &UserInfo,
    location: Location,
    floor: Option<FloorFilter>,
    now: Timestamp,
) -> Result<ReviewStart> {
    authorize_moderator(user)?;
    let pois = repo.get_poi_around(location, AROUND_COUNT, floor.as_ref())?;
    let pois = order_for_review(pois, Some(location), now);
    let session = ReviewSession::new(&pois, None, floor);
    Ok(ReviewStart::Ready { session, pois })
}

/// Marks a POI as reviewed, or takes the mark back.
pub fn toggle_review<R: PoiRepo>(
    repo: &R,
    user: &UserInfo,
    session: &mut ReviewSession,
    id: PoiId,
    now: Timestamp,
) -> Result<Option<Timestamp>> {
    authorize_moderator(user)?;
    let current = repo.get_poi_by_id(id)?.updated;
    let updated = session.toggle(id, current, now)?;
    repo.set_poi_updated(id, updated)?;
    Ok(updated)
}

pub fn review_checklist<R: PoiRepo>(
    repo: &R,
    session: &ReviewSession,
    now: Timestamp,
) -> Result<Vec<ChecklistEntry>> {
    Ok(repo
        .get_poi_by_ids(&session.poi_ids())?
        .iter()
        .map(|poi| ChecklistEntry::new(poi, now))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{
        super::tests::{moderator, now, visitor, MockDb},
        *,
    };
    use raydb_entities::builders::*;
    use time::Duration;

    fn house_with(count: usize) -> MockDb {
        let db = MockDb::default();
        for i in 0..count {
            let floor = if i % 2 == 0 { "1" } else { "2" };
            let mut poi = Poi::build()
                .id(i as i64 + 1)
                .name(&format!("Shop {i}"))
                .house("m6")
                .floor(floor)
                .pos(30.0 + i as f64 * 0.0001, 60.0)
                .finish();
            poi.updated = Some(now() - Duration::hours(100));
            db.pois.borrow_mut().push(poi);
        }
        db
    }

    fn ids(start: &ReviewStart) -> Vec<i64> {
        match start {
            ReviewStart::Ready { pois, .. } => pois.iter().filter_map(|p| p.id).map(i64::from).collect(),
            ReviewStart::NeedsLocation => vec![],
        }
    }

    #[test]
    fn should_start_small_house_from_first_poi() {
        let db = house_with(4);
        let start = start_review_by_house(&db, &moderator(1), "m6", None, now()).unwrap();
        assert_eq!(vec![1, 2, 3, 4], ids(&start));
    }

    #[test]
    fn should_ask_for_location_in_large_houses() {
        let db = house_with(20);
        let user = moderator(1);
        assert_eq!(
            ReviewStart::NeedsLocation,
            start_review_by_house(&db, &user, "m6", None, now()).unwrap()
        );
        let mut user = user;
        user.set_location(Location::try_new(30.002, 60.0).unwrap(), now());
        let start = start_review_by_house(&db, &user, "m6", None, now()).unwrap();
        assert_eq!(MAX_REVIEW_ITEMS, ids(&start).len());
        assert_eq!(20, ids(&start)[0]);
    }

    #[test]
    fn should_filter_by_floor() {
        let db = house_with(6);
        assert_eq!(
            Some(vec![Some("1".to_string()), Some("2".to_string())]),
            review_floor_options(&db, &moderator(1), "m6").unwrap()
        );
        let floor = FloorFilter::parse("2");
        let start = start_review_by_house(&db, &moderator(1), "m6", floor, now()).unwrap();
        assert_eq!(vec![2, 4, 6], ids(&start));
    }

    #[test]
    fn should_toggle_updated_timestamp() {
        let db = house_with(3);
        let user = moderator(1);
        let before = db.poi(PoiId::new(2)).updated;
        let ReviewStart::Ready { mut session, .. } =
            start_review_by_house(&db, &user, "m6", None, now()).unwrap()
        else {
            panic!("review did not start");
        };
        let id = PoiId::new(2);
        assert_eq!(Some(now()), toggle_review(&db, &user, &mut session, id, now()).unwrap());
        let checklist = review_checklist(&db, &session, now()).unwrap();
        assert!(checklist.iter().find(|e| e.poi_id == Some(id)).unwrap().reviewed);
        assert_eq!(before, toggle_review(&db, &user, &mut session, id, now()).unwrap());
        assert_eq!(before, db.poi(id).updated);
        assert!(db.audit.borrow().is_empty());
    }

    #[test]
    fn should_review_around_location() {
        let db = house_with(3);
        let loc = Location::try_new(30.0002, 60.0).unwrap();
        let start = start_review_around(&db, &moderator(1), loc, None, now()).unwrap();
        assert_eq!(3, ids(&start)[0]);
        assert!(matches!(
            start_review_around(&db, &visitor(2), loc, None, now()),
            Err(Error::Forbidden)
        ));
    }
}
