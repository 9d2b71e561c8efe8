use rand::{seq::SliceRandom, Rng};
use std::{
    cmp::Reverse,
    collections::{HashMap, HashSet},
};
use time::PrimitiveDateTime;

use crate::entities::*;

/// Star counts and the requesting user's own stars.
#[derive(Debug, Clone, Default)]
pub struct StarInfo {
    pub counts: HashMap<PoiId, usize>,
    pub starred_by_user: HashSet<PoiId>,
}

#[derive(Debug, Clone, Default)]
pub struct RankingContext {
    pub user_location: Option<Location>,
    pub stars: Option<StarInfo>,
    /// Local wall clock time for evaluating opening hours.
    pub now: Option<PrimitiveDateTime>,
}

pub fn popularity_bucket(stars: usize) -> u8 {
    match stars {
        0..=1 => 0,
        2..=4 => 1,
        5..=9 => 2,
        10..=19 => 3,
        20..=49 => 4,
        _ => 5,
    }
}

pub fn is_closed(poi: &Poi, now: PrimitiveDateTime) -> bool {
    poi.hours
        .as_ref()
        .and_then(|h| h.is_open(now))
        .map(|open| !open)
        .unwrap_or(false)
}

/// Orders search results for display.
///
/// Nearest first if the user location is known, otherwise a random
/// order that favors starred and popular POIs. POIs that are closed
/// right now always go last.
pub fn rank<R: Rng + ?Sized>(pois: &mut [Poi], ctx: &RankingContext, rng: &mut R) {
    if let Some(location) = ctx.user_location {
        pois.sort_by(|a, b| {
            let da = location.distance(&a.location).to_meters();
            let db = location.distance(&b.location).to_meters();
            da.total_cmp(&db)
        });
    } else {
        pois.shuffle(rng);
        if let Some(stars) = &ctx.stars {
            pois.sort_by_cached_key(|p| {
                let Some(id) = p.id else {
                    return Reverse((false, 0));
                };
                let count = stars.counts.get(&id).copied().unwrap_or(0);
                Reverse((stars.starred_by_user.contains(&id), popularity_bucket(count)))
            });
        }
    }
    if let Some(now) = ctx.now {
        sort_closed_last(pois, now);
    }
}

pub fn sort_closed_last(pois: &mut [Poi], now: PrimitiveDateTime) {
    pois.sort_by_key(|p| is_closed(p, now));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use raydb_entities::builders::*;
    use time::macros::datetime;

    const NOW: PrimitiveDateTime = datetime!(2024-03-04 12:00);

    fn poi(id: i64, name: &str) -> Poi {
        Poi::build().id(id).name(name).pos(30.0, 60.0).finish()
    }

    #[test]
    fn buckets() {
        let buckets: Vec<_> = [0, 1, 2, 4, 5, 9, 10, 19, 20, 49, 50, 1000]
            .into_iter()
            .map(popularity_bucket)
            .collect();
        assert_eq!(vec![0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5], buckets);
    }

    #[test]
    fn closed_pois_go_last() {
        let open = Poi::build().id(1).hours("Mo-Su 09:00-18:00").finish();
        let closed = Poi::build().id(2).hours("Mo-Su 20:00-22:00").finish();
        let no_hours = Poi::build().id(3).finish();
        let ctx = RankingContext {
            now: Some(NOW),
            ..Default::default()
        };
        let orders = [
            vec![open.clone(), closed.clone(), no_hours.clone()],
            vec![closed.clone(), open.clone(), no_hours.clone()],
            vec![closed.clone(), no_hours.clone(), open.clone()],
        ];
        for seed in 0..5 {
            for order in &orders {
                let mut pois = order.clone();
                rank(&mut pois, &ctx, &mut StdRng::seed_from_u64(seed));
                assert_eq!(Some(PoiId::new(2)), pois[2].id);
            }
        }
    }

    #[test]
    fn nearest_first_with_user_location() {
        let mut pois = vec![
            Poi::build().id(1).pos(30.010, 60.0).finish(),
            Poi::build().id(2).pos(30.001, 60.0).finish(),
            Poi::build().id(3).pos(30.005, 60.0).finish(),
        ];
        let ctx = RankingContext {
            user_location: Some(Location::try_new(30.0, 60.0).unwrap()),
            ..Default::default()
        };
        rank(&mut pois, &ctx, &mut StdRng::seed_from_u64(1));
        let ids: Vec<_> = pois.iter().filter_map(|p| p.id).map(i64::from).collect();
        assert_eq!(vec![2, 3, 1], ids);
    }

    #[test]
    fn starred_and_popular_first_without_location() {
        let mut stars = StarInfo::default();
        stars.counts.insert(PoiId::new(1), 60);
        stars.counts.insert(PoiId::new(2), 3);
        stars.starred_by_user.insert(PoiId::new(3));
        let ctx = RankingContext {
            stars: Some(stars),
            ..Default::default()
        };
        for seed in 0..5 {
            let mut pois = vec![poi(4, "d"), poi(2, "b"), poi(1, "a"), poi(3, "c")];
            rank(&mut pois, &ctx, &mut StdRng::seed_from_u64(seed));
            let ids: Vec<_> = pois.iter().filter_map(|p| p.id).map(i64::from).collect();
            assert_eq!(vec![3, 1, 2, 4], ids);
        }
    }
}
