//! Resolution of free text like `main 6 25` into a street,
//! a building, an entrance and a floor.

use crate::{entities::*, text::has_keyword};

/// The entrance that serves an apartment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntranceMatch {
    pub key: String,
    /// Only known if the entrance has a per-floor layout.
    pub floor: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressMatch {
    /// Only the street was named.
    Street(Street),
    NoSuchHouse { street: String, house: String },
    /// The building without an apartment.
    Building { key: String },
    Apartment {
        building: String,
        apartment: u32,
        /// `None` if no entrance serves this apartment number.
        entrance: Option<EntranceMatch>,
    },
    InvalidApartment { building: String, token: String },
}

/// Where a follow-up message continues the address dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressContext {
    /// Waiting for a house number on this street.
    Street(String),
    /// Waiting for an apartment number in this building.
    House(String),
}

impl AddressMatch {
    pub fn next_context(&self) -> Option<AddressContext> {
        match self {
            Self::Street(street) => Some(AddressContext::Street(street.name.clone())),
            Self::NoSuchHouse { street, .. } => Some(AddressContext::Street(street.clone())),
            Self::Building { key } => Some(AddressContext::House(key.clone())),
            Self::Apartment { building, .. } | Self::InvalidApartment { building, .. } => {
                Some(AddressContext::House(building.clone()))
            }
        }
    }

    /// Key of the POI whose card answers the query.
    pub fn card_key(&self) -> Option<&str> {
        match self {
            Self::Street(_) | Self::NoSuchHouse { .. } => None,
            Self::Building { key } => Some(key),
            Self::InvalidApartment { building, .. } => Some(building),
            Self::Apartment {
                building, entrance, ..
            } => Some(entrance.as_ref().map(|e| e.key.as_str()).unwrap_or(building)),
        }
    }
}

/// Picks the entrance with the greatest first apartment number
/// that does not exceed `apartment`.
///
/// Candidates without a configured layout are ignored. On equal
/// thresholds the first candidate wins.
pub fn resolve_entrance<'a, I>(apartment: u32, candidates: I) -> Option<EntranceMatch>
where
    I: IntoIterator<Item = (&'a str, &'a ApartmentLayout)>,
{
    let mut best: Option<(u32, EntranceMatch)> = None;
    for (key, layout) in candidates {
        let Some(first) = layout.first_apartment() else {
            continue;
        };
        if apartment < first {
            continue;
        }
        if best.as_ref().is_some_and(|(best_first, _)| *best_first >= first) {
            continue;
        }
        let floor = match layout {
            ApartmentLayout::FirstApartment(_) => None,
            ApartmentLayout::Floors(floors) => {
                Some(floors.iter().filter(|a| **a <= apartment).count())
            }
        };
        best = Some((
            first,
            EntranceMatch {
                key: key.to_string(),
                floor,
            },
        ));
    }
    best.map(|(_, m)| m)
}

#[derive(Debug, Clone, Copy)]
pub struct AddressResolver<'a> {
    config: &'a AddressConfig,
}

impl<'a> AddressResolver<'a> {
    pub fn new(config: &'a AddressConfig) -> Self {
        Self { config }
    }

    /// Tries to interpret the tokens of a new query as an address.
    ///
    /// `entrances_of` lists the entrance keys of a building.
    pub fn resolve<F, E>(&self, tokens: &[String], entrances_of: F) -> Result<Option<AddressMatch>, E>
    where
        F: Fn(&str) -> Result<Vec<String>, E>,
    {
        if tokens.is_empty() {
            return Ok(None);
        }
        for street in &self.config.streets {
            if has_keyword(&tokens[..1], &street.keywords, None) {
                if tokens.len() == 1 {
                    return Ok(Some(AddressMatch::Street(street.clone())));
                }
                return self
                    .resolve_building(street, &tokens[1..], entrances_of)
                    .map(Some);
            }
            // Compound keywords like `main6`
            for building in &street.buildings {
                if has_keyword(tokens, &street.keywords, Some(&building.house)) {
                    let mut rest = vec![building.house.clone()];
                    rest.extend_from_slice(&tokens[1..]);
                    return self.resolve_building(street, &rest, entrances_of).map(Some);
                }
            }
        }
        Ok(None)
    }

    /// A follow-up after a street has been selected. Returns `None`
    /// if the first token is not a house on that street.
    pub fn continue_street<F, E>(
        &self,
        street_name: &str,
        tokens: &[String],
        entrances_of: F,
    ) -> Result<Option<AddressMatch>, E>
    where
        F: Fn(&str) -> Result<Vec<String>, E>,
    {
        let Some(street) = self.config.streets.iter().find(|s| s.name == street_name) else {
            return Ok(None);
        };
        match tokens.first() {
            Some(house) if street.building(house).is_some() => self
                .resolve_building(street, tokens, entrances_of)
                .map(Some),
            _ => Ok(None),
        }
    }

    /// A follow-up after a building has been selected. Returns `None`
    /// if the text is not an apartment number.
    pub fn continue_house<F, E>(
        &self,
        building: &str,
        text: &str,
        entrances_of: F,
    ) -> Result<Option<AddressMatch>, E>
    where
        F: Fn(&str) -> Result<Vec<String>, E>,
    {
        match text.trim().parse::<u32>() {
            Ok(apartment) => self
                .resolve_apartment(building, apartment, entrances_of)
                .map(Some),
            Err(_) => Ok(None),
        }
    }

    fn resolve_building<F, E>(
        &self,
        street: &Street,
        tokens: &[String],
        entrances_of: F,
    ) -> Result<AddressMatch, E>
    where
        F: Fn(&str) -> Result<Vec<String>, E>,
    {
        let Some(building) = tokens.first().and_then(|house| street.building(house)) else {
            return Ok(AddressMatch::NoSuchHouse {
                street: street.name.clone(),
                house: tokens.last().cloned().unwrap_or_default(),
            });
        };
        let Some(apartment) = tokens.get(1) else {
            return Ok(AddressMatch::Building {
                key: building.key.clone(),
            });
        };
        match apartment.parse::<u32>() {
            Ok(apartment) => self.resolve_apartment(&building.key, apartment, entrances_of),
            Err(_) => Ok(AddressMatch::InvalidApartment {
                building: building.key.clone(),
                token: apartment.clone(),
            }),
        }
    }

    pub fn resolve_apartment<F, E>(
        &self,
        building: &str,
        apartment: u32,
        entrances_of: F,
    ) -> Result<AddressMatch, E>
    where
        F: Fn(&str) -> Result<Vec<String>, E>,
    {
        let mut keys = vec![building.to_string()];
        keys.extend(entrances_of(building)?);
        let candidates = keys.iter().filter_map(|key| {
            self.config
                .apartments
                .get(key)
                .map(|layout| (key.as_str(), layout))
        });
        Ok(AddressMatch::Apartment {
            building: building.to_string(),
            apartment,
            entrance: resolve_entrance(apartment, candidates),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raydb_entities::builders::*;
    use std::{collections::HashMap, convert::Infallible};

    fn layouts(entries: Vec<(&str, ApartmentLayout)>) -> HashMap<String, ApartmentLayout> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    fn config() -> AddressConfig {
        AddressConfig {
            streets: vec![
                Street::build()
                    .name("Main street")
                    .keyword("main")
                    .keyword("mainstr*")
                    .building("6", "b6")
                    .building("8", "b8")
                    .finish(),
                Street::build()
                    .name("Park lane")
                    .keyword("park")
                    .building("1", "p1")
                    .finish(),
            ],
            apartments: layouts(vec![
                ("b6", ApartmentLayout::FirstApartment(1)),
                ("b6e2", ApartmentLayout::FirstApartment(20)),
                ("b6e3", ApartmentLayout::FirstApartment(45)),
                ("b8e1", ApartmentLayout::Floors(vec![1, 5, 12])),
            ]),
        }
    }

    fn entrances(building: &str) -> Result<Vec<String>, Infallible> {
        Ok(match building {
            "b6" => vec!["b6e2".into(), "b6e3".into()],
            "b8" => vec!["b8e1".into()],
            _ => vec![],
        })
    }

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(ToString::to_string).collect()
    }

    fn resolve(s: &str) -> Option<AddressMatch> {
        let config = config();
        AddressResolver::new(&config)
            .resolve(&tokens(s), entrances)
            .unwrap()
    }

    #[test]
    fn greatest_eligible_threshold_wins() {
        let a = ApartmentLayout::FirstApartment(1);
        let b = ApartmentLayout::FirstApartment(20);
        let c = ApartmentLayout::FirstApartment(45);
        let candidates = vec![("A", &a), ("C", &c), ("B", &b)];
        let m = resolve_entrance(30, candidates.clone()).unwrap();
        assert_eq!("B", m.key);
        assert_eq!(None, m.floor);
        assert_eq!("C", resolve_entrance(45, candidates.clone()).unwrap().key);
        assert_eq!("A", resolve_entrance(1, candidates.clone()).unwrap().key);
        assert_eq!(None, resolve_entrance(0, candidates));
    }

    #[test]
    fn floor_from_cumulative_list() {
        let a = ApartmentLayout::Floors(vec![1, 5, 12]);
        let m = resolve_entrance(7, vec![("A", &a)]).unwrap();
        assert_eq!(Some(2), m.floor);
        assert_eq!(Some(1), resolve_entrance(1, vec![("A", &a)]).unwrap().floor);
        assert_eq!(Some(3), resolve_entrance(99, vec![("A", &a)]).unwrap().floor);
    }

    #[test]
    fn mixed_layouts() {
        let a = ApartmentLayout::FirstApartment(1);
        let b = ApartmentLayout::Floors(vec![30, 34, 38]);
        let m = resolve_entrance(35, vec![("A", &a), ("B", &b)]).unwrap();
        assert_eq!(EntranceMatch { key: "B".into(), floor: Some(2) }, m);
        let m = resolve_entrance(29, vec![("A", &a), ("B", &b)]).unwrap();
        assert_eq!(EntranceMatch { key: "A".into(), floor: None }, m);
    }

    #[test]
    fn equal_thresholds_keep_the_first_candidate() {
        let a = ApartmentLayout::FirstApartment(10);
        let b = ApartmentLayout::FirstApartment(10);
        assert_eq!("A", resolve_entrance(11, vec![("A", &a), ("B", &b)]).unwrap().key);
    }

    #[test]
    fn street_only() {
        match resolve("main").unwrap() {
            AddressMatch::Street(street) => assert_eq!(2, street.buildings.len()),
            m => panic!("unexpected {m:?}"),
        }
        assert!(matches!(resolve("mainstreet"), Some(AddressMatch::Street(_))));
        assert_eq!(None, resolve("bakery"));
    }

    #[test]
    fn building_and_apartment() {
        assert_eq!(
            Some(AddressMatch::Building { key: "b6".into() }),
            resolve("main 6")
        );
        let m = resolve("main 6 30").unwrap();
        assert_eq!(Some("b6e2"), m.card_key());
        assert_eq!(Some(AddressContext::House("b6".into())), m.next_context());
    }

    #[test]
    fn compound_house_keyword() {
        assert_eq!(
            Some(AddressMatch::Apartment {
                building: "b8".into(),
                apartment: 7,
                entrance: Some(EntranceMatch {
                    key: "b8e1".into(),
                    floor: Some(2)
                }),
            }),
            resolve("main8 7")
        );
        assert_eq!(
            Some(AddressMatch::Building { key: "p1".into() }),
            resolve("park1")
        );
    }

    #[test]
    fn unknown_house() {
        let m = resolve("main 7").unwrap();
        assert_eq!(
            AddressMatch::NoSuchHouse {
                street: "Main street".into(),
                house: "7".into()
            },
            m
        );
        assert_eq!(Some(AddressContext::Street("Main street".into())), m.next_context());
        assert_eq!(None, m.card_key());
    }

    #[test]
    fn apartment_must_be_a_number() {
        let m = resolve("main 6 x1").unwrap();
        assert_eq!(
            AddressMatch::InvalidApartment {
                building: "b6".into(),
                token: "x1".into()
            },
            m
        );
        assert_eq!(Some("b6"), m.card_key());
    }

    #[test]
    fn no_eligible_entrance_falls_back_to_the_building() {
        let m = resolve("main 8 0").unwrap();
        assert_eq!(Some("b8"), m.card_key());
    }

    #[test]
    fn follow_ups() {
        let config = config();
        let resolver = AddressResolver::new(&config);
        assert_eq!(
            Some(AddressMatch::Building { key: "b8".into() }),
            resolver
                .continue_street("Main street", &tokens("8"), entrances)
                .unwrap()
        );
        assert_eq!(
            None,
            resolver
                .continue_street("Main street", &tokens("cafe"), entrances)
                .unwrap()
        );
        let m = resolver.continue_house("b6", " 50 ", entrances).unwrap();
        assert_eq!(Some("b6e3"), m.as_ref().and_then(|m| m.card_key()));
        assert_eq!(None, resolver.continue_house("b6", "cafe", entrances).unwrap());
    }
}
