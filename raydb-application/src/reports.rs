//! Data quality reports for maintainers.

use crate::*;
use std::{collections::HashSet, fmt, path::Path};

/// Lists with more entries are only counted when printed.
pub const MAX_LISTED: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingValues {
    pub field: &'static str,
    /// `name (house name)` of every affected POI.
    pub pois: Vec<String>,
}

impl fmt::Display for MissingValues {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Value for {} is missing in {} places.",
            self.field,
            self.pois.len()
        )?;
        if self.pois.len() <= MAX_LISTED {
            for name in &self.pois {
                writeln!(f, "- {name}")?;
            }
        }
        Ok(())
    }
}

fn label(poi: &Poi) -> String {
    match &poi.house_name {
        Some(house) => format!("{} ({})", poi.name, house),
        None => poi.name.clone(),
    }
}

/// Active POIs lacking house, keywords, links, tag, hours, or a
/// floor in houses where other POIs have one.
pub fn missing_values(connections: &sqlite::Connections) -> Result<Vec<MissingValues>> {
    let pois: Vec<_> = connections
        .shared()?
        .all_pois()?
        .into_iter()
        .filter(|p| !p.is_deleted() && !p.is_address_infrastructure())
        .collect();
    let checks: [(&'static str, fn(&Poi) -> bool); 5] = [
        ("house", |p| p.house.is_none()),
        ("keywords", |p| p.keywords.trim().is_empty()),
        ("links", |p| p.links.is_empty()),
        ("tag", |p| p.tag.is_none()),
        ("hours", |p| p.hours.is_none()),
    ];
    let mut report: Vec<_> = checks
        .iter()
        .map(|&(field, missing)| MissingValues {
            field,
            pois: pois.iter().filter(|p| missing(p)).map(label).collect(),
        })
        .collect();

    let houses_with_floors: HashSet<_> = pois
        .iter()
        .filter(|p| p.floor.is_some())
        .filter_map(|p| p.house.as_deref())
        .collect();
    report.push(MissingValues {
        field: "floor",
        pois: pois
            .iter()
            .filter(|p| p.floor.is_none())
            .filter(|p| {
                p.house
                    .as_deref()
                    .is_some_and(|h| houses_with_floors.contains(h))
            })
            .map(label)
            .collect(),
    });
    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildingNote {
    /// Two floors whose apartment numbers are implausibly far apart.
    WeirdSequence { key: String, from: u32, to: u32 },
    LastFloor {
        key: String,
        floor: usize,
        apartment: u32,
    },
    MissingPhoto(String),
    /// An address key without an outside photo.
    NoPhoto(String),
}

impl fmt::Display for BuildingNote {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::WeirdSequence { key, from, to } => {
                write!(f, "Weird apartment sequence in {key}: {from}, {to}.")
            }
            Self::LastFloor {
                key,
                floor,
                apartment,
            } => write!(f, "Entrance {key}: last floor {floor} apartment {apartment}"),
            Self::MissingPhoto(name) => write!(f, "Missing photo: {name}.jpg"),
            Self::NoPhoto(key) => write!(f, "No photo listed: {key}"),
        }
    }
}

/// Checks the floor lists of the address configuration.
pub fn check_apartments(config: &AddressConfig) -> Vec<BuildingNote> {
    let mut keys: Vec<_> = config.apartments.keys().collect();
    keys.sort();
    let mut notes = vec![];
    for key in keys {
        let ApartmentLayout::Floors(floors) = &config.apartments[key] else {
            continue;
        };
        for (i, pair) in floors.windows(2).enumerate() {
            let per_floor = i64::from(pair[1]) - i64::from(pair[0]) + 1;
            // The first floor often has fewer apartments
            if i > 0 && !(2..=10).contains(&per_floor) {
                notes.push(BuildingNote::WeirdSequence {
                    key: key.clone(),
                    from: pair[0],
                    to: pair[1],
                });
            }
        }
        if let Some(last) = floors.last() {
            notes.push(BuildingNote::LastFloor {
                key: key.clone(),
                floor: floors.len(),
                apartment: *last,
            });
        }
    }
    notes
}

/// Checks the outside photos of buildings and entrances.
pub fn check_building_photos(
    connections: &sqlite::Connections,
    config: &AddressConfig,
    photos_dir: &Path,
) -> Result<Vec<BuildingNote>> {
    let mut unlisted: HashSet<String> = config.apartments.keys().cloned().collect();
    for street in &config.streets {
        unlisted.extend(street.buildings.iter().map(|b| b.key.clone()));
    }
    let mut notes = vec![];
    for poi in connections.shared()?.all_pois()? {
        let (Some(key), Some(photo)) = (poi.key, poi.photo_out) else {
            continue;
        };
        if !photos_dir.join(format!("{photo}.jpg")).exists() {
            notes.push(BuildingNote::MissingPhoto(photo));
        }
        unlisted.remove(&key);
    }
    let mut unlisted: Vec<_> = unlisted.into_iter().collect();
    unlisted.sort();
    notes.extend(unlisted.into_iter().map(BuildingNote::NoPhoto));
    Ok(notes)
}

#[cfg(test)]
mod tests {
    use super::{super::tests::prelude::*, *};
    use raydb_entities::builders::*;
    use std::collections::HashMap;

    #[test]
    fn should_report_missing_values() {
        let fixture = BackendFixture::new();
        fixture.save_poi_as_moderator(Poi::build().key("m6").name("Main 6").tag(TAG_BUILDING).finish());
        fixture.save_poi_as_moderator(
            Poi::build()
                .name("Bakery")
                .keywords("bread")
                .house("m6")
                .floor("1")
                .tag("shop=bakery")
                .hours("24/7")
                .link("Site", "https://bakery.example")
                .finish(),
        );
        fixture.save_poi_as_moderator(Poi::build().name("Kiosk").house("m6").finish());
        fixture.save_poi_as_moderator(Poi::build().name("Stall").keywords("fruit").finish());

        let report = missing_values(&fixture.db_connections).unwrap();
        let fields: Vec<_> = report.iter().map(|r| r.field).collect();
        assert_eq!(vec!["house", "keywords", "links", "tag", "hours", "floor"], fields);
        assert_eq!(vec!["Stall"], report[0].pois);
        assert_eq!(vec!["Kiosk (Main 6)"], report[1].pois);
        assert_eq!(vec!["Kiosk (Main 6)", "Stall"], report[2].pois);
        assert_eq!(vec!["Kiosk (Main 6)"], report[5].pois);
        assert!(report[5].to_string().starts_with("Value for floor is missing in 1 places."));
    }

    #[test]
    fn should_flag_odd_floor_lists() {
        let config = AddressConfig {
            streets: vec![],
            apartments: HashMap::from([
                ("m6e1".to_string(), ApartmentLayout::Floors(vec![1, 3, 7, 11, 40])),
                ("m6".to_string(), ApartmentLayout::FirstApartment(1)),
            ]),
        };
        let notes = check_apartments(&config);
        assert_eq!(
            vec![
                BuildingNote::WeirdSequence {
                    key: "m6e1".into(),
                    from: 11,
                    to: 40
                },
                BuildingNote::LastFloor {
                    key: "m6e1".into(),
                    floor: 5,
                    apartment: 40
                },
            ],
            notes
        );
    }

    #[test]
    fn should_check_building_photos() {
        let fixture = BackendFixture::new();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("m6.jpg"), b"jpeg").unwrap();
        let mut house = Poi::build().key("m6").name("Main 6").tag(TAG_BUILDING).finish();
        house.photo_out = Some("m6".into());
        fixture.save_poi_as_moderator(house);
        let mut other = Poi::build().key("m8").name("Main 8").tag(TAG_BUILDING).finish();
        other.photo_out = Some("m8".into());
        fixture.save_poi_as_moderator(other);

        let config = AddressConfig {
            streets: vec![Street::build()
                .name("Main")
                .building("6", "m6")
                .building("8", "m8")
                .building("10", "m10")
                .finish()],
            apartments: HashMap::new(),
        };
        let notes = check_building_photos(&fixture.db_connections, &config, dir.path()).unwrap();
        assert_eq!(
            vec![
                BuildingNote::MissingPhoto("m8".into()),
                BuildingNote::NoPhoto("m10".into()),
            ],
            notes
        );
    }
}
