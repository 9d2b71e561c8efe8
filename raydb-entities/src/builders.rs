pub trait Builder {
    type Build;
    fn build() -> Self::Build;
}

pub use self::{poi_builder::*, street_builder::*};

pub mod poi_builder {

    use super::*;
    use crate::{geo::*, hours::*, id::*, links::*, poi::*};

    #[derive(Debug)]
    pub struct PoiBuild {
        poi: Poi,
    }

    impl PoiBuild {
        pub fn id(mut self, id: i64) -> Self {
            self.poi.id = Some(PoiId::new(id));
            self
        }
        pub fn key(mut self, key: &str) -> Self {
            self.poi.key = Some(key.into());
            self
        }
        pub fn name(mut self, name: &str) -> Self {
            self.poi.name = name.into();
            self
        }
        pub fn pos(mut self, lon: f64, lat: f64) -> Self {
            self.poi.location = Location::try_new(lon, lat).unwrap();
            self
        }
        pub fn keywords(mut self, keywords: &str) -> Self {
            self.poi.keywords = keywords.into();
            self
        }
        pub fn tag(mut self, tag: &str) -> Self {
            self.poi.tag = Some(tag.into());
            self
        }
        pub fn house(mut self, house: &str) -> Self {
            self.poi.house = Some(house.into());
            self
        }
        pub fn floor(mut self, floor: &str) -> Self {
            self.poi.floor = Some(floor.into());
            self
        }
        pub fn comment(mut self, comment: &str) -> Self {
            self.poi.comment = Some(comment.into());
            self
        }
        pub fn hours(mut self, hours: &str) -> Self {
            self.poi.hours = Some(OpeningHours::parse(hours));
            self
        }
        pub fn phones(mut self, phones: Vec<&str>) -> Self {
            self.poi.phones = phones.into_iter().map(Into::into).collect();
            self
        }
        pub fn link(mut self, title: &str, url: &str) -> Self {
            self.poi.links.push(Link::new(title, url));
            self
        }
        pub fn wifi(mut self, wifi: Option<bool>) -> Self {
            self.poi.has_wifi = wifi.into();
            self
        }
        pub fn needs_check(mut self, needs_check: bool) -> Self {
            self.poi.needs_check = needs_check;
            self
        }
        pub fn deleted(mut self, reason: &str) -> Self {
            self.poi.delete_reason = Some(reason.into());
            self
        }
        pub fn finish(self) -> Poi {
            self.poi
        }
    }

    impl Builder for Poi {
        type Build = PoiBuild;
        fn build() -> PoiBuild {
            PoiBuild {
                poi: Poi::new("", Location { lon: 0.0, lat: 0.0 }),
            }
        }
    }
}

pub mod street_builder {

    use super::*;
    use crate::address::*;

    #[derive(Debug)]
    pub struct StreetBuild {
        street: Street,
    }

    impl StreetBuild {
        pub fn name(mut self, name: &str) -> Self {
            self.street.name = name.into();
            self
        }
        pub fn keyword(mut self, keyword: &str) -> Self {
            self.street.keywords.push(keyword.into());
            self
        }
        pub fn building(mut self, house: &str, key: &str) -> Self {
            self.street.buildings.push(Building {
                house: house.into(),
                key: key.into(),
            });
            self
        }
        pub fn finish(self) -> Street {
            self.street
        }
    }

    impl Builder for Street {
        type Build = StreetBuild;
        fn build() -> Self::Build {
            StreetBuild {
                street: Street {
                    name: String::new(),
                    keywords: vec![],
                    buildings: vec![],
                },
            }
        }
    }

    #[test]
    fn lookup_building_by_house_token() {
        let street = Street::build()
            .name("Main")
            .keyword("main")
            .building("6", "b6")
            .building("6a", "b6a")
            .finish();
        assert_eq!("b6a", street.building("6a").unwrap().key);
        assert!(street.building("7").is_none());
    }
}
