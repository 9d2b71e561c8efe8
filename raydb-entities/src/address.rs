use std::collections::HashMap;

/// Apartment numbering of a building or one of its entrances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApartmentLayout {
    /// The first apartment number served, floors are unknown.
    FirstApartment(u32),
    /// The first apartment number on each floor, in ascending order.
    Floors(Vec<u32>),
}

impl ApartmentLayout {
    pub fn first_apartment(&self) -> Option<u32> {
        match self {
            Self::FirstApartment(first) => Some(*first),
            Self::Floors(floors) => floors.first().copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Building {
    /// The house number token, e.g. `6` or `6a`.
    pub house: String,
    /// Key of the building POI.
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Street {
    pub name: String,
    /// Normalized tokens, a trailing `*` matches any suffix.
    pub keywords: Vec<String>,
    /// In the configured order.
    pub buildings: Vec<Building>,
}

impl Street {
    pub fn building(&self, house: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.house == house)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressConfig {
    pub streets: Vec<Street>,
    /// Keyed by building or entrance key.
    pub apartments: HashMap<String, ApartmentLayout>,
}
