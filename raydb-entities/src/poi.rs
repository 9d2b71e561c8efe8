use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::{geo::*, hours::*, id::*, links::*, time::*};

pub const TAG_BUILDING: &str = "building";
pub const TAG_ENTRANCE: &str = "entrance";

/// A boolean attribute that nobody has checked yet.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriState {
    #[default]
    Unknown,
    Yes,
    No,
}

impl TriState {
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl From<Option<bool>> for TriState {
    fn from(from: Option<bool>) -> Self {
        match from {
            None => Self::Unknown,
            Some(true) => Self::Yes,
            Some(false) => Self::No,
        }
    }
}

impl From<TriState> for Option<bool> {
    fn from(from: TriState) -> Self {
        match from {
            TriState::Unknown => None,
            TriState::Yes => Some(true),
            TriState::No => Some(false),
        }
    }
}

/// Persisted attributes of a POI, named like their storage columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, AsRefStr, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum PoiField {
    Name,
    Lon,
    Lat,
    Description,
    Keywords,
    PhotoOut,
    PhotoIn,
    Tag,
    Hours,
    Links,
    HasWifi,
    AcceptsCards,
    Phones,
    Comment,
    Address,
    House,
    Floor,
    NeedsCheck,
}

impl PoiField {
    /// Changes of these fields have to be propagated
    /// into the full-text index.
    pub const fn is_indexed(self) -> bool {
        matches!(self, Self::Name | Self::Keywords | Self::Tag)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: Option<PoiId>,
    pub key: Option<String>,
    pub name: String,
    pub location: Location,
    pub keywords: String,
    pub tag: Option<String>,
    pub description: Option<String>,
    pub comment: Option<String>,
    pub address_part: Option<String>,
    pub house: Option<String>,
    pub house_name: Option<String>,
    pub floor: Option<String>,
    pub phones: Vec<String>,
    pub links: Vec<Link>,
    pub has_wifi: TriState,
    pub accepts_cards: TriState,
    pub hours: Option<OpeningHours>,
    pub needs_check: bool,
    pub in_index: bool,
    pub delete_reason: Option<String>,
    pub photo_out: Option<String>,
    pub photo_in: Option<String>,
    pub created: Option<Timestamp>,
    pub updated: Option<Timestamp>,
}

impl Poi {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            id: None,
            key: None,
            name: name.into(),
            location,
            keywords: String::new(),
            tag: None,
            description: None,
            comment: None,
            address_part: None,
            house: None,
            house_name: None,
            floor: None,
            phones: vec![],
            links: vec![],
            has_wifi: TriState::Unknown,
            accepts_cards: TriState::Unknown,
            hours: None,
            needs_check: false,
            in_index: true,
            delete_reason: None,
            photo_out: None,
            photo_in: None,
            created: None,
            updated: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.delete_reason.is_some()
    }

    pub fn is_building(&self) -> bool {
        self.tag.as_deref() == Some(TAG_BUILDING)
    }

    pub fn is_entrance(&self) -> bool {
        self.tag.as_deref() == Some(TAG_ENTRANCE)
    }

    /// Buildings and entrances are reached through
    /// the address navigation, never by keyword search.
    pub fn is_address_infrastructure(&self) -> bool {
        self.is_building() || self.is_entrance()
    }

    pub fn is_searchable(&self) -> bool {
        self.in_index && !self.is_deleted() && !self.is_address_infrastructure()
    }

    /// The house label followed by the address details.
    pub fn address(&self) -> Option<String> {
        let parts: Vec<&str> = [self.house_name.as_deref(), self.address_part.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    pub fn keyword_list(&self) -> impl Iterator<Item = &str> {
        self.keywords.split_whitespace()
    }
}
