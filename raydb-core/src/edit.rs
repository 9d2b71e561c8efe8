//! The dialogue that creates or edits a single POI.
//!
//! Every step takes the current [`EditSession`] and an [`EditCommand`]
//! and returns the next session. A rejected command leaves the caller
//! with the previous session, so nothing has to be rolled back.

use std::fmt;

use strum::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

use crate::{entities::*, hours::parse_human, tag::is_valid_tag, text::Tokenizer};

pub const MIN_NAME_LEN: usize = 3;

/// Input that clears an optional attribute.
pub const CLEAR: &str = "-";

/// The attributes that can be edited from the confirmation card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum AttrKind {
    #[strum(serialize = "desc")]
    Description,
    Keywords,
    Tag,
    House,
    #[strum(serialize = "addr")]
    Address,
    Floor,
    Hours,
    #[strum(serialize = "loc")]
    Location,
    Phones,
    Wifi,
    Cards,
    Links,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Idle,
    Naming,
    LocationPending,
    KeywordsPending,
    Confirming,
    EditingAttribute(AttrKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoSlot {
    Outside,
    Inside,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    Text(String),
    /// A position shared through the messenger.
    Location(Location),
    Edit(AttrKind),
    /// One of the nearest buildings was picked.
    ChooseHouse { key: String, name: String },
    SetPhoto { slot: PhotoSlot, name: String },
    UnlinkPhoto { name: String },
    /// Leaves the attribute unchanged.
    CancelAttr,
    Cancel,
    Saved,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("The name must have at least {MIN_NAME_LEN} characters")]
    NameTooShort,
    #[error("Not a location: {0}")]
    InvalidLocation(String),
    #[error("No keywords given")]
    NoKeywords,
    #[error("A tag must look like key=value, not {0}")]
    InvalidTag(String),
    #[error(transparent)]
    InvalidHours(#[from] crate::hours::HoursError),
    #[error("Only http and https links are allowed: {0}")]
    InvalidUrl(String),
    #[error("Expected yes, no or {CLEAR}, got {0}")]
    InvalidChoice(String),
    #[error("The command does not fit the current step")]
    Unexpected,
}

/// Vocabulary needed by some of the steps.
#[derive(Debug, Clone, Copy)]
pub struct EditContext<'a> {
    pub tokenizer: &'a Tokenizer,
    pub default_link_title: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub state: EditState,
    pub poi: Poi,
}

impl EditSession {
    /// Starts the dialogue for a new POI.
    pub fn create() -> Self {
        Self {
            state: EditState::Naming,
            poi: Poi::new("", Location { lon: 0.0, lat: 0.0 }),
        }
    }

    /// Starts editing a loaded POI.
    pub fn edit(poi: Poi) -> Self {
        Self {
            state: EditState::Confirming,
            poi,
        }
    }

    pub fn is_new(&self) -> bool {
        !self.poi.is_persisted()
    }

    pub fn apply(self, cmd: EditCommand, ctx: &EditContext) -> Result<Self, EditError> {
        let Self { state, mut poi } = self;
        let next = match (state, cmd) {
            (_, EditCommand::Cancel | EditCommand::Saved) => EditState::Idle,
            (EditState::Naming, EditCommand::Text(text)) => {
                let name = text.trim();
                if name.chars().count() < MIN_NAME_LEN {
                    return Err(EditError::NameTooShort);
                }
                poi.name = name.to_string();
                EditState::LocationPending
            }
            (EditState::LocationPending, cmd) => {
                poi.location = location_from(cmd)?;
                EditState::KeywordsPending
            }
            (EditState::KeywordsPending, EditCommand::Text(text)) => {
                let keywords = ctx.tokenizer.split_tokens(&text);
                if keywords.is_empty() {
                    return Err(EditError::NoKeywords);
                }
                poi.keywords = keywords.join(" ");
                EditState::Confirming
            }
            (EditState::Confirming, EditCommand::Edit(attr)) => EditState::EditingAttribute(attr),
            (EditState::Confirming, EditCommand::SetPhoto { slot, name }) => {
                match slot {
                    PhotoSlot::Outside => poi.photo_out = Some(name),
                    PhotoSlot::Inside => poi.photo_in = Some(name),
                }
                EditState::Confirming
            }
            (EditState::Confirming, EditCommand::UnlinkPhoto { name }) => {
                if poi.photo_out.as_deref() == Some(&name) {
                    poi.photo_out = None;
                } else if poi.photo_in.as_deref() == Some(&name) {
                    poi.photo_in = None;
                }
                EditState::Confirming
            }
            (EditState::EditingAttribute(_), EditCommand::CancelAttr) => EditState::Confirming,
            (EditState::EditingAttribute(AttrKind::House), EditCommand::ChooseHouse { key, name }) => {
                poi.house = Some(key);
                poi.house_name = Some(name);
                EditState::Confirming
            }
            (EditState::EditingAttribute(AttrKind::Location), cmd) => {
                poi.location = location_from(cmd)?;
                EditState::Confirming
            }
            (EditState::EditingAttribute(attr), EditCommand::Text(text)) => {
                store_attr(&mut poi, attr, text.trim(), ctx)?;
                EditState::Confirming
            }
            _ => return Err(EditError::Unexpected),
        };
        Ok(Self { state: next, poi })
    }
}

fn location_from(cmd: EditCommand) -> Result<Location, EditError> {
    match cmd {
        EditCommand::Location(location) => Ok(location),
        EditCommand::Text(text) => text
            .parse()
            .map_err(|_| EditError::InvalidLocation(text.trim().to_string())),
        _ => Err(EditError::Unexpected),
    }
}

fn optional(value: &str) -> Option<String> {
    if value == CLEAR || value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn store_attr(
    poi: &mut Poi,
    attr: AttrKind,
    value: &str,
    ctx: &EditContext,
) -> Result<(), EditError> {
    match attr {
        AttrKind::Description => poi.description = optional(value),
        AttrKind::Comment => poi.comment = optional(value),
        AttrKind::Address => poi.address_part = optional(value),
        AttrKind::Floor => poi.floor = optional(value),
        AttrKind::Tag => poi.tag = parse_tag(value)?,
        AttrKind::Keywords => {
            let new_keywords = ctx.tokenizer.split_tokens(value);
            if !new_keywords.is_empty() {
                let mut keywords: Vec<String> =
                    poi.keyword_list().map(ToString::to_string).collect();
                keywords.extend(new_keywords);
                poi.keywords = keywords.join(" ");
            }
        }
        AttrKind::Hours => {
            poi.hours = match optional(value) {
                Some(value) => Some(OpeningHours::parse(parse_human(&value)?)),
                None => None,
            }
        }
        AttrKind::Phones => {
            poi.phones = match optional(value) {
                Some(value) => value
                    .split(';')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(ToString::to_string)
                    .collect(),
                None => vec![],
            }
        }
        AttrKind::Links => edit_links(&mut poi.links, value, ctx.default_link_title)?,
        AttrKind::Wifi => poi.has_wifi = parse_choice(value)?,
        AttrKind::Cards => poi.accepts_cards = parse_choice(value)?,
        AttrKind::House | AttrKind::Location => return Err(EditError::Unexpected),
    }
    Ok(())
}

fn parse_tag(value: &str) -> Result<Option<String>, EditError> {
    if value == CLEAR {
        return Ok(None);
    }
    let tag = value
        .split('=')
        .map(|p| p.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("=");
    if !is_valid_tag(&tag) {
        return Err(EditError::InvalidTag(value.to_string()));
    }
    Ok(Some(tag))
}

fn parse_choice(value: &str) -> Result<TriState, EditError> {
    match value.to_lowercase().as_str() {
        "yes" | "да" => Ok(TriState::Yes),
        "no" | "нет" => Ok(TriState::No),
        CLEAR => Ok(TriState::Unknown),
        _ => Err(EditError::InvalidChoice(value.to_string())),
    }
}

fn is_web_url(s: &str) -> bool {
    url::Url::parse(s)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// `title url` adds or replaces the link with that title, a bare url
/// gets the default title, a bare title removes the link.
fn edit_links(links: &mut Vec<Link>, value: &str, default_title: &str) -> Result<(), EditError> {
    if value.is_empty() {
        return Ok(());
    }
    let (title, url) = match value.split_once(char::is_whitespace) {
        Some((title, url)) => (title.to_lowercase(), Some(url.trim())),
        None if is_web_url(value) => (default_title.to_string(), Some(value)),
        None => (value.to_lowercase(), None),
    };
    match url {
        None => links.retain(|l| l.title != title),
        Some(url) => {
            if !is_web_url(url) {
                return Err(EditError::InvalidUrl(url.to_string()));
            }
            match links.iter_mut().find(|l| l.title == title) {
                Some(link) => link.url = url.to_string(),
                None => links.push(Link::new(title, url)),
            }
        }
    }
    Ok(())
}

/// An attribute value as shown on the confirmation card.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Bool(bool),
    Number(i64),
    Hours(OpeningHours),
    Location(Location),
    Links(Vec<Link>),
    Empty,
}

impl AttrValue {
    pub fn of(poi: &Poi, attr: AttrKind) -> Self {
        let text = |s: Option<&String>| match s {
            Some(s) if !s.is_empty() => Self::Text(s.clone()),
            _ => Self::Empty,
        };
        let tri = |t: TriState| match Option::<bool>::from(t) {
            Some(b) => Self::Bool(b),
            None => Self::Empty,
        };
        match attr {
            AttrKind::Description => text(poi.description.as_ref()),
            AttrKind::Comment => text(poi.comment.as_ref()),
            AttrKind::Address => text(poi.address_part.as_ref()),
            AttrKind::Keywords => text(Some(&poi.keywords)),
            AttrKind::Tag => text(poi.tag.as_ref()),
            AttrKind::House => text(poi.house_name.as_ref().or(poi.house.as_ref())),
            AttrKind::Floor => match poi.floor.as_deref().map(str::parse::<i64>) {
                Some(Ok(n)) => Self::Number(n),
                _ => text(poi.floor.as_ref()),
            },
            AttrKind::Hours => match &poi.hours {
                Some(hours) => Self::Hours(hours.clone()),
                None => Self::Empty,
            },
            AttrKind::Location => Self::Location(poi.location),
            AttrKind::Phones => text(Some(&poi.phones.join("; "))),
            AttrKind::Wifi => tri(poi.has_wifi),
            AttrKind::Cards => tri(poi.accepts_cards),
            AttrKind::Links if poi.links.is_empty() => Self::Empty,
            AttrKind::Links => Self::Links(poi.links.clone()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(true) => f.write_str("yes"),
            Self::Bool(false) => f.write_str("no"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Hours(hours) if hours.is_24_7() => f.write_str("24/7"),
            Self::Hours(hours) => f.write_str(hours.as_str()),
            Self::Location(loc) => write!(f, "{loc}"),
            Self::Links(links) => {
                for (i, link) in links.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} ({})", link.title, link.url)?;
                }
                Ok(())
            }
            Self::Empty => f.write_str("unknown"),
        }
    }
}
