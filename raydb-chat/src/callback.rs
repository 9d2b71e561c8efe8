//! Payloads of the interactive buttons.
//!
//! Everything fits into the 64 bytes a button may carry, ids are
//! written in decimal and attribute names in their short form.

use std::{fmt, str::FromStr};

use raydb_application::prelude::{POI_CALLBACK_PREFIX, QUEUE_CALLBACK};
use raydb_core::{
    edit::AttrKind, entities::*, gateways::messenger::Button, pagination::ListCallback,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Poi(PoiId),
    Location(PoiId),
    Star(PoiId),
    List(ListCallback),
    EditPoi(PoiId),
    EditAttr(AttrKind),
    ChooseHouse(String),
    KeepAttr,
    Save,
    Cancel,
    /// Starts the dialogue for a new POI.
    New,
    /// Asks for a message to the moderators.
    Report,
    Queue,
    ApplyQueue(QueueId),
    DismissQueue(QueueId),
    Validate(PoiId),
    Delete(PoiId),
    Restore(PoiId),
    ReviewFloor { house: String, floor: String },
    ToggleReview(PoiId),
}

fn id<T: FromStr>(s: &str) -> Option<T> {
    s.parse().ok()
}

impl Callback {
    pub fn decode(data: &str) -> Option<Self> {
        if data == QUEUE_CALLBACK {
            return Some(Self::Queue);
        }
        if let Some(list) = ListCallback::decode(data) {
            return Some(Self::List(list));
        }
        let (kind, arg) = data.split_once(':').unwrap_or((data, ""));
        let callback = match kind {
            "save" => Self::Save,
            "cancel" => Self::Cancel,
            "keep" => Self::KeepAttr,
            "new" => Self::New,
            "msg" => Self::Report,
            "loc" => Self::Location(id(arg)?),
            "star" => Self::Star(id(arg)?),
            "edit" => Self::EditPoi(id(arg)?),
            "attr" => Self::EditAttr(arg.parse().ok()?),
            "house" => Self::ChooseHouse(arg.to_string()),
            "apply" => Self::ApplyQueue(id(arg)?),
            "dismiss" => Self::DismissQueue(id(arg)?),
            "valid" => Self::Validate(id(arg)?),
            "del" => Self::Delete(id(arg)?),
            "undel" => Self::Restore(id(arg)?),
            "floor" => {
                let (house, floor) = arg.split_once(':')?;
                Self::ReviewFloor {
                    house: house.to_string(),
                    floor: floor.to_string(),
                }
            }
            "rev" => Self::ToggleReview(id(arg)?),
            _ => {
                let poi = data.strip_prefix(POI_CALLBACK_PREFIX)?;
                Self::Poi(id(poi)?)
            }
        };
        Some(callback)
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Poi(id) => write!(f, "{POI_CALLBACK_PREFIX}{id}"),
            Self::Location(id) => write!(f, "loc:{id}"),
            Self::Star(id) => write!(f, "star:{id}"),
            Self::List(list) => write!(f, "{list}"),
            Self::EditPoi(id) => write!(f, "edit:{id}"),
            Self::EditAttr(attr) => write!(f, "attr:{attr}"),
            Self::ChooseHouse(key) => write!(f, "house:{key}"),
            Self::KeepAttr => f.write_str("keep"),
            Self::Save => f.write_str("save"),
            Self::Cancel => f.write_str("cancel"),
            Self::New => f.write_str("new"),
            Self::Report => f.write_str("msg"),
            Self::Queue => f.write_str(QUEUE_CALLBACK),
            Self::ApplyQueue(id) => write!(f, "apply:{id}"),
            Self::DismissQueue(id) => write!(f, "dismiss:{id}"),
            Self::Validate(id) => write!(f, "valid:{id}"),
            Self::Delete(id) => write!(f, "del:{id}"),
            Self::Restore(id) => write!(f, "undel:{id}"),
            Self::ReviewFloor { house, floor } => write!(f, "floor:{house}:{floor}"),
            Self::ToggleReview(id) => write!(f, "rev:{id}"),
        }
    }
}

pub fn button(label: impl Into<String>, callback: Callback) -> Button {
    Button::new(label, callback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_what_was_encoded() {
        for callback in [
            Callback::Poi(PoiId::new(12)),
            Callback::Star(PoiId::new(3)),
            Callback::EditAttr(AttrKind::Description),
            Callback::ChooseHouse("m6".into()),
            Callback::ApplyQueue(QueueId::new(5)),
            Callback::ReviewFloor {
                house: "m6".into(),
                floor: "-".into(),
            },
            Callback::Queue,
            Callback::Save,
            Callback::New,
        ] {
            assert_eq!(Some(callback.clone()), Callback::decode(&callback.to_string()));
        }
    }

    #[test]
    fn short_attribute_names() {
        assert_eq!("attr:desc", Callback::EditAttr(AttrKind::Description).to_string());
        assert_eq!(
            Some(Callback::EditAttr(AttrKind::Address)),
            Callback::decode("attr:addr")
        );
    }

    #[test]
    fn show_all_payload() {
        let data = ListCallback::encode("bread", &[1, 2, 3]);
        assert_eq!(
            Some(Callback::List(ListCallback::Ids {
                query: "bread".into(),
                ids: vec![1, 2, 3]
            })),
            Callback::decode(&data)
        );
    }

    #[test]
    fn reject_garbage() {
        assert_eq!(None, Callback::decode("star:abc"));
        assert_eq!(None, Callback::decode("whatever"));
        assert_eq!(None, Callback::decode("attr:colour"));
    }
}
