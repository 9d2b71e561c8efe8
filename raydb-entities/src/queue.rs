use crate::{id::*, poi::PoiField, time::*};

/// The account that proposed a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitter {
    pub user_id: UserId,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueChange {
    Field {
        field: PoiField,
        old_value: Option<String>,
        new_value: Option<String>,
    },
    /// An unstructured note from the submitter.
    Message(String),
}

impl QueueChange {
    pub const MESSAGE_FIELD: &'static str = "message";

    pub fn field_name(&self) -> &str {
        match self {
            Self::Field { field, .. } => field.as_ref(),
            Self::Message(_) => Self::MESSAGE_FIELD,
        }
    }
}

/// A proposed single-field change that awaits moderation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: QueueId,
    pub submitter: Submitter,
    pub created_at: Timestamp,
    pub poi_id: PoiId,
    pub change: QueueChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQueueEntry {
    pub submitter: Submitter,
    pub poi_id: PoiId,
    pub change: QueueChange,
}
