use crate::{id::*, poi::PoiField, time::*};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditChange {
    /// Whole-object snapshot of a new POI.
    Created { snapshot: String },
    /// Whole-object snapshot of a permanently removed POI.
    Removed { snapshot: String },
    /// Soft deletion (`old` is `None`) or restoration (`new` is `None`).
    DeleteReason {
        old: Option<String>,
        new: Option<String>,
    },
    Field {
        field: PoiField,
        old_value: Option<String>,
        new_value: Option<String>,
    },
}

impl AuditChange {
    pub const POI_FIELD: &'static str = "poi";
    pub const DELETE_REASON_FIELD: &'static str = "delete_reason";

    pub fn field_name(&self) -> &str {
        match self {
            Self::Created { .. } | Self::Removed { .. } => Self::POI_FIELD,
            Self::DeleteReason { .. } => Self::DELETE_REASON_FIELD,
            Self::Field { field, .. } => field.as_ref(),
        }
    }
}

/// An immutable log record of a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub submitter: UserId,
    pub approver: Option<UserId>,
    pub poi_id: PoiId,
    pub change: AuditChange,
    pub created_at: Option<Timestamp>,
}
