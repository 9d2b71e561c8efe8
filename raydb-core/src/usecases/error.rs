use crate::{
    edit::EditError, fields::FieldError, hours::HoursError, pagination::PackError, repositories,
    review::ReviewError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("This is not allowed")]
    Forbidden,
    #[error("The POI has not been saved yet")]
    NotPersisted,
    #[error("The POI has been deleted")]
    Deleted,
    #[error("The POI is not deleted")]
    NotDeleted,
    #[error("The POI does not exist")]
    PoiMissing,
    #[error("A deletion needs a reason")]
    EmptyReason,
    #[error("Messages can only be dismissed")]
    MessageNotApplicable,
    #[error("Nothing has changed")]
    NoChanges,
    #[error("Invalid tag")]
    InvalidTag,
    #[error("Invalid opening hours: {0}")]
    InvalidHours(String),
    #[error("Invalid field value: {0}")]
    Field(#[from] FieldError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Pack(#[from] PackError),
    #[error(transparent)]
    Index(anyhow::Error),
    #[error(transparent)]
    Repo(#[from] repositories::Error),
}

impl From<crate::authorization::Error> for Error {
    fn from(_: crate::authorization::Error) -> Self {
        Self::Forbidden
    }
}

impl From<HoursError> for Error {
    fn from(err: HoursError) -> Self {
        Self::InvalidHours(err.0)
    }
}
