//! Bulk exchange of POIs with external tools.

mod geojson;
mod tags;

pub use self::{geojson::*, tags::*};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
    #[error("POI \"{name}\" references missing house {house}")]
    MissingHouse { name: String, house: String },
    #[error("Invalid feature #{index}: {reason}")]
    InvalidFeature { index: usize, reason: String },
}
