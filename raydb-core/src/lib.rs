//! # raydb-core
//!
//! Business logic of the block directory: text and address handling,
//! ranking, the edit dialogue, moderation and the ports to storage,
//! index and messenger.

pub mod entities {
    pub use raydb_entities::{
        address::*, audit::*, geo::*, hours::*, id::*, links::*, poi::*, queue::*, time::*,
        user::*,
    };
}

pub mod address;
pub mod authorization;
pub mod db;
pub mod diff;
pub mod edit;
pub mod fields;
pub mod gateways;
pub mod hours;
pub mod pagination;
pub mod ranking;
pub mod repositories;
pub mod responses;
pub mod review;
pub mod session;
pub mod tag;
pub mod text;
pub mod usecases;
pub mod util;

pub use repositories::Error as RepoError;
