#![deny(missing_debug_implementations)]

//! # raydb-entities
//!
//! Reusable, agnostic domain entities for the block directory.
//!
//! The entities only contain generic functionality that does not reveal any application-specific business logic.

pub mod address;
pub mod audit;
pub mod geo;
pub mod hours;
pub mod id;
pub mod links;
pub mod poi;
pub mod queue;
pub mod time;
pub mod user;

#[cfg(any(test, feature = "builders"))]
pub mod builders;
