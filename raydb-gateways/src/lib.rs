//! Outgoing message sinks that stand in for a real chat transport.

mod json_file;
mod log_sink;

pub use self::{json_file::JsonFileOutbox, log_sink::LogMessenger};
