//! Cyload Core - Collaborator abstractions for the Cypher upload engine
//!
//! This crate provides the traits and types the upload engine is written
//! against. It defines:
//!
//! - `Driver` - Opens sessions against a graph database
//! - `Session` - A single logical connection used serially
//! - `Transaction` - An explicit unit of work opened from a session
//! - `NotificationSink` - Fire-and-forget user notifications
//! - `QueryCounters` - Per-statement and per-run mutation counters

mod counters;
mod error;
mod notify;
mod session;

pub use counters::*;
pub use error::*;
pub use notify::*;
pub use session::*;
