//! Upstream Record Schema
//!
//! Raw, loosely typed records exactly as the upstream timing provider supplies them.
//! Nothing in this module interprets values; see [`crate::normalize`] for that.
//!
//! # Architecture
//!
//! - [`EventRecord`] holds one event's metadata fields, including session names
//! - [`RawSession`] holds a loaded session: roster value and lap table
//! - [`RawLap`] is one lap row with optional [`RawCarData`] channels

pub mod event;
pub mod session;

pub use event::EventRecord;
pub use session::{Channel, RawCarData, RawLap, RawSession};
