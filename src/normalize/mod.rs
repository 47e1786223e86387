//! Normalization of raw upstream records
//!
//! Pure, synchronous functions that turn the loosely typed records in
//! [`crate::schema`] into the stable types in [`crate::types`]. None of them touch the
//! upstream or the cache, and none of them panic on bad data.
//!
//! - [`roster`] classifies a session's driver roster and resolves display names
//! - [`lap`] converts lap rows into [`LapSummary`](crate::types::LapSummary)
//! - [`channels`] sanitizes car data into [`TelemetrySample`](crate::types::TelemetrySample) rows
//! - [`schedule`] extracts session names from event metadata
//! - [`duration`] parses and renders the upstream's timedelta text

pub mod channels;
pub mod duration;
pub mod lap;
pub mod roster;
pub mod schedule;

pub use channels::{DistancePolicy, add_distance, sanitize};
pub use lap::normalize_lap;
pub use roster::{RosterEntry, RosterShape};
pub use schedule::session_names;
