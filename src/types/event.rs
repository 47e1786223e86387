//! Event schedule entries

use serde::{Deserialize, Serialize};

/// One event of a season's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct EventScheduleEntry {
    pub year: i32,
    pub event_name: String,
}

impl EventScheduleEntry {
    pub fn new(year: i32, event_name: impl Into<String>) -> Self {
        Self { year, event_name: event_name.into() }
    }
}
