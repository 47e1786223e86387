//! Normalized lap summary

use serde::{Deserialize, Serialize};

/// Stable summary of one lap.
///
/// `lap_time_seconds` is always finite and non-negative when present; every sentinel
/// the upstream uses for "no time" (null, NaN, infinities) becomes `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct LapSummary {
    /// Lap number within the session, starting at 1
    pub lap_number: u32,
    /// Lap duration in seconds
    pub lap_time_seconds: Option<f64>,
    /// Upstream text rendering of the lap duration
    #[serde(rename = "lapTimeStr")]
    pub lap_time_text: Option<String>,
    /// Lap start as session time text; empty when unknown
    #[serde(rename = "lapStartTime")]
    pub start_time: String,
    /// Whether the upstream considers the lap timing accurate
    pub is_valid: bool,
}
