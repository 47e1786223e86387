//! # Raw Session Records
//!
//! A [`RawSession`] is what the upstream hands back after loading one session: the lap
//! table, the driver roster in whatever shape the upstream chose, and per-lap car data.
//!
//! ## Shape Tolerance
//!
//! The upstream is not consistent across seasons or data sources:
//!
//! ```text
//! Drivers:                       # keyed by code
//!   VER: {full_name: Max Verstappen}
//!
//! Drivers:                       # list of records
//!   - {abbreviation: HAM, full_name: Lewis Hamilton}
//!
//! Drivers: ['1', '44', '16']     # bare car numbers
//! ```
//!
//! The roster is therefore kept as an untyped value here and classified once per load
//! by [`RosterShape`](crate::normalize::RosterShape).

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml_ng::Value;
use tracing::warn;

use crate::yaml_utils;

pub mod car_data;
pub mod lap;

pub use car_data::{Channel, RawCarData};
pub use lap::RawLap;

/// A loaded session as supplied by the upstream.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct RawSession {
    /// Session name, e.g. "Race" or "Qualifying"
    pub session_name: Option<String>,
    /// Driver roster in any of the upstream shapes
    pub drivers: Option<Value>,
    /// Lap table in recorded order
    #[serde(deserialize_with = "lap_rows")]
    pub laps: Vec<RawLap>,
}

/// Read the lap table row by row, skipping rows that are not lap records.
fn lap_rows<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<RawLap>, D::Error> {
    let table = Value::deserialize(deserializer)?;
    let rows = match yaml_utils::untagged(&table) {
        Value::Sequence(rows) => rows,
        Value::Null => return Ok(Vec::new()),
        _ => {
            warn!("Lap table is not a sequence, reading it as empty");
            return Ok(Vec::new());
        }
    };

    let mut laps = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match serde_yaml_ng::from_value::<RawLap>(row.clone()) {
            Ok(lap) => laps.push(lap),
            Err(e) => warn!(index, error = %e, "Skipping malformed lap record"),
        }
    }
    Ok(laps)
}

impl RawSession {
    /// Distinct driver codes in the order they first appear in the lap table.
    pub fn driver_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = Vec::new();
        for code in self.laps.iter().filter_map(RawLap::driver_code) {
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        codes
    }
}
