//! Sanitized car telemetry for a single lap

use serde::{Deserialize, Serialize};

use crate::normalize::duration::format_timedelta;

/// One sanitized telemetry row.
///
/// All floating point values are finite. Integer channels the upstream did not
/// record are zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    /// Distance from the start of the lap in meters
    pub distance: f64,
    /// Speed in km/h
    pub speed: f64,
    /// Throttle application, 0-100
    pub throttle: f64,
    /// Brake application (1.0 when the upstream only records on/off)
    pub brake: f64,
    /// Engine speed
    pub rpm: i32,
    /// Selected gear
    pub gear: i32,
    /// DRS state code
    pub drs: i32,
    /// Time since the start of the lap in seconds, when recorded
    pub time_seconds: Option<f64>,
}

/// Ordered telemetry of one lap, ascending by distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct TelemetryTrace {
    pub driver: String,
    /// Lap the samples belong to; `None` when the upstream lap number was unusable
    pub lap_number: Option<u32>,
    pub samples: Vec<TelemetrySample>,
}

impl TelemetryTrace {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Project the rows into equal-length columns.
    pub fn to_columns(&self) -> TelemetryColumns {
        let samples = &self.samples;
        TelemetryColumns {
            distance: samples.iter().map(|s| s.distance).collect(),
            speed: samples.iter().map(|s| s.speed).collect(),
            throttle: samples.iter().map(|s| s.throttle).collect(),
            brake: samples.iter().map(|s| s.brake).collect(),
            rpm: samples.iter().map(|s| s.rpm).collect(),
            gear: samples.iter().map(|s| s.gear).collect(),
            drs: samples.iter().map(|s| s.drs).collect(),
            time: samples
                .iter()
                .map(|s| s.time_seconds.map(format_timedelta).unwrap_or_default())
                .collect(),
        }
    }
}

/// Column-oriented telemetry, the layout charting frontends consume.
///
/// Every column has the same length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TelemetryColumns {
    pub distance: Vec<f64>,
    pub speed: Vec<f64>,
    pub throttle: Vec<f64>,
    pub brake: Vec<f64>,
    pub rpm: Vec<i32>,
    pub gear: Vec<i32>,
    pub drs: Vec<i32>,
    pub time: Vec<String>,
}

impl TelemetryColumns {
    /// Number of rows, taken from the distance column.
    pub fn len(&self) -> usize {
        self.distance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distance.is_empty()
    }
}
