//! Raw lap records
//!
//! Laps arrive with every field optional and loosely typed. Lap numbers may be integers,
//! floats or numeric strings; lap times may be seconds or timedelta text; the accuracy
//! flag may be missing entirely. Normalization lives in [`crate::normalize::lap`].

use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;

use super::car_data::RawCarData;
use crate::yaml_utils;

/// One lap row as supplied by the upstream.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
pub struct RawLap {
    /// Driver code (abbreviation or car number)
    pub driver: Option<Value>,
    /// Lap number
    pub lap_number: Option<Value>,
    /// Lap duration (seconds or timedelta text)
    pub lap_time: Option<Value>,
    /// Session time at which the lap started
    pub start_time: Option<Value>,
    /// Upstream timing accuracy flag
    pub is_accurate: Option<Value>,
    /// Car telemetry recorded during the lap
    pub car_data: Option<RawCarData>,
}

impl RawLap {
    /// Driver code as text, if the record carries a usable one.
    pub fn driver_code(&self) -> Option<String> {
        self.driver.as_ref().and_then(yaml_utils::as_non_blank_text)
    }

    /// Whether this lap was driven by `code`.
    pub fn is_driver(&self, code: &str) -> bool {
        self.driver_code().is_some_and(|driver| driver == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_partial_records() {
        let lap: RawLap = serde_yaml_ng::from_str("Driver: VER\nLapNumber: 5.0\nLapTime: .nan\n").unwrap();

        assert_eq!(lap.driver_code().as_deref(), Some("VER"));
        assert!(lap.lap_time.is_some());
        assert!(lap.start_time.is_none());
        assert!(lap.is_accurate.is_none());
        assert!(lap.car_data.is_none());
    }

    #[test]
    fn null_fields_read_as_absent() {
        let lap: RawLap = serde_yaml_ng::from_str("Driver: HAM\nLapTime: ~\nIsAccurate: null\n").unwrap();
        assert!(lap.lap_time.is_none());
        assert!(lap.is_accurate.is_none());
    }

    #[test]
    fn numeric_driver_codes_match_as_text() {
        let lap: RawLap = serde_yaml_ng::from_str("Driver: 44\n").unwrap();
        assert!(lap.is_driver("44"));
        assert!(!lap.is_driver("HAM"));
    }
}
