//! Lap record normalization

use serde_yaml_ng::Value;

use super::duration;
use crate::schema::RawLap;
use crate::types::LapSummary;
use crate::yaml_utils;
use crate::{Result, TelemetryError};

/// Convert a raw lap into a [`LapSummary`].
///
/// # Errors
///
/// Returns [`TelemetryError::MalformedRecord`] when the lap number is missing or is not
/// a positive integer. Every other field degrades to a default instead of failing.
pub fn normalize_lap(raw: &RawLap) -> Result<LapSummary> {
    let lap_number = lap_number(raw)?;

    let (lap_time_seconds, lap_time_text) = match raw.lap_time.as_ref() {
        Some(value) => (lap_seconds(value), Some(duration_text(value))),
        None => (None, None),
    };

    Ok(LapSummary {
        lap_number,
        lap_time_seconds,
        lap_time_text,
        start_time: raw.start_time.as_ref().map(duration_text).unwrap_or_default(),
        is_valid: raw.is_accurate.as_ref().map(validity_flag).unwrap_or(true),
    })
}

/// Read the lap number of a raw lap.
///
/// Integral floats (`5.0`) and numeric strings (`"5"`) are accepted.
pub fn lap_number(raw: &RawLap) -> Result<u32> {
    let value = raw
        .lap_number
        .as_ref()
        .ok_or_else(|| TelemetryError::malformed("lap record", "lap number is missing"))?;

    let number = match yaml_utils::untagged(value) {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        TelemetryError::malformed("lap record", format!("lap number {:?} is not numeric", value))
    })?;

    if !number.is_finite() || number.fract() != 0.0 || number < 1.0 || number > u32::MAX as f64 {
        return Err(TelemetryError::malformed(
            "lap record",
            format!("lap number {} is not a positive integer", number),
        ));
    }

    Ok(number as u32)
}

/// Lap time in seconds, dropping every non-finite or negative value.
fn lap_seconds(value: &Value) -> Option<f64> {
    duration::seconds(value).filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
}

/// Text rendering of a duration field: verbatim text, or timedelta formatting.
fn duration_text(value: &Value) -> String {
    match yaml_utils::untagged(value) {
        Value::String(text) => text.clone(),
        Value::Number(number) => duration::format_timedelta(number.as_f64().unwrap_or(f64::NAN)),
        other => yaml_utils::as_text(other).unwrap_or_else(|| "NaT".to_string()),
    }
}

/// Accuracy flag; anything that is not an explicit "false" counts as valid.
fn validity_flag(value: &Value) -> bool {
    match yaml_utils::untagged(value) {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_none_or(|v| v != 0.0),
        Value::String(text) => {
            !matches!(text.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no")
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(yaml: &str) -> RawLap {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn normalizes_a_complete_lap() {
        let lap = normalize_lap(&raw(
            "Driver: VER\nLapNumber: 5\nLapTime: 92.123\nStartTime: 3605.5\nIsAccurate: false\n",
        ))
        .unwrap();

        assert_eq!(lap.lap_number, 5);
        assert_eq!(lap.lap_time_seconds, Some(92.123));
        assert_eq!(lap.lap_time_text.as_deref(), Some("0 days 00:01:32.123000"));
        assert_eq!(lap.start_time, "0 days 01:00:05.500000");
        assert!(!lap.is_valid);
    }

    #[test]
    fn missing_accuracy_flag_means_valid() {
        let lap = normalize_lap(&raw("LapNumber: 1\nLapTime: 95.0\n")).unwrap();
        assert!(lap.is_valid);
    }

    #[test]
    fn missing_fields_use_stable_defaults() {
        let lap = normalize_lap(&raw("LapNumber: 1\n")).unwrap();
        assert_eq!(lap.lap_time_seconds, None);
        assert_eq!(lap.lap_time_text, None);
        assert_eq!(lap.start_time, "");
    }

    #[test]
    fn sentinel_lap_times_become_null() {
        for sentinel in [".nan", ".inf", "-.inf", "-3.0", "'NaT'"] {
            let lap = normalize_lap(&raw(&format!("LapNumber: 2\nLapTime: {}\n", sentinel))).unwrap();
            assert_eq!(lap.lap_time_seconds, None, "sentinel {}", sentinel);
            assert!(lap.lap_time_text.is_some(), "sentinel {}", sentinel);
        }
    }

    #[test]
    fn nan_duration_renders_as_nat() {
        let lap = normalize_lap(&raw("LapNumber: 2\nLapTime: .nan\n")).unwrap();
        assert_eq!(lap.lap_time_text.as_deref(), Some("NaT"));
    }

    #[test]
    fn text_lap_times_are_kept_verbatim() {
        let lap = normalize_lap(&raw("LapNumber: 3\nLapTime: '0 days 00:01:33.456000'\n")).unwrap();
        assert_eq!(lap.lap_time_text.as_deref(), Some("0 days 00:01:33.456000"));
        assert!(lap.lap_time_seconds.is_some_and(|s| (s - 93.456).abs() < 1e-9));
    }

    #[test]
    fn lap_numbers_accept_integral_floats_and_numeric_text() {
        assert_eq!(lap_number(&raw("LapNumber: 7.0\n")).unwrap(), 7);
        assert_eq!(lap_number(&raw("LapNumber: ' 8 '\n")).unwrap(), 8);
    }

    #[test]
    fn malformed_lap_numbers_are_rejected() {
        for bad in ["", "LapNumber: ~\n", "LapNumber: abc\n", "LapNumber: 0\n", "LapNumber: 2.5\n", "LapNumber: .nan\n", "LapNumber: [1]\n"] {
            let result = lap_number(&raw(if bad.is_empty() { "{}" } else { bad }));
            assert!(
                matches!(result, Err(TelemetryError::MalformedRecord { .. })),
                "input {:?} gave {:?}",
                bad,
                result
            );
        }
    }

    #[test]
    fn accuracy_flag_variants() {
        assert!(validity_flag(&Value::from(1)));
        assert!(!validity_flag(&Value::from(0)));
        assert!(!validity_flag(&Value::from("False")));
        assert!(validity_flag(&Value::from("True")));
    }

    proptest! {
        #[test]
        fn prop_lap_time_is_never_non_finite(seconds in prop::num::f64::ANY) {
            let lap = RawLap {
                lap_number: Some(Value::from(1)),
                lap_time: Some(Value::from(seconds)),
                ..Default::default()
            };

            let summary = normalize_lap(&lap).unwrap();
            if let Some(value) = summary.lap_time_seconds {
                prop_assert!(value.is_finite());
                prop_assert!(value >= 0.0);
            }
            prop_assert!(summary.lap_time_text.is_some());
        }

        #[test]
        fn prop_lap_numbers_round_trip(number in 1u32..10_000u32) {
            let lap = RawLap { lap_number: Some(Value::from(number)), ..Default::default() };
            prop_assert_eq!(normalize_lap(&lap).unwrap().lap_number, number);
        }
    }
}
