//! Telemetry channel sanitization
//!
//! Turns the raw per-channel sample lists of one lap into [`TelemetrySample`] rows. The
//! motion channels must be present; engine channels are zero-filled when missing.

use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use tracing::{debug, warn};

use super::duration;
use crate::schema::{Channel, RawCarData};
use crate::types::TelemetrySample;
use crate::yaml_utils;
use crate::{Result, TelemetryError};

/// How a decreasing distance channel is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "snake_case")]
pub enum DistancePolicy {
    /// Reject the trace with [`TelemetryError::NonMonotonicDistance`]
    #[default]
    Strict,
    /// Log a warning and return the rows unchanged
    Warn,
}

/// Sanitize raw car data into `length` telemetry rows.
///
/// Rows whose motion values are unusable are dropped, so the result may be shorter
/// than `length`; every returned row is complete.
///
/// # Errors
///
/// - [`TelemetryError::MissingRequiredChannel`] when a motion channel is absent
/// - [`TelemetryError::ChannelLengthMismatch`] when a present channel is not `length` long
/// - [`TelemetryError::NonMonotonicDistance`] under [`DistancePolicy::Strict`]
pub fn sanitize(
    raw: &RawCarData,
    length: usize,
    policy: DistancePolicy,
) -> Result<Vec<TelemetrySample>> {
    for channel in Channel::REQUIRED {
        if raw.channel(channel).is_none() {
            return Err(TelemetryError::missing_channel(channel.source_name()));
        }
    }

    let distance = sized(raw, Channel::Distance, length)?.unwrap_or_default();
    let speed = sized(raw, Channel::Speed, length)?.unwrap_or_default();
    let throttle = sized(raw, Channel::Throttle, length)?.unwrap_or_default();
    let brake = sized(raw, Channel::Brake, length)?.unwrap_or_default();
    let mut zero_filled = [None; 3];
    for (values, channel) in zero_filled.iter_mut().zip(Channel::ZERO_FILLED) {
        *values = sized(raw, channel, length)?;
    }
    let [rpm, gear, drs] = zero_filled;
    let time = sized(raw, Channel::Time, length)?;

    let mut samples = Vec::with_capacity(length);
    let mut skipped = 0usize;

    for index in 0..length {
        let motion = [&distance[index], &speed[index], &throttle[index], &brake[index]]
            .map(|value| yaml_utils::as_f64(value).filter(|v| v.is_finite()));
        let [Some(row_distance), Some(row_speed), Some(row_throttle), Some(row_brake)] = motion
        else {
            skipped += 1;
            continue;
        };

        samples.push(TelemetrySample {
            distance: row_distance,
            speed: row_speed,
            throttle: row_throttle,
            brake: row_brake,
            rpm: integer_sample(rpm, index),
            gear: integer_sample(gear, index),
            drs: integer_sample(drs, index),
            time_seconds: time
                .and_then(|values| duration::seconds(&values[index]))
                .filter(|seconds| seconds.is_finite()),
        });
    }

    if skipped > 0 {
        debug!(skipped, length, "Dropped telemetry rows with unusable motion values");
    }

    check_distance(&samples, policy)?;
    Ok(samples)
}

/// A channel's samples, checked against the expected row count.
fn sized(raw: &RawCarData, channel: Channel, length: usize) -> Result<Option<&[Value]>> {
    match raw.channel(channel) {
        Some(values) if values.len() != length => Err(TelemetryError::ChannelLengthMismatch {
            channel: channel.source_name().to_string(),
            expected: length,
            found: values.len(),
        }),
        other => Ok(other),
    }
}

/// Rounded integer sample, zero when the channel is absent or the value unusable.
fn integer_sample(channel: Option<&[Value]>, index: usize) -> i32 {
    channel
        .and_then(|values| yaml_utils::as_f64(&values[index]))
        .filter(|value| value.is_finite())
        .map(|value| value.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32)
        .unwrap_or(0)
}

fn check_distance(samples: &[TelemetrySample], policy: DistancePolicy) -> Result<()> {
    let Some((index, window)) = samples
        .windows(2)
        .enumerate()
        .find(|(_, pair)| pair[1].distance < pair[0].distance)
    else {
        return Ok(());
    };

    let (previous, current) = (window[0].distance, window[1].distance);
    match policy {
        DistancePolicy::Strict => {
            Err(TelemetryError::NonMonotonicDistance { index: index + 1, previous, current })
        }
        DistancePolicy::Warn => {
            warn!(index = index + 1, previous, current, "Telemetry distance decreases");
            Ok(())
        }
    }
}

/// Derive a cumulative distance channel from speed and time.
///
/// Runs only when Distance is absent and Time and Speed are present with the same
/// length. Each step integrates speed (km/h) over the elapsed time; the first step
/// integrates from time zero. Unusable samples contribute nothing to the sum.
///
/// Returns whether a channel was added.
pub fn add_distance(raw: &mut RawCarData) -> bool {
    if raw.channel(Channel::Distance).is_some() {
        return false;
    }

    let (Some(time), Some(speed)) = (raw.channel(Channel::Time), raw.channel(Channel::Speed)) else {
        return false;
    };
    if time.len() != speed.len() {
        return false;
    }

    let mut total = 0.0;
    let mut previous_time = 0.0;
    let mut distance = Vec::with_capacity(time.len());

    for (time, speed) in time.iter().zip(speed) {
        let time = duration::seconds(time).filter(|t| t.is_finite());
        let speed = yaml_utils::as_f64(speed).filter(|s| s.is_finite());

        if let (Some(time), Some(speed)) = (time, speed) {
            total += speed / 3.6 * (time - previous_time);
        }
        if let Some(time) = time {
            previous_time = time;
        }
        distance.push(Value::from(total));
    }

    raw.insert(Channel::Distance, distance);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn car_data(yaml: &str) -> RawCarData {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    const THREE_ROWS: &str = r#"
Distance: [0.0, 10.5, 21.0]
Speed: [280.0, 281.0, 282.0]
Throttle: [100, 100, 99]
Brake: [false, false, true]
RPM: [11500.4, 11600.6, 11700]
nGear: [7, 7, 8]
DRS: [12, 12, 14]
Time: ['0 days 00:00:00', '0 days 00:00:00.134000', 0.268]
"#;

    #[test]
    fn sanitizes_complete_channels() {
        let samples = sanitize(&car_data(THREE_ROWS), 3, DistancePolicy::Strict).unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1].distance, 10.5);
        assert_eq!(samples[2].brake, 1.0);
        assert_eq!(samples[0].brake, 0.0);
        assert_eq!(samples[0].rpm, 11_500);
        assert_eq!(samples[1].rpm, 11_601);
        assert_eq!(samples[2].gear, 8);
        assert_eq!(samples[1].time_seconds, Some(0.134));
        assert_eq!(samples[2].time_seconds, Some(0.268));
    }

    #[test]
    fn zero_fills_optional_channels() {
        let raw = car_data(
            "Distance: [0, 1]\nSpeed: [100, 101]\nThrottle: [50, 51]\nBrake: [0, 0]\nRPM: ~\n",
        );
        let samples = sanitize(&raw, 2, DistancePolicy::Strict).unwrap();

        assert!(samples.iter().all(|s| s.rpm == 0 && s.gear == 0 && s.drs == 0));
        assert!(samples.iter().all(|s| s.time_seconds.is_none()));
    }

    #[test]
    fn each_zero_filled_channel_lands_in_its_own_field() {
        let base = car_data("Distance: [0, 1]\nSpeed: [100, 101]\nThrottle: [50, 51]\nBrake: [0, 0]\n");

        for channel in Channel::ZERO_FILLED {
            let raw = base.clone().with_values(channel, [3.0, 4.0]);
            let samples = sanitize(&raw, 2, DistancePolicy::Strict).unwrap();
            let picked: Vec<i32> = samples
                .iter()
                .map(|s| match channel {
                    Channel::Rpm => s.rpm,
                    Channel::Gear => s.gear,
                    Channel::Drs => s.drs,
                    other => panic!("{} is not zero-filled", other),
                })
                .collect();
            assert_eq!(picked, vec![3, 4], "{}", channel);
            assert_eq!(samples.iter().map(|s| s.rpm + s.gear + s.drs).sum::<i32>(), 7);

            let short = base.clone().with_values(channel, [3.0]);
            let err = sanitize(&short, 2, DistancePolicy::Strict).unwrap_err();
            assert!(matches!(err, TelemetryError::ChannelLengthMismatch { found: 1, .. }));
        }
    }

    #[test]
    fn missing_required_channel_is_an_error() {
        let raw = car_data("Distance: [0, 1]\nSpeed: [100, 101]\nThrottle: [50, 51]\n");
        let err = sanitize(&raw, 2, DistancePolicy::Strict).unwrap_err();
        assert!(
            matches!(&err, TelemetryError::MissingRequiredChannel { channel } if channel == "Brake"),
            "{:?}",
            err
        );
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let raw = car_data(
            "Distance: [0, 1]\nSpeed: [100, 101]\nThrottle: [50, 51]\nBrake: [0, 0]\nnGear: [7]\n",
        );
        let err = sanitize(&raw, 2, DistancePolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            TelemetryError::ChannelLengthMismatch { ref channel, expected: 2, found: 1 } if channel == "nGear"
        ));
    }

    #[test]
    fn rows_with_unusable_motion_values_are_skipped() {
        let raw = car_data(
            "Distance: [0, .nan, 2, 3]\nSpeed: [100, 101, fast, 103]\nThrottle: [50, 51, 52, 53]\nBrake: [0, 0, 0, ~]\nnGear: [1, 2, 3, .inf]\n",
        );
        let samples = sanitize(&raw, 4, DistancePolicy::Strict).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].distance, 0.0);
    }

    #[test]
    fn non_finite_optional_values_become_zero() {
        let raw = car_data(
            "Distance: [0, 1]\nSpeed: [100, 101]\nThrottle: [50, 51]\nBrake: [0, 0]\nRPM: [.nan, 9000]\n",
        );
        let samples = sanitize(&raw, 2, DistancePolicy::Strict).unwrap();
        assert_eq!(samples[0].rpm, 0);
        assert_eq!(samples[1].rpm, 9000);
    }

    #[test]
    fn decreasing_distance_follows_policy() {
        let raw = car_data(
            "Distance: [0, 5, 4]\nSpeed: [1, 1, 1]\nThrottle: [0, 0, 0]\nBrake: [0, 0, 0]\n",
        );

        let err = sanitize(&raw, 3, DistancePolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            TelemetryError::NonMonotonicDistance { index: 2, previous, current } if previous == 5.0 && current == 4.0
        ));

        let samples = sanitize(&raw, 3, DistancePolicy::Warn).unwrap();
        assert_eq!(samples.len(), 3);
    }

    #[test]
    fn empty_channels_give_an_empty_trace() {
        let raw = car_data("Distance: []\nSpeed: []\nThrottle: []\nBrake: []\n");
        assert!(sanitize(&raw, 0, DistancePolicy::Strict).unwrap().is_empty());
    }

    #[test]
    fn derives_distance_from_speed_and_time() {
        let mut raw = car_data("Speed: [36, 72, 72]\nTime: [1.0, 2.0, 2.5]\n");

        assert!(add_distance(&mut raw));
        let distance: Vec<f64> = raw
            .channel(Channel::Distance)
            .unwrap()
            .iter()
            .filter_map(yaml_utils::as_f64)
            .collect();
        assert_eq!(distance.len(), 3);
        assert!((distance[0] - 10.0).abs() < 1e-9);
        assert!((distance[1] - 30.0).abs() < 1e-9);
        assert!((distance[2] - 40.0).abs() < 1e-9);
    }

    #[test]
    fn existing_distance_is_left_alone() {
        let mut raw = car_data(THREE_ROWS);
        assert!(!add_distance(&mut raw));

        let mut without_time = car_data("Speed: [1, 2]\n");
        assert!(!add_distance(&mut without_time));
        assert!(without_time.channel(Channel::Distance).is_none());
    }

    #[test]
    fn distance_policy_reads_from_config_names() {
        let policy: DistancePolicy = serde_yaml_ng::from_str("warn").unwrap();
        assert_eq!(policy, DistancePolicy::Warn);
        assert_eq!(DistancePolicy::default(), DistancePolicy::Strict);
    }

    proptest! {
        #[test]
        fn prop_sanitized_rows_are_complete_and_finite(
            rows in prop::collection::vec(
                (prop::num::f64::ANY, prop::num::f64::ANY, 0.0f64..100.0, prop::option::of(0.0f64..20_000.0)),
                0..64,
            )
        ) {
            let length = rows.len();
            let mut distance = 0.0;
            let mut raw = RawCarData::new();
            raw.insert(Channel::Distance, rows.iter().map(|_| { distance += 1.0; Value::from(distance) }).collect());
            raw.insert(Channel::Speed, rows.iter().map(|r| Value::from(r.0)).collect());
            raw.insert(Channel::Throttle, rows.iter().map(|r| Value::from(r.2)).collect());
            raw.insert(Channel::Brake, rows.iter().map(|r| Value::from(r.1)).collect());
            raw.insert(Channel::Rpm, rows.iter().map(|r| r.3.map(Value::from).unwrap_or(Value::Null)).collect());

            let samples = sanitize(&raw, length, DistancePolicy::Strict).unwrap();
            prop_assert!(samples.len() <= length);
            for sample in &samples {
                prop_assert!(sample.distance.is_finite());
                prop_assert!(sample.speed.is_finite());
                prop_assert!(sample.throttle.is_finite());
                prop_assert!(sample.brake.is_finite());
                prop_assert!(sample.rpm >= 0);
            }
        }
    }
}
