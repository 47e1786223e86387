//! Raw car telemetry channels

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml_ng::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::yaml_utils;

/// Telemetry channels the normalizers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Distance,
    Speed,
    Throttle,
    Brake,
    Rpm,
    Gear,
    Drs,
    Time,
}

impl Channel {
    /// Channels every telemetry request needs.
    pub const REQUIRED: [Channel; 4] =
        [Channel::Distance, Channel::Speed, Channel::Throttle, Channel::Brake];

    /// Channels that are zero-filled when the upstream omits them.
    pub const ZERO_FILLED: [Channel; 3] = [Channel::Rpm, Channel::Gear, Channel::Drs];

    /// Channel name used by the upstream car data.
    pub fn source_name(self) -> &'static str {
        match self {
            Channel::Distance => "Distance",
            Channel::Speed => "Speed",
            Channel::Throttle => "Throttle",
            Channel::Brake => "Brake",
            Channel::Rpm => "RPM",
            Channel::Gear => "nGear",
            Channel::Drs => "DRS",
            Channel::Time => "Time",
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

/// Raw per-sample channel data keyed by upstream channel name.
///
/// A channel mapped to `null` or to anything other than a sequence is treated the same
/// as a missing channel, so one bad channel only affects the lap it belongs to.
#[derive(Default, Debug, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct RawCarData {
    channels: BTreeMap<String, Option<Vec<Value>>>,
}

impl<'de> Deserialize<'de> for RawCarData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(|value| Self::from_value(&value))
    }
}

impl RawCarData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read car data from an untyped value.
    ///
    /// A value that is not a mapping yields car data without channels.
    pub fn from_value(value: &Value) -> Self {
        let Some(mapping) = yaml_utils::as_mapping(value) else {
            if !matches!(yaml_utils::untagged(value), Value::Null) {
                warn!("Car data is not a mapping of channels, ignoring it");
            }
            return Self::default();
        };

        let channels = mapping
            .iter()
            .filter_map(|(name, samples)| {
                let name = yaml_utils::as_text(name)?;
                let samples = match yaml_utils::untagged(samples) {
                    Value::Sequence(values) => Some(values.clone()),
                    Value::Null => None,
                    _ => {
                        debug!(channel = %name, "Car data channel is not a sequence, reading it as absent");
                        None
                    }
                };
                Some((name, samples))
            })
            .collect();

        Self { channels }
    }

    /// Samples of a channel, if present.
    pub fn channel(&self, channel: Channel) -> Option<&[Value]> {
        self.channels.get(channel.source_name()).and_then(|values| values.as_deref())
    }

    /// Number of samples in a channel, if present.
    pub fn channel_len(&self, channel: Channel) -> Option<usize> {
        self.channel(channel).map(<[Value]>::len)
    }

    /// Replace a channel's samples.
    pub fn insert(&mut self, channel: Channel, values: Vec<Value>) {
        self.channels.insert(channel.source_name().to_string(), Some(values));
    }

    /// Builder-style [`insert`](Self::insert) for float samples.
    pub fn with_values(mut self, channel: Channel, values: impl IntoIterator<Item = f64>) -> Self {
        self.insert(channel, values.into_iter().map(Value::from).collect());
        self
    }

    /// Names of every channel the upstream supplied, including unknown ones.
    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }
}
