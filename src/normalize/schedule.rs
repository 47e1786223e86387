//! Session names from event metadata

use crate::schema::EventRecord;
use crate::yaml_utils;

const SESSION_PREFIX: &str = "Session";
const DATE_SUFFIXES: &[&str] = &["Date", "DateUtc"];

/// Session names announced by an event record, in field order.
///
/// A field counts when its name starts with `Session`, does not end with `Date` or
/// `DateUtc`, and its value is non-blank text.
pub fn session_names(event: &EventRecord) -> Vec<String> {
    event
        .fields()
        .filter(|(name, _)| is_session_field(name))
        .filter_map(|(_, value)| match yaml_utils::untagged(value) {
            serde_yaml_ng::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn is_session_field(name: &str) -> bool {
    name.starts_with(SESSION_PREFIX) && !DATE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}
