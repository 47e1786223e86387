//! Driver identity resolution
//!
//! The upstream roster comes in three shapes depending on season and data source. The
//! shape is classified once when a session is loaded; resolving a code afterwards is a
//! lookup that never fails.

use serde_yaml_ng::{Mapping, Value};
use std::collections::HashMap;

use crate::types::DriverRef;
use crate::yaml_utils;

/// Field spellings holding a driver's full name.
const FULL_NAME_FIELDS: &[&str] = &["full_name", "FullName"];

/// Field spellings holding a driver's abbreviation.
const ABBREVIATION_FIELDS: &[&str] = &["abbreviation", "Abbreviation"];

/// One record of an abbreviation-list roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub abbreviation: Option<String>,
    pub full_name: Option<String>,
}

/// Classified driver roster of a loaded session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RosterShape {
    /// Mapping from driver code to a record with a full name
    Keyed(HashMap<String, Option<String>>),
    /// Sequence of records carrying an abbreviation and a full name
    AbbreviationList(Vec<RosterEntry>),
    /// Sequence of bare identifiers without names
    BareList(Vec<String>),
    /// No roster, or a shape we do not understand
    #[default]
    Unknown,
}

impl RosterShape {
    /// Classify a raw roster value.
    ///
    /// Keyed mappings take precedence over record lists, which take precedence over
    /// bare lists. Empty or unrecognized values classify as [`RosterShape::Unknown`].
    pub fn classify(raw: Option<&Value>) -> Self {
        let Some(raw) = raw else {
            return RosterShape::Unknown;
        };

        match yaml_utils::untagged(raw) {
            Value::Mapping(mapping) if !mapping.is_empty() => Self::keyed(mapping),
            Value::Sequence(items) => match items.first().map(yaml_utils::untagged) {
                Some(Value::Mapping(_)) => RosterShape::AbbreviationList(
                    items.iter().filter_map(yaml_utils::as_mapping).map(Self::entry).collect(),
                ),
                Some(Value::String(_) | Value::Number(_)) => RosterShape::BareList(
                    items.iter().filter_map(yaml_utils::as_non_blank_text).collect(),
                ),
                _ => RosterShape::Unknown,
            },
            _ => RosterShape::Unknown,
        }
    }

    fn keyed(mapping: &Mapping) -> Self {
        let drivers = mapping
            .iter()
            .filter_map(|(code, info)| {
                let code = yaml_utils::as_non_blank_text(code)?;
                let full_name = yaml_utils::as_mapping(info)
                    .and_then(|record| yaml_utils::field(record, FULL_NAME_FIELDS))
                    .and_then(yaml_utils::as_non_blank_text);
                Some((code, full_name))
            })
            .collect();
        RosterShape::Keyed(drivers)
    }

    fn entry(record: &Mapping) -> RosterEntry {
        RosterEntry {
            abbreviation: yaml_utils::field(record, ABBREVIATION_FIELDS)
                .and_then(yaml_utils::as_non_blank_text),
            full_name: yaml_utils::field(record, FULL_NAME_FIELDS)
                .and_then(yaml_utils::as_non_blank_text),
        }
    }

    /// Resolve a driver code to a display identity, falling back to the code itself.
    pub fn resolve(&self, code: &str) -> DriverRef {
        let full_name = match self {
            RosterShape::Keyed(drivers) => drivers.get(code).cloned().flatten(),
            RosterShape::AbbreviationList(entries) => entries
                .iter()
                .find(|entry| entry.abbreviation.as_deref() == Some(code))
                .and_then(|entry| entry.full_name.clone()),
            RosterShape::BareList(_) | RosterShape::Unknown => None,
        };
        DriverRef::new(code, full_name)
    }

    /// Short label of the shape, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            RosterShape::Keyed(_) => "keyed",
            RosterShape::AbbreviationList(_) => "abbreviation_list",
            RosterShape::BareList(_) => "bare_list",
            RosterShape::Unknown => "unknown",
        }
    }
}
