//! Helpers for reading loosely typed upstream values
//!
//! Upstream records arrive as [`serde_yaml_ng::Value`] trees. The same field can be a
//! number in one season and a string in the next, can be wrapped in a YAML tag, or can
//! carry `.nan` / `.inf`. These helpers read such values without assuming a shape.
//!
//! None of them filter non-finite numbers; callers decide what a NaN means.

use serde_yaml_ng::{Mapping, Value};

/// Strip any YAML tags wrapping a value.
pub(crate) fn untagged(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untagged(&tagged.value),
        other => other,
    }
}

/// Read a value as a float.
///
/// Numbers convert directly, booleans become 1.0 / 0.0, and strings are parsed after
/// trimming. Anything else is `None`.
pub(crate) fn as_f64(value: &Value) -> Option<f64> {
    match untagged(value) {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Read a scalar value as text.
///
/// Numbers render in their shortest form; integral floats render without a fraction so
/// that a car number stored as `44.0` reads as `"44"`.
pub(crate) fn as_text(value: &Value) -> Option<String> {
    match untagged(value) {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Some(integer.to_string())
            } else {
                number
                    .as_f64()
                    .filter(|v| v.is_finite() && v.fract() == 0.0)
                    .map(|v| format!("{}", v as i64))
                    .or_else(|| Some(number.to_string()))
            }
        }
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Read a scalar as non-blank text.
pub(crate) fn as_non_blank_text(value: &Value) -> Option<String> {
    as_text(value).filter(|text| !text.trim().is_empty())
}

/// Look up the first of several field spellings in a mapping.
pub(crate) fn field<'a>(mapping: &'a Mapping, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| mapping.get(*name))
        .find(|value| !matches!(untagged(value), Value::Null))
}

/// Read a value as a mapping, looking through tags.
pub(crate) fn as_mapping(value: &Value) -> Option<&Mapping> {
    match untagged(value) {
        Value::Mapping(mapping) => Some(mapping),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml_ng::from_str(text).unwrap()
    }

    #[test]
    fn test_as_f64_reads_numbers_strings_and_flags() {
        assert_eq!(as_f64(&yaml("92.5")), Some(92.5));
        assert_eq!(as_f64(&yaml("'  7 '")), Some(7.0));
        assert_eq!(as_f64(&yaml("true")), Some(1.0));
        assert_eq!(as_f64(&yaml("~")), None);
        assert_eq!(as_f64(&yaml("[1, 2]")), None);
    }

    #[test]
    fn test_as_f64_keeps_yaml_special_floats() {
        assert!(as_f64(&yaml(".nan")).unwrap().is_nan());
        assert_eq!(as_f64(&yaml(".inf")), Some(f64::INFINITY));
    }

    #[test]
    fn test_as_text_renders_integral_floats_without_fraction() {
        assert_eq!(as_text(&yaml("44")), Some("44".to_string()));
        assert_eq!(as_text(&yaml("44.0")), Some("44".to_string()));
        assert_eq!(as_text(&yaml("VER")), Some("VER".to_string()));
        assert_eq!(as_text(&yaml("{a: 1}")), None);
    }

    #[test]
    fn test_tagged_values_are_unwrapped() {
        assert_eq!(as_f64(&yaml("!duration 92.5")), Some(92.5));
        assert_eq!(as_text(&yaml("!code VER")), Some("VER".to_string()));
    }

    #[test]
    fn test_field_prefers_first_spelling_and_skips_null() {
        let record = yaml("{full_name: ~, FullName: Max Verstappen}");
        let mapping = as_mapping(&record).unwrap();
        assert_eq!(field(mapping, &["full_name"]), None);
        assert_eq!(
            field(mapping, &["full_name", "FullName"]).and_then(as_text),
            Some("Max Verstappen".to_string())
        );
    }
}
