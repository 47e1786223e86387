//! Driver identity as returned to clients

use serde::{Deserialize, Serialize};

/// A driver code paired with the best display name available.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DriverRef {
    /// Short identifier, usually a three-letter abbreviation
    pub code: String,
    /// Full name, or the code when no richer identity is known
    #[serde(rename = "name")]
    pub display_name: String,
}

impl DriverRef {
    /// Build a reference, falling back to `code` for a missing or blank name.
    pub fn new(code: impl Into<String>, display_name: Option<String>) -> Self {
        let code = code.into();
        let display_name = display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| code.clone());
        Self { code, display_name }
    }

    /// Reference whose display name is the code itself.
    pub fn bare(code: impl Into<String>) -> Self {
        Self::new(code, None)
    }

    /// Whether a name richer than the code was resolved.
    pub fn has_full_name(&self) -> bool {
        self.display_name != self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_fall_back_to_code() {
        assert_eq!(DriverRef::new("VER", Some("  ".to_string())).display_name, "VER");
        assert_eq!(DriverRef::new("VER", None).display_name, "VER");
        assert!(!DriverRef::bare("VER").has_full_name());
    }

    #[test]
    fn serializes_with_wire_names() {
        let driver = DriverRef::new("VER", Some("Max Verstappen".to_string()));
        let json = serde_json::to_value(&driver).unwrap();
        assert_eq!(json, serde_json::json!({ "code": "VER", "name": "Max Verstappen" }));
    }
}
