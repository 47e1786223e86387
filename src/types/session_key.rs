//! Session identity used as the cache key

use serde::Serialize;
use std::fmt;

use crate::{Result, TelemetryError};

/// First season the upstream timing archive covers.
pub const FIRST_SUPPORTED_YEAR: i32 = 2018;

/// Identifies one session: season, event name and session code.
///
/// Keys are validated on construction and immutable afterwards. Event name and
/// session code are trimmed of surrounding whitespace; comparison is otherwise exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    year: i32,
    event_name: String,
    session_code: String,
}

impl SessionKey {
    /// Create a validated session key.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::InvalidSessionKey`] when the year precedes
    /// [`FIRST_SUPPORTED_YEAR`] or either identifier is blank.
    pub fn new(
        year: i32,
        event_name: impl Into<String>,
        session_code: impl Into<String>,
    ) -> Result<Self> {
        if year < FIRST_SUPPORTED_YEAR {
            return Err(TelemetryError::invalid_key(format!(
                "year {} precedes first supported season {}",
                year, FIRST_SUPPORTED_YEAR
            )));
        }

        let event_name = event_name.into().trim().to_string();
        if event_name.is_empty() {
            return Err(TelemetryError::invalid_key("event name is empty"));
        }

        let session_code = session_code.into().trim().to_string();
        if session_code.is_empty() {
            return Err(TelemetryError::invalid_key("session code is empty"));
        }

        Ok(Self { year, event_name, session_code })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn session_code(&self) -> &str {
        &self.session_code
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.year, self.event_name, self.session_code)
    }
}
