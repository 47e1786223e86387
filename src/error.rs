//! Error types for session queries and normalization.
//!
//! Every failure the library can surface is a [`TelemetryError`] variant. Errors are
//! `Clone` so a single failed upstream load can be handed to every caller that was
//! waiting on it.
//!
//! ## Error Categories
//!
//! - **Upstream Errors**: the data provider failed or exceeded its time budget
//! - **Record Errors**: a lap or sample did not have the expected structure
//! - **Channel Errors**: telemetry channels missing, mis-sized, or out of order
//! - **Lookup Outcomes**: the requested lap does not exist (no data, not a failure)
//! - **Input Errors**: invalid session keys or configuration
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use pitlane::TelemetryError;
//!
//! let error = TelemetryError::upstream_unavailable("timing service refused connection");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Upstream data source unavailable: {reason}")]
    UpstreamUnavailable {
        reason: String,
        #[source]
        source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Upstream load timed out after {duration:?}")]
    LoadTimeout { duration: Duration },

    #[error("Malformed record in {context}: {details}")]
    MalformedRecord { context: String, details: String },

    #[error("Required telemetry channel '{channel}' is missing")]
    MissingRequiredChannel { channel: String },

    #[error("Telemetry channel '{channel}' has {found} samples, expected {expected}")]
    ChannelLengthMismatch { channel: String, expected: usize, found: usize },

    #[error("Distance decreases at sample {index}: {previous} -> {current}")]
    NonMonotonicDistance { index: usize, previous: f64, current: f64 },

    #[error("No lap data for driver '{driver}'{}", .lap.map(|n| format!(" on lap {}", n)).unwrap_or_default())]
    LapNotFound { driver: String, lap: Option<u32> },

    #[error("Invalid session key: {reason}")]
    InvalidSessionKey { reason: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::UpstreamUnavailable { .. } => true,
            TelemetryError::LoadTimeout { .. } => true,
            TelemetryError::MalformedRecord { .. } => false,
            TelemetryError::MissingRequiredChannel { .. } => false,
            TelemetryError::ChannelLengthMismatch { .. } => false,
            TelemetryError::NonMonotonicDistance { .. } => false,
            TelemetryError::LapNotFound { .. } => false,
            TelemetryError::InvalidSessionKey { .. } => false,
            TelemetryError::Config { .. } => false,
        }
    }

    /// Returns whether this error came from the upstream provider rather than the data.
    ///
    /// Timeouts count as upstream failures for callers.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            TelemetryError::UpstreamUnavailable { .. } | TelemetryError::LoadTimeout { .. }
        )
    }

    /// Returns whether this is a "no matching data" outcome rather than a failure.
    pub fn is_no_data(&self) -> bool {
        matches!(self, TelemetryError::LapNotFound { .. })
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::UpstreamUnavailable { .. } => vec![
                "Check network connectivity to the timing provider",
                "Retry the request; failed loads are not cached",
                "Verify the event and session exist for that season",
            ],
            TelemetryError::LoadTimeout { .. } => vec![
                "Increase the configured upstream timeout",
                "Retry once the provider is responding",
                "Prefetch large sessions before they are queried",
            ],
            TelemetryError::MalformedRecord { .. } => vec![
                "Check the upstream record for missing lap numbers",
                "Verify source data integrity",
            ],
            TelemetryError::MissingRequiredChannel { .. } => vec![
                "Check that car data was loaded for this session",
                "Verify the lap was completed with telemetry enabled",
            ],
            TelemetryError::ChannelLengthMismatch { .. } => vec![
                "Check the upstream car data for truncated channels",
                "Reload the session from the provider",
            ],
            TelemetryError::NonMonotonicDistance { .. } => vec![
                "Switch the distance policy to warn to accept the samples",
                "Check the upstream time channel for resets",
            ],
            TelemetryError::LapNotFound { .. } => vec![
                "List the driver's laps to find valid lap numbers",
                "Check the driver code spelling",
            ],
            TelemetryError::InvalidSessionKey { .. } => vec![
                "Use a season from the supported year range",
                "Provide non-empty event and session identifiers",
            ],
            TelemetryError::Config { .. } => vec![
                "Check configuration values against the documented ranges",
                "Remove the field to fall back to its default",
            ],
        }
    }

    /// Helper constructor for upstream failures.
    pub fn upstream_unavailable(reason: impl Into<String>) -> Self {
        TelemetryError::UpstreamUnavailable { reason: reason.into(), source: None }
    }

    /// Helper constructor for upstream failures with source.
    pub fn upstream_unavailable_with_source(
        reason: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        TelemetryError::UpstreamUnavailable { reason: reason.into(), source: Some(Arc::new(source)) }
    }

    /// Helper constructor for malformed records.
    pub fn malformed(context: impl Into<String>, details: impl Into<String>) -> Self {
        TelemetryError::MalformedRecord { context: context.into(), details: details.into() }
    }

    /// Helper constructor for missing channels.
    pub fn missing_channel(channel: impl Into<String>) -> Self {
        TelemetryError::MissingRequiredChannel { channel: channel.into() }
    }

    /// Helper constructor for lap lookups that matched nothing.
    pub fn lap_not_found(driver: impl Into<String>, lap: Option<u32>) -> Self {
        TelemetryError::LapNotFound { driver: driver.into(), lap }
    }

    /// Helper constructor for invalid session keys.
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        TelemetryError::InvalidSessionKey { reason: reason.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        TelemetryError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::upstream_unavailable_with_source("I/O failure", err)
    }
}

impl From<serde_yaml_ng::Error> for TelemetryError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        TelemetryError::malformed("YAML deserialization", err.to_string())
    }
}
