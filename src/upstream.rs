//! Upstream trait for session data sources

use crate::Result;
use crate::schema::{EventRecord, RawSession};
use crate::types::{EventScheduleEntry, SessionKey};

/// Trait for upstream timing data sources
///
/// An upstream supplies raw records exactly as its provider stores them; all
/// interpretation happens in [`crate::normalize`]. Implementations handle their own
/// transport and may be slow: callers bound every call with a timeout.
///
/// Returns [`TelemetryError::UpstreamUnavailable`](crate::TelemetryError::UpstreamUnavailable)
/// for anything the provider cannot serve, including unknown events and sessions.
#[async_trait::async_trait]
pub trait Upstream: Send + Sync + 'static {
    /// Events of a season, in schedule order.
    async fn event_schedule(&self, year: i32) -> Result<Vec<EventScheduleEntry>>;

    /// Metadata fields of one event, including its `SessionN` names.
    async fn event_metadata(&self, year: i32, event_name: &str) -> Result<EventRecord>;

    /// Fetch and load one session: lap table, roster and per-lap car data.
    ///
    /// This is the expensive call the session cache deduplicates.
    async fn load_session(&self, key: &SessionKey) -> Result<RawSession>;
}

impl std::fmt::Debug for dyn Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Upstream")
    }
}
