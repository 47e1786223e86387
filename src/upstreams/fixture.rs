//! Fixture upstream backed by recorded season archives
//!
//! Each season lives in `<dir>/<year>.yml`:
//!
//! ```yaml
//! Events:
//!   - EventName: Bahrain Grand Prix
//!     Session1: Practice 1
//!     Session5: Race
//!     Sessions:
//!       R:
//!         SessionName: Race
//!         Drivers: {VER: {full_name: Max Verstappen}}
//!         Laps:
//!           - {Driver: VER, LapNumber: 1, LapTime: 97.284}
//! ```
//!
//! Every field of an event except `Sessions` is event metadata. Sessions are addressed
//! by their key (`R`) or by their `SessionName` (`Race`), ignoring case.

use serde::Deserialize;
use serde_yaml_ng::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::schema::{EventRecord, RawSession};
use crate::types::{EventScheduleEntry, SessionKey};
use crate::upstream::Upstream;
use crate::yaml_utils;
use crate::{Result, TelemetryError};

const SESSIONS_FIELD: &str = "Sessions";
const EVENT_NAME_FIELD: &str = "EventName";

/// Upstream that serves season archives from a directory.
#[derive(Debug, Clone)]
pub struct FixtureUpstream {
    dir: PathBuf,
    /// Artificial delay applied to every call
    latency: Option<Duration>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[serde(default)]
struct SeasonArchive {
    events: Vec<Mapping>,
}

impl FixtureUpstream {
    /// Open an archive directory.
    pub async fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&dir).await.map_err(|e| {
            TelemetryError::upstream_unavailable_with_source(
                format!("cannot open archive directory {}", dir.display()),
                e,
            )
        })?;
        if !metadata.is_dir() {
            return Err(TelemetryError::upstream_unavailable(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        info!(dir = %dir.display(), "Opened fixture archive");
        Ok(Self { dir, latency: None })
    }

    /// Delay every call by `latency`, to exercise timeouts and concurrent loads.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn season(&self, year: i32) -> Result<Vec<Mapping>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let path = self.dir.join(format!("{}.yml", year));
        let yaml = tokio::fs::read_to_string(&path).await.map_err(|e| {
            TelemetryError::upstream_unavailable_with_source(
                format!("no archive for season {}", year),
                e,
            )
        })?;

        let archive: SeasonArchive = serde_yaml_ng::from_str(&yaml)?;
        debug!(year, events = archive.events.len(), "Read season archive");
        Ok(archive.events)
    }

    async fn event(&self, year: i32, event_name: &str) -> Result<Mapping> {
        self.season(year)
            .await?
            .into_iter()
            .find(|event| event_name_of(event).is_some_and(|name| name.eq_ignore_ascii_case(event_name)))
            .ok_or_else(|| {
                TelemetryError::upstream_unavailable(format!(
                    "event '{}' not found in season {}",
                    event_name, year
                ))
            })
    }
}

fn event_name_of(event: &Mapping) -> Option<String> {
    yaml_utils::field(event, &[EVENT_NAME_FIELD]).and_then(yaml_utils::as_non_blank_text)
}

/// Find a session by key or by its `SessionName`.
fn find_session(sessions: &Mapping, code: &str) -> Option<Value> {
    let by_code = sessions.iter().find(|(name, _)| {
        yaml_utils::as_text(name).is_some_and(|name| name.eq_ignore_ascii_case(code))
    });

    let by_name = || {
        sessions.iter().find(|(_, session)| {
            yaml_utils::as_mapping(session)
                .and_then(|session| yaml_utils::field(session, &["SessionName"]))
                .and_then(yaml_utils::as_text)
                .is_some_and(|name| name.eq_ignore_ascii_case(code))
        })
    };

    by_code.or_else(by_name).map(|(_, session)| session.clone())
}

#[async_trait::async_trait]
impl Upstream for FixtureUpstream {
    async fn event_schedule(&self, year: i32) -> Result<Vec<EventScheduleEntry>> {
        let entries = self
            .season(year)
            .await?
            .iter()
            .filter_map(event_name_of)
            .map(|name| EventScheduleEntry::new(year, name))
            .collect();
        Ok(entries)
    }

    async fn event_metadata(&self, year: i32, event_name: &str) -> Result<EventRecord> {
        let mut event = self.event(year, event_name).await?;
        event.remove(SESSIONS_FIELD);
        Ok(EventRecord::new(event))
    }

    async fn load_session(&self, key: &SessionKey) -> Result<RawSession> {
        let event = self.event(key.year(), key.event_name()).await?;

        let session = event
            .get(SESSIONS_FIELD)
            .and_then(yaml_utils::as_mapping)
            .and_then(|sessions| find_session(sessions, key.session_code()))
            .ok_or_else(|| {
                TelemetryError::upstream_unavailable(format!("session {} not found", key))
            })?;

        let mut session: RawSession = serde_yaml_ng::from_value(session)?;
        if session.session_name.is_none() {
            session.session_name = Some(key.session_code().to_string());
        }

        debug!(
            year = key.year(),
            event = %key.event_name(),
            session = %key.session_code(),
            laps = session.laps.len(),
            "Loaded fixture session"
        );
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEASON: &str = r#"
Events:
  - EventName: Bahrain Grand Prix
    Session1: Practice 1
    Session1Date: 2023-03-03
    Session5: Race
    Sessions:
      R:
        SessionName: Race
        Drivers: {VER: {full_name: Max Verstappen}}
        Laps:
          - {Driver: VER, LapNumber: 1, LapTime: 97.284}
      Q:
        Laps: []
  - EventName: Pre-Season Testing
"#;

    async fn archive() -> (tempfile::TempDir, FixtureUpstream) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2023.yml"), SEASON).unwrap();
        let upstream = FixtureUpstream::open(dir.path()).await.unwrap();
        (dir, upstream)
    }

    #[tokio::test]
    async fn lists_events_in_archive_order() {
        let (_dir, upstream) = archive().await;
        let events = upstream.event_schedule(2023).await.unwrap();

        assert_eq!(
            events,
            vec![
                EventScheduleEntry::new(2023, "Bahrain Grand Prix"),
                EventScheduleEntry::new(2023, "Pre-Season Testing"),
            ]
        );
    }

    #[tokio::test]
    async fn missing_season_is_upstream_unavailable() {
        let (_dir, upstream) = archive().await;
        let err = upstream.event_schedule(2019).await.unwrap_err();
        assert!(matches!(err, TelemetryError::UpstreamUnavailable { .. }));
    }

    #[tokio::test]
    async fn metadata_excludes_session_payloads() {
        let (_dir, upstream) = archive().await;
        let record = upstream.event_metadata(2023, "bahrain grand prix").await.unwrap();

        assert!(record.get("Session5").is_some());
        assert!(record.get(SESSIONS_FIELD).is_none());
    }

    #[tokio::test]
    async fn sessions_resolve_by_code_or_name() {
        let (_dir, upstream) = archive().await;

        let by_code = SessionKey::new(2023, "Bahrain Grand Prix", "r").unwrap();
        let by_name = SessionKey::new(2023, "Bahrain Grand Prix", "Race").unwrap();

        let a = upstream.load_session(&by_code).await.unwrap();
        let b = upstream.load_session(&by_name).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.laps.len(), 1);
    }

    #[tokio::test]
    async fn unnamed_sessions_take_their_code() {
        let (_dir, upstream) = archive().await;
        let key = SessionKey::new(2023, "Bahrain Grand Prix", "Q").unwrap();
        let session = upstream.load_session(&key).await.unwrap();
        assert_eq!(session.session_name.as_deref(), Some("Q"));
    }

    #[tokio::test]
    async fn unknown_sessions_are_upstream_unavailable() {
        let (_dir, upstream) = archive().await;

        for key in [
            SessionKey::new(2023, "Bahrain Grand Prix", "S").unwrap(),
            SessionKey::new(2023, "Pre-Season Testing", "R").unwrap(),
            SessionKey::new(2023, "Monaco Grand Prix", "R").unwrap(),
        ] {
            let err = upstream.load_session(&key).await.unwrap_err();
            assert!(matches!(err, TelemetryError::UpstreamUnavailable { .. }), "{}", key);
        }
    }

    #[tokio::test]
    async fn open_rejects_missing_directories() {
        let err = FixtureUpstream::open("/nonexistent/pitlane-archive").await.unwrap_err();
        assert!(err.is_upstream_failure());
    }
}
