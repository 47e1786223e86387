//! Test utilities: in-memory upstream, record builders and fixture paths
//!
//! Shared by unit tests, integration tests and benchmarks.

#![cfg(any(test, feature = "benchmark"))]

use serde_yaml_ng::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::schema::{Channel, EventRecord, RawCarData, RawLap, RawSession};
use crate::types::{EventScheduleEntry, SessionKey};
use crate::upstream::Upstream;
use crate::{Result, TelemetryError};

/// Guidance shown when season archives are missing from the checkout.
pub const FIXTURE_GUIDANCE: &str =
    "Season archives are stored under test-data/ as <year>.yml; restore them from the repository.";

/// Error returned when a required fixture cannot be located.
#[derive(Debug, Clone)]
pub struct FixtureError {
    message: String,
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FixtureError {}

/// The `test-data/` directory of this crate.
pub fn test_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test-data")
}

/// Require the archive of `year` inside `test-data/` and return its path.
pub fn require_season_archive(year: i32) -> std::result::Result<PathBuf, FixtureError> {
    let path = test_data_dir().join(format!("{}.yml", year));
    if path.exists() {
        Ok(path)
    } else {
        Err(FixtureError {
            message: format!("Missing season archive: {}. {}", path.display(), FIXTURE_GUIDANCE),
        })
    }
}

/// Key of the session [`sample_session`] stands for.
pub fn sample_key() -> SessionKey {
    SessionKey::new(2023, "Bahrain Grand Prix", "R").unwrap_or_else(|e| panic!("{}", e))
}

/// Car data with `samples` rows of plausible straight-line running.
pub fn car_data(samples: usize) -> RawCarData {
    let rows = 0..samples;
    RawCarData::new()
        .with_values(Channel::Distance, rows.clone().map(|i| i as f64 * 4.1))
        .with_values(Channel::Speed, rows.clone().map(|i| 250.0 + (i % 50) as f64))
        .with_values(Channel::Throttle, rows.clone().map(|i| if i % 40 < 30 { 100.0 } else { 0.0 }))
        .with_values(Channel::Brake, rows.clone().map(|i| if i % 40 < 30 { 0.0 } else { 1.0 }))
        .with_values(Channel::Rpm, rows.clone().map(|i| 10_500.0 + (i % 20) as f64 * 50.0))
        .with_values(Channel::Gear, rows.clone().map(|i| (3 + i % 6) as f64))
        .with_values(Channel::Drs, rows.clone().map(|_| 0.0))
        .with_values(Channel::Time, rows.map(|i| i as f64 * 0.06))
}

/// A raw lap row.
pub fn lap(driver: &str, number: u32, lap_time: Option<f64>, car: Option<RawCarData>) -> RawLap {
    RawLap {
        driver: Some(Value::from(driver)),
        lap_number: Some(Value::from(number)),
        lap_time: lap_time.map(Value::from),
        start_time: Some(Value::from(3_600.0 + number as f64 * 95.0)),
        is_accurate: Some(Value::Bool(true)),
        car_data: car,
    }
}

/// A small race: VER laps 1 to 3 with car data, HAM laps 1 and 2, keyed roster.
pub fn sample_session() -> RawSession {
    let drivers: Value = serde_yaml_ng::from_str(
        "VER: {full_name: Max Verstappen}\nHAM: {full_name: Lewis Hamilton}\n",
    )
    .unwrap_or_else(|e| panic!("{}", e));

    RawSession {
        session_name: Some("Race".to_string()),
        drivers: Some(drivers),
        laps: vec![
            lap("VER", 1, Some(97.284), Some(car_data(16))),
            lap("HAM", 1, Some(98.102), None),
            lap("VER", 2, Some(96.113), Some(car_data(16))),
            lap("HAM", 2, None, None),
            lap("VER", 3, Some(95.870), Some(car_data(16))),
        ],
    }
}

/// In-memory [`Upstream`] with call counting, latency and failure injection.
#[derive(Debug, Default)]
pub struct MockUpstream {
    sessions: HashMap<SessionKey, RawSession>,
    schedules: HashMap<i32, Vec<EventScheduleEntry>>,
    events: HashMap<(i32, String), EventRecord>,
    delay: Option<Duration>,
    failures: AtomicUsize,
    fetches: AtomicUsize,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(mut self, key: SessionKey, session: RawSession) -> Self {
        self.sessions.insert(key, session);
        self
    }

    pub fn with_schedule(mut self, year: i32, events: &[&str]) -> Self {
        let entries = events.iter().map(|name| EventScheduleEntry::new(year, *name)).collect();
        self.schedules.insert(year, entries);
        self
    }

    pub fn with_event(mut self, year: i32, event_name: &str, record: EventRecord) -> Self {
        self.events.insert((year, event_name.to_string()), record);
        self
    }

    /// Delay every call by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the next `count` session loads.
    pub fn fail_next_loads(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Number of session loads requested so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl Upstream for MockUpstream {
    async fn event_schedule(&self, year: i32) -> Result<Vec<EventScheduleEntry>> {
        self.pause().await;
        self.schedules
            .get(&year)
            .cloned()
            .ok_or_else(|| TelemetryError::upstream_unavailable(format!("no schedule for {}", year)))
    }

    async fn event_metadata(&self, year: i32, event_name: &str) -> Result<EventRecord> {
        self.pause().await;
        self.events.get(&(year, event_name.to_string())).cloned().ok_or_else(|| {
            TelemetryError::upstream_unavailable(format!("unknown event {} {}", year, event_name))
        })
    }

    async fn load_session(&self, key: &SessionKey) -> Result<RawSession> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(TelemetryError::upstream_unavailable("injected failure"));
        }

        self.sessions
            .get(key)
            .cloned()
            .ok_or_else(|| TelemetryError::upstream_unavailable(format!("unknown session {}", key)))
    }
}
