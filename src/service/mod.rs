//! Telemetry query service
//!
//! Answers the six frontend queries by combining the upstream, the session cache and
//! the normalizers. Each operation catches failures at its own boundary:
//!
//! | Operation | On upstream or load failure |
//! |-----------|-----------------------------|
//! | [`list_supported_years`](TelemetryQueryService::list_supported_years) | never calls the upstream |
//! | [`list_events`](TelemetryQueryService::list_events) | error |
//! | [`list_sessions`](TelemetryQueryService::list_sessions) | empty list, logged |
//! | [`list_drivers`](TelemetryQueryService::list_drivers) | empty list, logged |
//! | [`list_laps`](TelemetryQueryService::list_laps) | error |
//! | [`get_lap_telemetry`](TelemetryQueryService::get_lap_telemetry) | error |

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::{SessionCache, SessionHandle};
use crate::config::ServiceConfig;
use crate::normalize::{self, add_distance, normalize_lap, sanitize, session_names};
use crate::schema::Channel;
use crate::types::{
    DriverRef, EventScheduleEntry, FIRST_SUPPORTED_YEAR, LapSummary, SessionKey, TelemetryTrace,
};
use crate::upstream::Upstream;
use crate::{Result, TelemetryError};


/// Seasons from the first archived one through `current_year`, ascending.
pub fn supported_years(current_year: i32) -> Vec<i32> {
    (FIRST_SUPPORTED_YEAR..=current_year).collect()
}

/// Query front of the crate.
#[derive(Debug, Clone)]
pub struct TelemetryQueryService {
    upstream: Arc<dyn Upstream>,
    cache: SessionCache,
    config: ServiceConfig,
}

impl TelemetryQueryService {
    /// Create a service with its own session cache.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Config`] when `config` does not validate.
    pub fn new(upstream: Arc<dyn Upstream>, config: ServiceConfig) -> Result<Self> {
        config.validate()?;
        let cache =
            SessionCache::new(Arc::clone(&upstream), config.cache.clone(), config.upstream_timeout());
        Ok(Self { upstream, cache, config })
    }

    /// Create a service sharing an existing cache.
    pub fn with_cache(
        upstream: Arc<dyn Upstream>,
        cache: SessionCache,
        config: ServiceConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { upstream, cache, config })
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Start the cache sweeper at the configured interval.
    pub fn spawn_sweeper(&self) -> CancellationToken {
        self.cache.spawn_sweeper(self.config.cache.sweep_interval())
    }

    /// Seasons the archive covers up to `current_year`.
    pub fn list_supported_years(&self, current_year: i32) -> Vec<i32> {
        supported_years(current_year)
    }

    /// Events of a season in schedule order.
    pub async fn list_events(&self, year: i32) -> Result<Vec<EventScheduleEntry>> {
        self.call_upstream(self.upstream.event_schedule(year)).await
    }

    /// Session names of an event; empty when the event is unknown or unavailable.
    pub async fn list_sessions(&self, year: i32, event_name: &str) -> Vec<String> {
        match self.call_upstream(self.upstream.event_metadata(year, event_name)).await {
            Ok(record) => {
                let sessions = session_names(&record);
                if sessions.is_empty() {
                    debug!(year, event = event_name, "Event lists no sessions");
                }
                sessions
            }
            Err(e) => {
                warn!(year, event = event_name, error = %e, "Listing sessions failed");
                Vec::new()
            }
        }
    }

    /// Drivers of a session in first-seen lap order; empty when it cannot be loaded.
    pub async fn list_drivers(&self, year: i32, event_name: &str, session: &str) -> Vec<DriverRef> {
        let handle = match self.session(year, event_name, session).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(year, event = event_name, session, error = %e, "Listing drivers failed");
                return Vec::new();
            }
        };

        let roster = handle.roster();
        handle.driver_codes().iter().map(|code| roster.resolve(code)).collect()
    }

    /// Normalized laps of one driver in recorded order.
    ///
    /// Laps that fail normalization are skipped. A driver without laps yields an
    /// empty list.
    pub async fn list_laps(
        &self,
        year: i32,
        event_name: &str,
        session: &str,
        driver: &str,
    ) -> Result<Vec<LapSummary>> {
        let handle = self.session(year, event_name, session).await?;
        let driver = driver.trim();

        let laps = handle
            .laps_for_driver(driver)
            .filter_map(|raw| match normalize_lap(raw) {
                Ok(lap) => Some(lap),
                Err(e) => {
                    debug!(session = %handle.key(), driver, error = %e, "Skipping malformed lap");
                    None
                }
            })
            .collect();
        Ok(laps)
    }

    /// Sanitized telemetry of one lap.
    ///
    /// With `lap` set, the driver's first lap with that number is used; otherwise the
    /// driver's first recorded lap.
    ///
    /// # Errors
    ///
    /// - [`TelemetryError::LapNotFound`] when no lap matches
    /// - channel errors from [`sanitize`], including a lap without car data
    /// - upstream errors from loading the session
    pub async fn get_lap_telemetry(
        &self,
        year: i32,
        event_name: &str,
        session: &str,
        driver: &str,
        lap: Option<u32>,
    ) -> Result<TelemetryTrace> {
        let handle = self.session(year, event_name, session).await?;
        let driver = driver.trim();

        let raw = handle
            .laps_for_driver(driver)
            .find(|raw| lap.is_none() || normalize::lap::lap_number(raw).ok() == lap)
            .ok_or_else(|| TelemetryError::lap_not_found(driver, lap))?;

        let mut car_data = raw.car_data.clone().unwrap_or_default();
        if add_distance(&mut car_data) {
            debug!(session = %handle.key(), driver, "Derived distance from speed and time");
        }

        let length = car_data.channel_len(Channel::Distance).unwrap_or(0);
        let samples = sanitize(&car_data, length, self.config.distance_policy)?;

        Ok(TelemetryTrace {
            driver: driver.to_string(),
            lap_number: normalize::lap::lap_number(raw).ok(),
            samples,
        })
    }

    /// Load several sessions concurrently so later queries hit the cache.
    pub async fn prefetch(&self, keys: &[SessionKey]) -> Vec<(SessionKey, Result<()>)> {
        join_all(keys.iter().map(|key| async move {
            let result = self.cache.get_or_load(key).await.map(|_| ());
            if let Err(e) = &result {
                warn!(session = %key, error = %e, "Prefetch failed");
            }
            (key.clone(), result)
        }))
        .await
    }

    async fn session(&self, year: i32, event_name: &str, session: &str) -> Result<SessionHandle> {
        let key = SessionKey::new(year, event_name, session)?;
        self.cache.get_or_load(&key).await
    }

    async fn call_upstream<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        let timeout = self.config.upstream_timeout();
        tokio::time::timeout(timeout, call)
            .await
            .unwrap_or_else(|_| Err(TelemetryError::LoadTimeout { duration: timeout }))
    }
}
