//! Normalized, cached access to motorsport session telemetry.
//!
//! Pitlane sits between a timing-data upstream and a charting frontend. The upstream
//! hands out loosely shaped records (rosters in three layouts, lap times as seconds,
//! text or NaN, telemetry channels that may be missing); pitlane turns them into
//! stable, JSON-safe types and keeps loaded sessions in an in-process cache.
//!
//! # Features
//!
//! - **Single-flight cache**: one upstream load per session, however many requests
//! - **Shape tolerance**: keyed, record-list and bare-list driver rosters
//! - **JSON safety**: no NaN or infinity ever leaves the crate
//! - **Fixture upstream**: recorded season archives for offline use and tests
//!
//! # Architecture
//!
//! ```text
//! TelemetryQueryService ──▶ SessionCache ──▶ dyn Upstream
//!         │                      │
//!         └──── normalize ◀──────┘ (raw laps, roster, car data)
//! ```
//!
//! ## Example (fixture archive)
//!
//! ```rust,no_run
//! use pitlane::{Pitlane, ServiceConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> pitlane::Result<()> {
//!     let service = Pitlane::open_archive("test-data", ServiceConfig::default()).await?;
//!
//!     for driver in service.list_drivers(2023, "Bahrain Grand Prix", "R").await {
//!         println!("{} {}", driver.code, driver.display_name);
//!     }
//!
//!     let trace = service
//!         .get_lap_telemetry(2023, "Bahrain Grand Prix", "R", "VER", Some(2))
//!         .await?;
//!     println!("{} samples", trace.len());
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;
mod yaml_utils;

// Upstream records and normalization
pub mod normalize;
pub mod schema;

// Session lifecycle and queries
pub mod cache;
pub mod config;
pub mod service;
pub mod upstream;
pub mod upstreams;

// Core exports
pub use error::*;
pub use types::*;

pub use cache::{CacheStats, SessionCache, SessionHandle, SlotState};
pub use config::{CacheConfig, ServiceConfig};
pub use normalize::{DistancePolicy, RosterShape};
pub use service::{TelemetryQueryService, supported_years};
pub use upstream::Upstream;
pub use upstreams::FixtureUpstream;

use std::sync::Arc;

/// Unified entry point for building query services.
///
/// # Examples
///
/// ## Custom upstream
/// ```rust,no_run
/// use std::sync::Arc;
/// use pitlane::{Pitlane, ServiceConfig, Upstream};
///
/// fn build(upstream: Arc<dyn Upstream>) -> pitlane::Result<()> {
///     let service = Pitlane::service(upstream, ServiceConfig::default())?;
///     assert_eq!(service.list_supported_years(2020), vec![2018, 2019, 2020]);
///     Ok(())
/// }
/// ```
pub struct Pitlane;

impl Pitlane {
    /// Build a service over any upstream.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Config`] when `config` does not validate.
    pub fn service(upstream: Arc<dyn Upstream>, config: ServiceConfig) -> Result<TelemetryQueryService> {
        TelemetryQueryService::new(upstream, config)
    }

    /// Build a service over recorded season archives in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `dir` does not exist or is not a directory
    /// - `config` does not validate
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use pitlane::{Pitlane, ServiceConfig};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> pitlane::Result<()> {
    /// let service = Pitlane::open_archive("archives", ServiceConfig::default()).await?;
    /// let events = service.list_events(2023).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn open_archive<P: AsRef<std::path::Path>>(
        dir: P,
        config: ServiceConfig,
    ) -> Result<TelemetryQueryService> {
        let upstream = FixtureUpstream::open(dir).await?;
        TelemetryQueryService::new(Arc::new(upstream), config)
    }
}
