//! Service configuration
//!
//! All fields have defaults, so an empty document is a valid configuration:
//!
//! ```yaml
//! upstream_timeout_ms: 60000
//! distance_policy: strict
//! cache:
//!   max_sessions: 8
//!   idle_ttl_secs: 1800
//!   sweep_interval_secs: 60
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::normalize::DistancePolicy;
use crate::{Result, TelemetryError};

/// Configuration for [`TelemetryQueryService`](crate::TelemetryQueryService).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Time budget for a single upstream call, in milliseconds
    pub upstream_timeout_ms: u64,
    /// Handling of decreasing distance in telemetry
    pub distance_policy: DistancePolicy,
    pub cache: CacheConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upstream_timeout_ms: 60_000,
            distance_policy: DistancePolicy::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Residency limits of the session cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum loaded sessions kept resident; `None` for no limit
    pub max_sessions: Option<usize>,
    /// Idle time after which an unused session is evicted; `None` to keep forever
    pub idle_ttl_secs: Option<u64>,
    /// Period of the background sweeper
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_sessions: Some(8), idle_ttl_secs: Some(1_800), sweep_interval_secs: 60 }
    }
}

impl CacheConfig {
    /// Configuration without any eviction.
    pub fn unbounded() -> Self {
        Self { max_sessions: None, idle_ttl_secs: None, ..Self::default() }
    }

    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl_secs.map(Duration::from_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Check the limits are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_sessions == Some(0) {
            return Err(TelemetryError::config("cache.max_sessions must be at least 1"));
        }
        if self.sweep_interval_secs == 0 {
            return Err(TelemetryError::config("cache.sweep_interval_secs must be non-zero"));
        }
        Ok(())
    }
}

impl ServiceConfig {
    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)
            .map_err(|e| TelemetryError::config(format!("unreadable configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        let config = Self::from_yaml_str(&yaml)
            .with_context(|| format!("parsing configuration from {}", path.display()))?;
        Ok(config)
    }

    /// Check every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.upstream_timeout_ms == 0 {
            return Err(TelemetryError::config("upstream_timeout_ms must be non-zero"));
        }
        self.cache.validate()
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }
}
