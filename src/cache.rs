//! Session cache with single-flight loading
//!
//! Loading a session is the expensive upstream operation, so the cache keeps loaded
//! sessions resident and makes sure only one load per [`SessionKey`] is ever in flight.
//!
//! # Slot Lifecycle
//!
//! ```text
//! Unloaded ──get_or_load──▶ Loading ──ok──▶ Loaded ──evict/invalidate──▶ Unloaded
//!                              │
//!                              └──err──▶ Failed ──get_or_load──▶ Loading
//! ```
//!
//! Each load runs in its own spawned task and broadcasts its outcome over a `watch`
//! channel, so callers that give up waiting never strand the others. Failures are
//! recorded but not retried; the next request starts a fresh load.
//!
//! The slot map sits behind a `std::sync::Mutex` that is only held for map updates,
//! never across an `.await`.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::CacheConfig;
use crate::normalize::RosterShape;
use crate::schema::{RawLap, RawSession};
use crate::types::SessionKey;
use crate::upstream::Upstream;
use crate::{Result, TelemetryError};

/// Immutable raw data of one loaded session.
#[derive(Debug)]
pub struct LoadedSession {
    key: SessionKey,
    session_name: Option<String>,
    laps: Vec<RawLap>,
    roster: RosterShape,
    driver_codes: Vec<String>,
    loaded_at: Instant,
}

impl LoadedSession {
    /// Wrap a raw session, classifying its roster once.
    pub fn new(key: SessionKey, raw: RawSession) -> Self {
        let roster = RosterShape::classify(raw.drivers.as_ref());
        let driver_codes = raw.driver_codes();
        Self {
            key,
            session_name: raw.session_name,
            laps: raw.laps,
            roster,
            driver_codes,
            loaded_at: Instant::now(),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn session_name(&self) -> Option<&str> {
        self.session_name.as_deref()
    }

    /// Lap table in recorded order.
    pub fn laps(&self) -> &[RawLap] {
        &self.laps
    }

    /// Laps driven by `code`, in recorded order.
    pub fn laps_for_driver<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a RawLap> + 'a {
        self.laps.iter().filter(move |lap| lap.is_driver(code))
    }

    pub fn roster(&self) -> &RosterShape {
        &self.roster
    }

    /// Distinct driver codes in first-seen lap order.
    pub fn driver_codes(&self) -> &[String] {
        &self.driver_codes
    }

    pub fn loaded_at(&self) -> Instant {
        self.loaded_at
    }
}

/// Shared handle to a loaded session.
///
/// Cloning is cheap. While any clone is alive outside the cache the session is
/// never evicted.
#[derive(Debug, Clone)]
pub struct SessionHandle(Arc<LoadedSession>);

impl SessionHandle {
    pub fn new(session: LoadedSession) -> Self {
        Self(Arc::new(session))
    }

    /// Whether both handles point at the same loaded session.
    pub fn ptr_eq(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Clones alive besides this one.
    fn other_holders(&self) -> usize {
        Arc::strong_count(&self.0).saturating_sub(1)
    }
}

impl Deref for SessionHandle {
    type Target = LoadedSession;

    fn deref(&self) -> &LoadedSession {
        &self.0
    }
}

/// Observable state of a cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum SlotState {
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

/// Cache counters since construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct CacheStats {
    /// Requests answered from a resident session
    pub hits: u64,
    /// Requests that started or joined a load
    pub misses: u64,
    /// Upstream session loads issued
    pub upstream_fetches: u64,
    /// Sessions dropped by eviction
    pub evictions: u64,
}

type LoadOutcome = Option<Result<SessionHandle>>;

enum Slot {
    Loading { id: u64, outcome: watch::Receiver<LoadOutcome> },
    Loaded { handle: SessionHandle, last_access: Instant },
    Failed { error: TelemetryError },
}

impl Slot {
    fn state(&self) -> SlotState {
        match self {
            Slot::Loading { .. } => SlotState::Loading,
            Slot::Loaded { .. } => SlotState::Loaded,
            Slot::Failed { .. } => SlotState::Failed,
        }
    }
}

struct CacheInner {
    upstream: Arc<dyn Upstream>,
    config: CacheConfig,
    load_timeout: Duration,
    slots: Mutex<HashMap<SessionKey, Slot>>,
    next_load: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    upstream_fetches: AtomicU64,
    evictions: AtomicU64,
}

/// Cache of loaded sessions keyed by [`SessionKey`].
///
/// Cloning shares the same cache.
#[derive(Clone)]
pub struct SessionCache {
    inner: Arc<CacheInner>,
}

impl fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCache")
            .field("config", &self.inner.config)
            .field("load_timeout", &self.inner.load_timeout)
            .field("stats", &self.stats())
            .finish()
    }
}

impl SessionCache {
    /// Create a cache loading sessions from `upstream`.
    ///
    /// Every load is bounded by `load_timeout`.
    pub fn new(upstream: Arc<dyn Upstream>, config: CacheConfig, load_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                upstream,
                config,
                load_timeout,
                slots: Mutex::new(HashMap::new()),
                next_load: AtomicU64::new(0),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                upstream_fetches: AtomicU64::new(0),
                evictions: AtomicU64::new(0),
            }),
        }
    }

    /// Return the loaded session for `key`, loading it if needed.
    ///
    /// Concurrent callers for the same key share one upstream load and observe the
    /// same handle or the same error.
    pub async fn get_or_load(&self, key: &SessionKey) -> Result<SessionHandle> {
        let mut outcome = {
            let mut slots = self.inner.lock();
            match slots.get_mut(key) {
                Some(Slot::Loaded { handle, last_access }) => {
                    *last_access = Instant::now();
                    self.inner.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(session = %key, "Session cache hit");
                    return Ok(handle.clone());
                }
                Some(Slot::Loading { outcome, .. }) => {
                    self.inner.misses.fetch_add(1, Ordering::Relaxed);
                    debug!(session = %key, "Joining in-flight session load");
                    outcome.clone()
                }
                Some(Slot::Failed { .. }) | None => {
                    self.inner.misses.fetch_add(1, Ordering::Relaxed);
                    debug!(session = %key, "Session cache miss");
                    self.start_load(&mut slots, key.clone())
                }
            }
        };

        let result = match outcome.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };
        result.unwrap_or_else(|| {
            Err(TelemetryError::upstream_unavailable("session load ended without reporting"))
        })
    }

    fn start_load(
        &self,
        slots: &mut HashMap<SessionKey, Slot>,
        key: SessionKey,
    ) -> watch::Receiver<LoadOutcome> {
        let (tx, rx) = watch::channel(None);
        let id = self.inner.next_load.fetch_add(1, Ordering::Relaxed);
        slots.insert(key.clone(), Slot::Loading { id, outcome: rx.clone() });

        let pending = PendingLoad { inner: Arc::clone(&self.inner), key, id, tx, reported: false };
        tokio::spawn(pending.run());
        rx
    }

    /// Current state of the slot for `key`.
    pub fn state(&self, key: &SessionKey) -> SlotState {
        self.inner.lock().get(key).map_or(SlotState::Unloaded, Slot::state)
    }

    /// Error recorded by the last failed load of `key`, if the slot is failed.
    pub fn failure(&self, key: &SessionKey) -> Option<TelemetryError> {
        match self.inner.lock().get(key) {
            Some(Slot::Failed { error }) => Some(error.clone()),
            _ => None,
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            upstream_fetches: self.inner.upstream_fetches.load(Ordering::Relaxed),
            evictions: self.inner.evictions.load(Ordering::Relaxed),
        }
    }

    /// Keys of all loaded sessions, sorted.
    pub fn resident_sessions(&self) -> Vec<SessionKey> {
        let mut keys: Vec<SessionKey> = self
            .inner
            .lock()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Loaded { .. }))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Drop a loaded or failed slot. In-flight loads are left alone.
    ///
    /// Returns whether a slot was removed.
    pub fn invalidate(&self, key: &SessionKey) -> bool {
        let mut slots = self.inner.lock();
        if matches!(slots.get(key), Some(Slot::Loaded { .. } | Slot::Failed { .. })) {
            slots.remove(key);
            info!(session = %key, "Session invalidated");
            true
        } else {
            false
        }
    }

    /// Drop every loaded and failed slot.
    pub fn clear(&self) {
        let mut slots = self.inner.lock();
        let before = slots.len();
        slots.retain(|_, slot| matches!(slot, Slot::Loading { .. }));
        info!(removed = before - slots.len(), "Session cache cleared");
    }

    /// Evict idle and excess sessions and drop failed slots.
    ///
    /// Returns the number of slots removed.
    pub fn sweep(&self) -> usize {
        self.inner.sweep()
    }

    /// Run [`sweep`](Self::sweep) every `interval` until the returned token is cancelled.
    ///
    /// The sweeper also stops once the cache itself has been dropped.
    pub fn spawn_sweeper(&self, interval: Duration) -> CancellationToken {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let inner: Weak<CacheInner> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            debug!(?interval, "Cache sweeper started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Cache sweeper cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        let Some(inner) = inner.upgrade() else {
                            debug!("Cache dropped, sweeper exiting");
                            break;
                        };
                        inner.sweep();
                    }
                }
            }
        });

        cancel
    }
}

impl CacheInner {
    fn lock(&self) -> MutexGuard<'_, HashMap<SessionKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch(&self, key: &SessionKey) -> Result<SessionHandle> {
        self.upstream_fetches.fetch_add(1, Ordering::Relaxed);
        info!(
            year = key.year(),
            event = %key.event_name(),
            session = %key.session_code(),
            "Loading session from upstream"
        );
        let started = Instant::now();

        let raw = match tokio::time::timeout(self.load_timeout, self.upstream.load_session(key)).await {
            Ok(result) => result?,
            Err(_) => return Err(TelemetryError::LoadTimeout { duration: self.load_timeout }),
        };

        let session = LoadedSession::new(key.clone(), raw);
        info!(
            session = %key,
            name = session.session_name().unwrap_or_default(),
            laps = session.laps().len(),
            drivers = session.driver_codes().len(),
            roster = session.roster().kind(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Session loaded"
        );
        Ok(SessionHandle::new(session))
    }

    /// Record the outcome of load `id`, unless its slot has since been replaced.
    fn settle(&self, key: &SessionKey, id: u64, result: &Result<SessionHandle>) {
        let mut slots = self.lock();
        if !matches!(slots.get(key), Some(Slot::Loading { id: current, .. }) if *current == id) {
            debug!(session = %key, "Load outcome discarded, slot was replaced");
            return;
        }

        match result {
            Ok(handle) => {
                slots.insert(
                    key.clone(),
                    Slot::Loaded { handle: handle.clone(), last_access: Instant::now() },
                );
                self.evict(&mut slots, false);
            }
            Err(error) => {
                slots.insert(key.clone(), Slot::Failed { error: error.clone() });
            }
        }
    }

    fn sweep(&self) -> usize {
        let mut slots = self.lock();
        let removed = self.evict(&mut slots, true);
        if removed > 0 {
            info!(removed, resident = slots.len(), "Session cache swept");
        }
        removed
    }

    /// Apply the idle and capacity limits. Loaded sessions still held elsewhere and
    /// loading slots are never removed.
    fn evict(&self, slots: &mut HashMap<SessionKey, Slot>, drop_failed: bool) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        if drop_failed {
            let before = slots.len();
            slots.retain(|_, slot| !matches!(slot, Slot::Failed { .. }));
            removed += before - slots.len();
        }

        if let Some(ttl) = self.config.idle_ttl() {
            let idle: Vec<SessionKey> = slots
                .iter()
                .filter_map(|(key, slot)| match slot {
                    Slot::Loaded { handle, last_access }
                        if handle.other_holders() == 0
                            && now.saturating_duration_since(*last_access) >= ttl =>
                    {
                        Some(key.clone())
                    }
                    _ => None,
                })
                .collect();

            for key in idle {
                self.remove_loaded(slots, &key, "Evicted idle session");
                removed += 1;
            }
        }

        if let Some(max_sessions) = self.config.max_sessions {
            let mut loaded = slots.values().filter(|slot| matches!(slot, Slot::Loaded { .. })).count();

            while loaded > max_sessions {
                let oldest = slots
                    .iter()
                    .filter_map(|(key, slot)| match slot {
                        Slot::Loaded { handle, last_access } if handle.other_holders() == 0 => {
                            Some((key, *last_access))
                        }
                        _ => None,
                    })
                    .min_by_key(|(_, last_access)| *last_access)
                    .map(|(key, _)| key.clone());

                let Some(key) = oldest else {
                    debug!(loaded, max_sessions, "All resident sessions are in use");
                    break;
                };

                self.remove_loaded(slots, &key, "Evicted least recently used session");
                loaded -= 1;
                removed += 1;
            }
        }

        removed
    }

    fn remove_loaded(&self, slots: &mut HashMap<SessionKey, Slot>, key: &SessionKey, message: &str) {
        if let Some(Slot::Loaded { handle, .. }) = slots.remove(key) {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            info!(
                session = %key,
                resident_secs = handle.loaded_at().elapsed().as_secs(),
                "{}",
                message
            );
        }
    }
}

/// A load in progress. Reports a failure if dropped before the load finished.
struct PendingLoad {
    inner: Arc<CacheInner>,
    key: SessionKey,
    id: u64,
    tx: watch::Sender<LoadOutcome>,
    reported: bool,
}

impl PendingLoad {
    async fn run(mut self) {
        let result = self.inner.fetch(&self.key).await;
        if let Err(e) = &result {
            warn!(session = %self.key, error = %e, "Session load failed");
        }
        self.report(result);
    }

    fn report(&mut self, result: Result<SessionHandle>) {
        self.inner.settle(&self.key, self.id, &result);
        self.tx.send_replace(Some(result));
        self.reported = true;
    }
}

impl Drop for PendingLoad {
    fn drop(&mut self) {
        if !self.reported {
            error!(session = %self.key, "Session load task ended without reporting");
            self.report(Err(TelemetryError::upstream_unavailable(
                "session load task ended without reporting",
            )));
        }
    }
}
