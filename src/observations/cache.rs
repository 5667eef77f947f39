//! Holds the latest observation of every station, per source, and keeps it fresh.
//!
//! Each source has its own snapshot and its own refresh lock. Readers clone the
//! current snapshot `Arc` and never wait for a refresh, except on a cold cache
//! where there is nothing to serve yet. A refresh builds a complete new snapshot
//! and swaps it in, so a reader sees either the old or the new set, never a mix.

use crate::config::CacheConfig;
use crate::observations::error::FetchError;
use crate::observations::fetcher::ObservationFetcher;
use crate::types::modality::Source;
use crate::types::observation::Observation;
use crate::types::station::StationId;
use crate::utils::{Clock, SystemClock};
use bon::bon;
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

/// Observations keyed and ordered by station.
pub type ObservationSet = BTreeMap<StationId, Observation>;

/// Immutable view of one source at one point in time.
#[derive(Debug, Default, Clone)]
pub struct SourceSnapshot {
    observations: ObservationSet,
    refreshed_at: Option<DateTime<Utc>>,
}

impl SourceSnapshot {
    pub fn observations(&self) -> &ObservationSet {
        &self.observations
    }

    /// Time of the last successful refresh, `None` while the cache is cold.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Result of [`ObservationCache::get`].
#[derive(Debug, Clone)]
pub struct CachedObservations {
    pub snapshot: Arc<SourceSnapshot>,
    /// Time since the last successful refresh, `None` if there never was one.
    pub age: Option<TimeDelta>,
}

/// What an explicit [`ObservationCache::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot with this many records in the fetched batch was installed.
    Updated { records: usize },
    /// The fetch returned no records; the snapshot was kept.
    Unchanged,
    /// Another refresh of the same source was in flight; waited for it instead.
    Joined,
}

#[derive(Debug, Default)]
struct SourceState {
    snapshot: Arc<SourceSnapshot>,
    consecutive_failures: u32,
    retry_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct SourceSlot {
    state: RwLock<SourceState>,
    refresh_lock: Mutex<()>,
}

impl SourceSlot {
    fn snapshot(&self) -> Arc<SourceSnapshot> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&state.snapshot)
    }

    fn refresh_due(&self, now: DateTime<Utc>, staleness: TimeDelta) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let stale = match state.snapshot.refreshed_at {
            None => true,
            Some(refreshed_at) => now - refreshed_at > staleness,
        };
        // Back-off only delays a refresh that staleness already calls for.
        stale && state.retry_at.map_or(true, |retry_at| now >= retry_at)
    }

    fn is_cold(&self) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.snapshot.refreshed_at.is_none()
    }
}

pub struct ObservationCache {
    fetcher: Arc<dyn ObservationFetcher>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
    domestic: SourceSlot,
    continental: SourceSlot,
}

#[bon]
impl ObservationCache {
    #[builder]
    pub fn new(
        fetcher: Arc<dyn ObservationFetcher>,
        config: Option<CacheConfig>,
        clock: Option<Arc<dyn Clock>>,
    ) -> Self {
        Self {
            fetcher,
            clock: clock.unwrap_or_else(|| Arc::new(SystemClock)),
            config: config.unwrap_or_default(),
            domestic: SourceSlot::default(),
            continental: SourceSlot::default(),
        }
    }

    fn slot(&self, source: Source) -> &SourceSlot {
        match source {
            Source::Domestic => &self.domestic,
            Source::Continental => &self.continental,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The current snapshot of `source`, without triggering a refresh.
    pub fn snapshot(&self, source: Source) -> Arc<SourceSnapshot> {
        self.slot(source).snapshot()
    }

    /// Returns the observations of `source`, refreshing them first if they are
    /// older than the source's staleness window.
    ///
    /// Fetch failures are logged and the previous snapshot is served. If a refresh
    /// is already in flight, the call serves the current snapshot, or waits for
    /// the in-flight refresh when the cache is still cold. It never starts a
    /// second fetch.
    pub async fn get(&self, source: Source) -> CachedObservations {
        let slot = self.slot(source);
        let staleness = self.config.staleness(source);

        if slot.refresh_due(self.clock.now(), staleness) {
            match slot.refresh_lock.try_lock() {
                Ok(_guard) => {
                    if slot.refresh_due(self.clock.now(), staleness) {
                        if let Err(e) = self.fetch_and_install(source).await {
                            warn!("Refreshing {} observations failed: {}", source, e);
                        }
                    }
                }
                Err(_) if slot.is_cold() => {
                    debug!("Waiting for in-flight {} refresh", source);
                    let _guard = slot.refresh_lock.lock().await;
                }
                Err(_) => {
                    debug!("{} refresh in flight, serving previous snapshot", source);
                }
            }
        }

        self.cached(source)
    }

    /// Fetches `source` now, regardless of its age.
    ///
    /// Unlike [`ObservationCache::get`], failures are returned to the caller. The
    /// previous snapshot is kept either way.
    pub async fn refresh(&self, source: Source) -> Result<RefreshOutcome, FetchError> {
        let slot = self.slot(source);
        match slot.refresh_lock.try_lock() {
            Ok(_guard) => self.fetch_and_install(source).await,
            Err(_) => {
                let _guard = slot.refresh_lock.lock().await;
                Ok(RefreshOutcome::Joined)
            }
        }
    }

    /// Latest observation per station across both sources.
    ///
    /// When both sources report a station, the record with the newer timestamp
    /// is used as a whole; values are never combined field by field.
    pub async fn merged(&self) -> ObservationSet {
        let (domestic, continental) =
            tokio::join!(self.get(Source::Domestic), self.get(Source::Continental));
        merge_latest([&domestic.snapshot, &continental.snapshot])
    }

    fn cached(&self, source: Source) -> CachedObservations {
        let snapshot = self.slot(source).snapshot();
        let age = snapshot.refreshed_at.map(|t| self.clock.now() - t);
        if let Some(age) = age {
            if age > self.config.staleness(source) {
                warn!(
                    "Serving stale {} observations ({} minutes old)",
                    source,
                    age.num_minutes()
                );
            }
        }
        CachedObservations { snapshot, age }
    }

    /// Must be called with the source's refresh lock held.
    async fn fetch_and_install(&self, source: Source) -> Result<RefreshOutcome, FetchError> {
        let slot = self.slot(source);
        debug!("Fetching {} observations", source);
        let result = self.fetcher.fetch(source).await;
        let now = self.clock.now();

        let mut state = slot.state.write().unwrap_or_else(PoisonError::into_inner);
        match result {
            Ok(batch) if batch.is_empty() => {
                self.back_off(&mut state, source, now);
                Ok(RefreshOutcome::Unchanged)
            }
            Ok(batch) => {
                let records = batch.len();
                let mut observations = state.snapshot.observations.clone();
                for raw in batch {
                    let incoming = Observation::from_raw(raw, source);
                    match observations.get(&incoming.station_id) {
                        Some(existing) if existing.timestamp > incoming.timestamp => {}
                        _ => {
                            observations.insert(incoming.station_id, incoming);
                        }
                    }
                }
                info!(
                    "Refreshed {} observations: {} records, {} stations cached",
                    source,
                    records,
                    observations.len()
                );
                state.snapshot = Arc::new(SourceSnapshot {
                    observations,
                    refreshed_at: Some(now),
                });
                state.consecutive_failures = 0;
                state.retry_at = None;
                Ok(RefreshOutcome::Updated { records })
            }
            Err(e) => {
                self.back_off(&mut state, source, now);
                Err(e)
            }
        }
    }

    fn back_off(&self, state: &mut SourceState, source: Source, now: DateTime<Utc>) {
        state.consecutive_failures += 1;
        let delay = backoff_delay(&self.config, state.consecutive_failures);
        state.retry_at = Some(now + delay);
        debug!(
            "No update for {}, trying again in {}s",
            source,
            delay.num_seconds()
        );
    }
}

fn backoff_delay(config: &CacheConfig, failures: u32) -> TimeDelta {
    let exponent = failures.saturating_sub(1).min(64) as i32;
    let min_ms = config.min_backoff.num_milliseconds() as f64;
    let max_ms = config.max_backoff.num_milliseconds() as f64;
    let delay_ms = (min_ms * config.backoff_factor.powi(exponent)).min(max_ms);
    TimeDelta::milliseconds(delay_ms as i64)
}

fn merge_latest<'a>(snapshots: impl IntoIterator<Item = &'a Arc<SourceSnapshot>>) -> ObservationSet {
    let mut merged = ObservationSet::new();
    for snapshot in snapshots {
        for (id, observation) in &snapshot.observations {
            match merged.get(id) {
                Some(existing) if existing.timestamp >= observation.timestamp => {}
                _ => {
                    merged.insert(*id, observation.clone());
                }
            }
        }
    }
    merged
}
