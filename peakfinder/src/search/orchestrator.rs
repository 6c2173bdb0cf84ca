//! Search orchestration.
//!
//! The orchestrator owns the search state machine, the tile cache and
//! the single live cancellation token. Display surfaces drive it with
//! commands (`pick_location`, `confirm_location`, `set_radius`,
//! `start_search`, `cancel_or_reset`) and observe it through a watch
//! channel that receives a [`SearchState`] snapshot whenever anything
//! changes.
//!
//! Starting a search atomically invalidates the token of any prior
//! search: the old token is cancelled under the state lock, and every
//! state write performed by a search task re-checks its own token
//! under that same lock, so results tied to a cancelled token are
//! never merged into newer state.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::TileCache;
use crate::geo::{circle_to_tiles, haversine_distance, miles_to_meters, Point};
use crate::peak::{Peak, PeakKey};
use crate::pool::{run_pool, PoolError};
use crate::provider::{PeakProvider, ProviderError};
use crate::ranking::{simplify_by_grid, top_n, TopNAggregator};

use super::config::SearchConfig;
use super::state::{SearchPhase, SearchState, TileProgress};
use super::strategy::SearchStrategy;

/// Validation message when a search starts without a confirmed center.
const NO_LOCATION_MSG: &str = "Please confirm a location first.";

/// Validation message for a non-positive radius.
const BAD_RADIUS_MSG: &str = "Radius must be greater than zero.";

/// Errors terminating a search run.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    /// The provider failed after exhausting failover.
    #[error("{0}")]
    Provider(ProviderError),

    /// The search token was cancelled. Silent by contract: never
    /// surfaced to the user.
    #[error("search cancelled")]
    Cancelled,
}

impl From<ProviderError> for SearchError {
    fn from(e: ProviderError) -> Self {
        if e.is_cancelled() {
            SearchError::Cancelled
        } else {
            SearchError::Provider(e)
        }
    }
}

/// Drives searches against a [`PeakProvider`].
///
/// One orchestrator per session: the tile cache it owns is shared
/// across its searches, and at most one search token is live at a
/// time.
pub struct SearchOrchestrator<P> {
    provider: Arc<P>,
    cache: Arc<TileCache>,
    config: SearchConfig,
    shared: Arc<Mutex<SearchState>>,
    state_tx: watch::Sender<SearchState>,
    current_token: Option<CancellationToken>,
}

impl<P: PeakProvider + 'static> SearchOrchestrator<P> {
    /// Create an orchestrator with a fresh tile cache sized from the
    /// config's staleness window.
    pub fn new(provider: P, config: SearchConfig) -> Self {
        let cache = Arc::new(TileCache::new(config.staleness_window));
        Self::with_cache(provider, config, cache)
    }

    /// Create an orchestrator around an explicit cache, which may be
    /// shared or pre-seeded by the caller.
    pub fn with_cache(provider: P, config: SearchConfig, cache: Arc<TileCache>) -> Self {
        let state = SearchState::default();
        let (state_tx, _) = watch::channel(state.clone());
        Self {
            provider: Arc::new(provider),
            cache,
            config,
            shared: Arc::new(Mutex::new(state)),
            state_tx,
            current_token: None,
        }
    }

    /// Subscribe to state snapshots. The receiver immediately holds
    /// the current state.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state_tx.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> SearchState {
        self.shared.lock().clone()
    }

    /// The tile cache shared across this orchestrator's searches.
    pub fn cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    /// Pick a location. Re-picking while pending replaces the
    /// previous pick. Ignored while a search is running.
    pub fn pick_location(&mut self, point: Point) {
        let mut s = self.shared.lock();
        if s.phase == SearchPhase::Searching {
            debug!("pick_location ignored during search");
            return;
        }
        s.pending_center = Some(point);
        s.error = None;
        if s.center.is_none() {
            s.phase = SearchPhase::PendingLocation;
        }
        self.publish(&s);
    }

    /// Confirm the pending location. No-op when nothing is pending.
    pub fn confirm_location(&mut self) {
        let mut s = self.shared.lock();
        if let Some(point) = s.pending_center.take() {
            s.center = Some(point);
            s.phase = SearchPhase::Confirmed;
            s.error = None;
            self.publish(&s);
        }
    }

    /// Set the search radius in miles. May be edited freely; a search
    /// already running keeps the radius it started with.
    pub fn set_radius(&mut self, miles: f64) {
        let mut s = self.shared.lock();
        s.radius_miles = miles;
        self.publish(&s);
    }

    /// Start a search with the confirmed center and current radius.
    ///
    /// Cancels any in-flight search first. Rejected synchronously
    /// with a validation message when no location is confirmed or the
    /// radius is not positive; the search never starts in that case.
    pub fn start_search(&mut self) {
        let mut s = self.shared.lock();

        let center = match s.center {
            Some(center) if s.phase.can_start_search() => center,
            _ => {
                s.error = Some(NO_LOCATION_MSG.to_string());
                self.publish(&s);
                return;
            }
        };
        if s.radius_miles <= 0.0 {
            s.error = Some(BAD_RADIUS_MSG.to_string());
            self.publish(&s);
            return;
        }

        // Only one search token is live at a time. Cancelling under
        // the state lock means a superseded task can never write
        // state after this point.
        if let Some(prior) = self.current_token.take() {
            prior.cancel();
        }
        let token = CancellationToken::new();
        self.current_token = Some(token.clone());

        let radius_miles = s.radius_miles;
        s.phase = SearchPhase::Searching;
        s.in_progress = true;
        s.error = None;
        s.results.clear();
        s.progress = None;
        self.publish(&s);
        drop(s);

        let task = SearchTask {
            provider: Arc::clone(&self.provider),
            cache: Arc::clone(&self.cache),
            config: self.config.clone(),
            shared: Arc::clone(&self.shared),
            state_tx: self.state_tx.clone(),
            token,
            center,
            radius_miles,
        };
        tokio::spawn(task.run());
    }

    /// Cancel an in-flight search, or fully reset when idle.
    ///
    /// While a search runs this aborts it (never surfaced as an
    /// error) and keeps the confirmed center so another search can
    /// follow. When nothing is running it tears the whole state down
    /// to `Idle`.
    pub fn cancel_or_reset(&mut self) {
        let mut s = self.shared.lock();
        if let Some(token) = self.current_token.take() {
            token.cancel();
        }
        if s.in_progress {
            s.phase = SearchPhase::Cancelled;
            s.in_progress = false;
            s.progress = None;
            info!("Search cancelled");
        } else {
            *s = SearchState::default();
            info!("Search state reset");
        }
        self.publish(&s);
    }

    fn publish(&self, state: &SearchState) {
        let _ = self.state_tx.send(state.clone());
    }
}

impl<P> Drop for SearchOrchestrator<P> {
    fn drop(&mut self) {
        if let Some(token) = self.current_token.take() {
            token.cancel();
        }
    }
}

/// One search run: everything captured at start time plus the token
/// that scopes it.
struct SearchTask<P> {
    provider: Arc<P>,
    cache: Arc<TileCache>,
    config: SearchConfig,
    shared: Arc<Mutex<SearchState>>,
    state_tx: watch::Sender<SearchState>,
    token: CancellationToken,
    center: Point,
    radius_miles: f64,
}

impl<P: PeakProvider + 'static> SearchTask<P> {
    async fn run(self) {
        let strategy = SearchStrategy::choose(self.radius_miles, &self.config);
        info!(
            center = %self.center,
            radius_miles = self.radius_miles,
            ?strategy,
            "Search started"
        );

        let outcome = match strategy {
            SearchStrategy::AroundPoint { ele_only } => self.run_around_point(ele_only).await,
            SearchStrategy::Tiled { tile_km } => self.run_tiled(tile_km).await,
        };

        match outcome {
            Ok(ranked) => {
                info!(results = ranked.len(), "Search completed");
                self.update(|s| {
                    s.phase = SearchPhase::Completed;
                    s.in_progress = false;
                    s.progress = None;
                    s.results = ranked;
                });
            }
            Err(SearchError::Cancelled) => {
                // Silent termination: the canceller already moved the
                // state machine on, and this token may not touch
                // newer state.
                debug!("Search task discarded after cancellation");
            }
            Err(SearchError::Provider(e)) => {
                warn!(error = %e, "Search failed");
                self.update(|s| {
                    s.phase = SearchPhase::Failed;
                    s.in_progress = false;
                    s.progress = None;
                    s.error = Some(e.to_string());
                });
            }
        }
    }

    /// Small-radius strategy: one around-point query, optionally
    /// widened, then a one-shot top-N over the filtered set.
    async fn run_around_point(&self, ele_only: bool) -> Result<Vec<Peak>, SearchError> {
        let radius_m = miles_to_meters(self.radius_miles);

        let mut peaks = self
            .provider
            .fetch_around_point(self.center, radius_m, ele_only, self.token.clone())
            .await?;

        // A restricted query that came back thin gets widened by a
        // second unrestricted query, merged with dedup.
        if ele_only && peaks.len() < 2 * self.config.result_limit {
            debug!(found = peaks.len(), "Widening with non-ele-only query");
            let extra = self
                .provider
                .fetch_around_point(self.center, radius_m, false, self.token.clone())
                .await?;
            let mut seen: HashSet<PeakKey> = peaks.iter().map(|p| p.key()).collect();
            for peak in extra {
                if seen.insert(peak.key()) {
                    peaks.push(peak);
                }
            }
        }

        // Prefer elevation-bearing candidates when any exist; a set
        // with no elevations at all is still ranked (all unknown).
        let with_ele: Vec<Peak> = peaks
            .iter()
            .filter(|p| p.elevation_m.is_some())
            .cloned()
            .collect();
        let candidates = if with_ele.is_empty() { peaks } else { with_ele };

        let mut seen: HashSet<PeakKey> = HashSet::new();
        let mut filtered: Vec<Peak> = Vec::new();
        for mut peak in candidates {
            if !seen.insert(peak.key()) {
                continue;
            }
            let distance = haversine_distance(&self.center, &peak.location);
            if distance > radius_m {
                continue;
            }
            peak.distance_m = Some(distance);
            filtered.push(peak);
        }

        if self.config.should_simplify(self.radius_miles, filtered.len()) {
            let cell = self.config.simplify_cell_deg(self.radius_miles);
            debug!(candidates = filtered.len(), cell_deg = cell, "Simplifying by grid");
            filtered = simplify_by_grid(filtered, cell);
        }

        Ok(top_n(filtered, self.config.result_limit))
    }

    /// Large-radius strategy: tile the circle, stream bounding-box
    /// results through the pool into the aggregator, cache-first per
    /// tile, publishing a snapshot after every tile.
    async fn run_tiled(&self, tile_km: f64) -> Result<Vec<Peak>, SearchError> {
        let radius_m = miles_to_meters(self.radius_miles);
        let tiles = circle_to_tiles(&self.center, radius_m, tile_km);
        let total = tiles.len();
        info!(tiles = total, tile_km, "Tiled search");

        self.update(|s| s.progress = Some(TileProgress { done: 0, total }));

        let mut aggregator = TopNAggregator::new(self.config.result_limit);
        let mut seen: HashSet<PeakKey> = HashSet::new();
        let mut done = 0usize;

        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let token = self.token.clone();

        let outcome: Result<(), PoolError<ProviderError>> = run_pool(
            tiles,
            self.config.tile_concurrency,
            &self.token,
            move |tile| {
                let provider = Arc::clone(&provider);
                let cache = Arc::clone(&cache);
                let token = token.clone();
                async move {
                    let key = TileCache::key(&tile);
                    if let Some(peaks) = cache.get(&key) {
                        debug!(key = key.as_str(), "Tile served from cache");
                        return Ok(peaks);
                    }
                    let peaks = provider.fetch_bounding_box(tile, true, token).await?;
                    cache.put(key, peaks.clone());
                    Ok(peaks)
                }
            },
            |peaks: Vec<Peak>| {
                // Sequential drain: aggregator and dedup state are
                // only ever touched here.
                done += 1;
                for mut peak in peaks {
                    if seen.contains(&peak.key()) {
                        continue;
                    }
                    let distance = haversine_distance(&self.center, &peak.location);
                    if distance > radius_m {
                        continue;
                    }
                    seen.insert(peak.key());
                    peak.distance_m = Some(distance);
                    aggregator.offer(peak);
                }
                let snapshot = aggregator.snapshot();
                self.update(|s| {
                    s.progress = Some(TileProgress { done, total });
                    s.results = snapshot;
                });
            },
        )
        .await;

        match outcome {
            Ok(()) => Ok(aggregator.into_ranked()),
            Err(PoolError::Cancelled) => Err(SearchError::Cancelled),
            Err(PoolError::Worker(e)) => Err(SearchError::from(e)),
        }
    }

    /// Mutate and publish state, unless this task's token has been
    /// superseded. The token check happens under the state lock so a
    /// stale task can never race a newer search's writes.
    fn update<F: FnOnce(&mut SearchState)>(&self, mutate: F) {
        let mut s = self.shared.lock();
        if self.token.is_cancelled() {
            return;
        }
        mutate(&mut s);
        let snapshot = s.clone();
        drop(s);
        let _ = self.state_tx.send(snapshot);
    }
}
