//! Integration tests for the search orchestrator.
//!
//! These tests verify the complete search flow including:
//! - Around-point searches producing a ranked result list
//! - Tiled searches with caching, staleness and dedup
//! - Cancellation and supersession of in-flight searches
//!
//! Run with: `cargo test --test search_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use peakfinder::cache::TileCache;
use peakfinder::geo::{circle_to_tiles, miles_to_meters, Point, Tile};
use peakfinder::peak::Peak;
use peakfinder::provider::{PeakProvider, ProviderError};
use peakfinder::search::{SearchConfig, SearchOrchestrator, SearchPhase, SearchState};

// ============================================================================
// Mock Implementations
// ============================================================================

/// Scripted provider: the first around-point call may answer slowly
/// with one peak set, later calls answer quickly with another.
/// Bounding-box calls return the whole `world` list for every tile,
/// which forces the search to deduplicate across tiles.
///
/// Deliberately ignores the cancellation token so the tests exercise
/// the state-guard path for results that arrive after supersession.
struct MockProvider {
    around_first: Vec<Peak>,
    around_rest: Vec<Peak>,
    first_delay: Duration,
    rest_delay: Duration,
    world: Vec<Peak>,
    bbox_error: Option<String>,
    bbox_delay: Duration,
    around_calls: AtomicUsize,
    bbox_calls: AtomicUsize,
}

impl MockProvider {
    fn with_around(peaks: Vec<Peak>) -> Arc<Self> {
        Arc::new(Self {
            around_first: peaks.clone(),
            around_rest: peaks,
            first_delay: Duration::ZERO,
            rest_delay: Duration::ZERO,
            world: Vec::new(),
            bbox_error: None,
            bbox_delay: Duration::ZERO,
            around_calls: AtomicUsize::new(0),
            bbox_calls: AtomicUsize::new(0),
        })
    }

    fn with_world(peaks: Vec<Peak>) -> Arc<Self> {
        Arc::new(Self {
            around_first: Vec::new(),
            around_rest: Vec::new(),
            first_delay: Duration::ZERO,
            rest_delay: Duration::ZERO,
            world: peaks,
            bbox_error: None,
            bbox_delay: Duration::from_millis(2),
            around_calls: AtomicUsize::new(0),
            bbox_calls: AtomicUsize::new(0),
        })
    }

    fn bbox_calls(&self) -> usize {
        self.bbox_calls.load(Ordering::SeqCst)
    }
}

impl MockProvider {
    async fn around(&self) -> Result<Vec<Peak>, ProviderError> {
        let call = self.around_calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            tokio::time::sleep(self.first_delay).await;
            Ok(self.around_first.clone())
        } else {
            tokio::time::sleep(self.rest_delay).await;
            Ok(self.around_rest.clone())
        }
    }

    async fn bbox(&self) -> Result<Vec<Peak>, ProviderError> {
        self.bbox_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.bbox_delay).await;
        if let Some(msg) = &self.bbox_error {
            return Err(ProviderError::Http(msg.clone()));
        }
        Ok(self.world.clone())
    }
}

/// Handle given to the orchestrator, leaving the test with its own
/// counter-reading reference to the same mock.
#[derive(Clone)]
struct SharedProvider(Arc<MockProvider>);

impl PeakProvider for SharedProvider {
    async fn fetch_around_point(
        &self,
        _center: Point,
        _radius_m: f64,
        _ele_only: bool,
        _cancel: CancellationToken,
    ) -> Result<Vec<Peak>, ProviderError> {
        self.0.around().await
    }

    async fn fetch_bounding_box(
        &self,
        _tile: Tile,
        _ele_only: bool,
        _cancel: CancellationToken,
    ) -> Result<Vec<Peak>, ProviderError> {
        self.0.bbox().await
    }
}

fn peak(id: i64, name: &str, lat: f64, lon: f64, ele: Option<f64>) -> Peak {
    Peak {
        id: Some(id),
        name: name.to_string(),
        location: Point::new(lat, lon),
        elevation_m: ele,
        elevation_raw: ele.map(|e| e.to_string()),
        distance_m: None,
    }
}

/// Drives the orchestrator through pick/confirm/radius and starts a
/// search, returning a subscribed receiver.
fn start(
    orch: &mut SearchOrchestrator<SharedProvider>,
    center: Point,
    radius_miles: f64,
) -> watch::Receiver<SearchState> {
    orch.pick_location(center);
    orch.confirm_location();
    orch.set_radius(radius_miles);
    let rx = orch.subscribe();
    orch.start_search();
    rx
}

/// Waits for the current search to reach a terminal phase.
async fn wait_terminal(rx: &mut watch::Receiver<SearchState>) -> SearchState {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            {
                let state = rx.borrow_and_update().clone();
                if matches!(
                    state.phase,
                    SearchPhase::Completed | SearchPhase::Failed | SearchPhase::Cancelled
                ) {
                    return state;
                }
            }
            rx.changed().await.expect("state channel closed");
        }
    })
    .await
    .expect("search did not terminate")
}

// ============================================================================
// Around-point searches
// ============================================================================

#[tokio::test]
async fn test_small_radius_search_ranks_by_elevation() {
    let center = Point::new(45.0, -73.0);
    let provider = MockProvider::with_around(vec![
        peak(1, "Low", 45.01, -73.00, Some(500.0)),
        peak(2, "High", 45.02, -73.01, Some(1500.0)),
        peak(3, "Mid", 44.99, -73.02, Some(800.0)),
    ]);
    let mut orch = SearchOrchestrator::new(SharedProvider(provider), SearchConfig::default());

    let mut rx = start(&mut orch, center, 30.0);
    let state = wait_terminal(&mut rx).await;

    assert_eq!(state.phase, SearchPhase::Completed);
    let names: Vec<&str> = state.results.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["High", "Mid", "Low"]);
    for p in &state.results {
        let d = p.distance_m.expect("distance should be derived");
        assert!(d > 0.0 && d < 50_000.0);
    }
    assert!(!state.in_progress);
    assert!(state.progress.is_none());
}

#[tokio::test]
async fn test_candidates_outside_radius_are_dropped() {
    let center = Point::new(45.0, -73.0);
    // 1.5 degrees of latitude is ~167 km, far beyond a 30 mile radius.
    let provider = MockProvider::with_around(vec![
        peak(1, "Near", 45.01, -73.00, Some(500.0)),
        peak(2, "Far", 46.5, -73.00, Some(3000.0)),
    ]);
    let mut orch = SearchOrchestrator::new(SharedProvider(provider), SearchConfig::default());

    let mut rx = start(&mut orch, center, 30.0);
    let state = wait_terminal(&mut rx).await;

    assert_eq!(state.phase, SearchPhase::Completed);
    assert_eq!(state.results.len(), 1);
    assert_eq!(state.results[0].name, "Near");
}

#[tokio::test]
async fn test_result_limit_respected() {
    let center = Point::new(45.0, -73.0);
    let peaks: Vec<Peak> = (0..10)
        .map(|i| {
            peak(
                i,
                &format!("Peak {}", i),
                45.0 + 0.001 * i as f64,
                -73.0,
                Some(100.0 * i as f64),
            )
        })
        .collect();
    let provider = MockProvider::with_around(peaks);
    let config = SearchConfig::default().with_result_limit(3);
    let mut orch = SearchOrchestrator::new(SharedProvider(provider), config);

    let mut rx = start(&mut orch, center, 30.0);
    let state = wait_terminal(&mut rx).await;

    assert_eq!(state.results.len(), 3);
    assert_eq!(state.results[0].name, "Peak 9");
}

// ============================================================================
// Tiled searches
// ============================================================================

#[tokio::test]
async fn test_tiled_search_deduplicates_across_tiles() {
    let center = Point::new(45.0, -73.0);
    // Every tile fetch returns the same six peaks, so without dedup
    // the aggregator would see each one once per tile.
    let world: Vec<Peak> = (0..6)
        .map(|i| {
            peak(
                i,
                &format!("Peak {}", i),
                45.0 + 0.002 * i as f64,
                -73.0,
                Some(1000.0 + 10.0 * i as f64),
            )
        })
        .collect();
    let provider = MockProvider::with_world(world);
    let mut orch =
        SearchOrchestrator::new(SharedProvider(Arc::clone(&provider)), SearchConfig::default());

    let mut rx = start(&mut orch, center, 150.0);
    let state = wait_terminal(&mut rx).await;

    assert_eq!(state.phase, SearchPhase::Completed);
    assert!(provider.bbox_calls() > 1, "expected multiple tile fetches");
    assert_eq!(state.results.len(), 5);
    let mut ids: Vec<i64> = state.results.iter().filter_map(|p| p.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), 5, "results must be unique");
    assert_eq!(state.results[0].name, "Peak 5");
    for pair in state.results.windows(2) {
        assert!(pair[0].elevation_m >= pair[1].elevation_m);
    }
}

#[tokio::test]
async fn test_progress_reported_while_tiling() {
    let center = Point::new(45.0, -73.0);
    let provider = MockProvider::with_world(vec![peak(1, "Solo", 45.0, -73.0, Some(900.0))]);
    let mut orch = SearchOrchestrator::new(SharedProvider(provider), SearchConfig::default());

    let mut rx = start(&mut orch, center, 150.0);
    let mut saw_progress = false;
    let state = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            {
                let state = rx.borrow_and_update().clone();
                if let Some(progress) = state.progress {
                    assert!(progress.done <= progress.total);
                    saw_progress = true;
                }
                if state.phase != SearchPhase::Searching {
                    return state;
                }
            }
            rx.changed().await.expect("state channel closed");
        }
    })
    .await
    .expect("search did not terminate");

    assert!(saw_progress, "expected at least one tile progress update");
    assert_eq!(state.phase, SearchPhase::Completed);
    assert!(state.progress.is_none(), "progress cleared on completion");
}

#[tokio::test]
async fn test_fresh_tiles_served_from_cache() {
    let center = Point::new(45.0, -73.0);
    let provider = MockProvider::with_world(vec![peak(1, "Solo", 45.0, -73.0, Some(900.0))]);
    let mut orch =
        SearchOrchestrator::new(SharedProvider(Arc::clone(&provider)), SearchConfig::default());

    let mut rx = start(&mut orch, center, 150.0);
    wait_terminal(&mut rx).await;
    let first_run = provider.bbox_calls();
    assert!(first_run > 0);

    // Same circle again while every tile is still fresh.
    orch.start_search();
    let state = wait_terminal(&mut rx).await;

    assert_eq!(state.phase, SearchPhase::Completed);
    assert_eq!(
        provider.bbox_calls(),
        first_run,
        "fresh tiles must not be refetched"
    );
    assert_eq!(state.results.len(), 1);
}

#[tokio::test]
async fn test_stale_tiles_are_refetched() {
    let center = Point::new(45.0, -73.0);
    let provider = MockProvider::with_world(vec![peak(1, "Solo", 45.0, -73.0, Some(900.0))]);
    let config = SearchConfig::default().with_staleness_window(Duration::from_millis(50));
    let mut orch = SearchOrchestrator::new(SharedProvider(Arc::clone(&provider)), config);

    let mut rx = start(&mut orch, center, 150.0);
    wait_terminal(&mut rx).await;
    let first_run = provider.bbox_calls();

    tokio::time::sleep(Duration::from_millis(120)).await;

    orch.start_search();
    let state = wait_terminal(&mut rx).await;

    assert_eq!(state.phase, SearchPhase::Completed);
    assert_eq!(
        provider.bbox_calls(),
        2 * first_run,
        "stale tiles must be refetched"
    );
}

#[tokio::test]
async fn test_partially_cached_search_fetches_only_uncached_tile() {
    let center = Point::new(45.0, -73.0);
    let config = SearchConfig::default();
    let radius_miles = 150.0;
    let tiles = circle_to_tiles(
        &center,
        miles_to_meters(radius_miles),
        config.tile_km(radius_miles),
    );
    assert!(tiles.len() > 1);

    // Every tile except the first is pre-seeded fresh; a miss behaves
    // exactly like a stale entry, so only that one tile hits the
    // network. The fetched tile repeats the cached peak, which must
    // be deduplicated when the results merge.
    let cached = peak(1, "Cached Summit", 45.0, -73.0, Some(99.0));
    let cache = Arc::new(TileCache::default());
    for tile in &tiles[1..] {
        cache.put(TileCache::key(tile), vec![cached.clone()]);
    }

    let provider = MockProvider::with_world(vec![
        cached.clone(),
        peak(2, "Fetched Summit", 45.01, -73.0, Some(1.0)),
    ]);
    let mut orch = SearchOrchestrator::with_cache(
        SharedProvider(Arc::clone(&provider)),
        config,
        Arc::clone(&cache),
    );

    let mut rx = start(&mut orch, center, radius_miles);
    let state = wait_terminal(&mut rx).await;

    assert_eq!(state.phase, SearchPhase::Completed);
    assert_eq!(
        provider.bbox_calls(),
        1,
        "fresh tiles must come from the cache"
    );
    let names: Vec<&str> = state.results.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Cached Summit", "Fetched Summit"]);
    assert_eq!(cache.entry_count(), tiles.len(), "fetched tile is stored");
}

#[tokio::test]
async fn test_tile_failure_fails_the_search() {
    let center = Point::new(45.0, -73.0);
    let provider = Arc::new(MockProvider {
        around_first: Vec::new(),
        around_rest: Vec::new(),
        first_delay: Duration::ZERO,
        rest_delay: Duration::ZERO,
        world: Vec::new(),
        bbox_error: Some("HTTP 504 from endpoint".to_string()),
        bbox_delay: Duration::ZERO,
        around_calls: AtomicUsize::new(0),
        bbox_calls: AtomicUsize::new(0),
    });
    let mut orch = SearchOrchestrator::new(SharedProvider(provider), SearchConfig::default());

    let mut rx = start(&mut orch, center, 150.0);
    let state = wait_terminal(&mut rx).await;

    assert_eq!(state.phase, SearchPhase::Failed);
    assert!(!state.in_progress);
    let error = state.error.expect("failure must carry an error");
    assert!(error.contains("HTTP 504"));
}

// ============================================================================
// Supersession and validation
// ============================================================================

#[tokio::test]
async fn test_superseded_search_results_never_surface() {
    let center = Point::new(45.0, -73.0);
    // First search answers slowly with "Stale Summit"; the second,
    // started before the first returns, answers quickly with "Fresh
    // Summit". The provider ignores cancellation, so the slow result
    // does arrive and must be discarded by the state guard.
    let provider = Arc::new(MockProvider {
        around_first: vec![peak(1, "Stale Summit", 45.01, -73.0, Some(2000.0))],
        around_rest: vec![peak(2, "Fresh Summit", 45.01, -73.0, Some(1000.0))],
        first_delay: Duration::from_millis(200),
        rest_delay: Duration::from_millis(5),
        world: Vec::new(),
        bbox_error: None,
        bbox_delay: Duration::ZERO,
        around_calls: AtomicUsize::new(0),
        bbox_calls: AtomicUsize::new(0),
    });
    let mut orch = SearchOrchestrator::new(SharedProvider(provider), SearchConfig::default());

    let mut rx = start(&mut orch, center, 30.0);
    // Supersede immediately, while the first fetch is still sleeping.
    orch.start_search();

    let state = wait_terminal(&mut rx).await;
    assert_eq!(state.phase, SearchPhase::Completed);

    // Wait past the first provider's reply, then confirm it never
    // overwrote the newer search's results.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let state = orch.state();
    assert_eq!(state.phase, SearchPhase::Completed);
    let names: Vec<&str> = state.results.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Fresh Summit"]);
}

#[tokio::test]
async fn test_cancel_keeps_center_and_discards_results() {
    let center = Point::new(45.0, -73.0);
    let provider = Arc::new(MockProvider {
        around_first: vec![peak(1, "Slow Summit", 45.01, -73.0, Some(2000.0))],
        around_rest: Vec::new(),
        first_delay: Duration::from_millis(200),
        rest_delay: Duration::ZERO,
        world: Vec::new(),
        bbox_error: None,
        bbox_delay: Duration::ZERO,
        around_calls: AtomicUsize::new(0),
        bbox_calls: AtomicUsize::new(0),
    });
    let mut orch = SearchOrchestrator::new(SharedProvider(provider), SearchConfig::default());

    let mut rx = start(&mut orch, center, 30.0);
    orch.cancel_or_reset();

    let state = wait_terminal(&mut rx).await;
    assert_eq!(state.phase, SearchPhase::Cancelled);
    assert_eq!(state.center, Some(center), "cancel keeps the location");
    assert!(state.error.is_none(), "cancellation is not an error");

    // The slow result arrives later and must stay discarded.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let state = orch.state();
    assert!(state.results.is_empty());
    assert_eq!(state.phase, SearchPhase::Cancelled);
}

#[tokio::test]
async fn test_search_requires_confirmed_location() {
    let provider = MockProvider::with_around(Vec::new());
    let mut orch = SearchOrchestrator::new(SharedProvider(provider), SearchConfig::default());

    orch.start_search();
    let state = orch.state();
    assert!(!state.in_progress);
    assert_ne!(state.phase, SearchPhase::Searching);
    assert_eq!(state.error.as_deref(), Some("Please confirm a location first."));

    // Picking without confirming is still not enough.
    orch.pick_location(Point::new(45.0, -73.0));
    orch.start_search();
    let state = orch.state();
    assert!(!state.in_progress);
    assert_eq!(state.error.as_deref(), Some("Please confirm a location first."));
}

#[tokio::test]
async fn test_empty_result_set_completes_cleanly() {
    let provider = MockProvider::with_around(Vec::new());
    let mut orch = SearchOrchestrator::new(SharedProvider(provider), SearchConfig::default());

    let mut rx = start(&mut orch, Point::new(45.0, -73.0), 30.0);
    let state = wait_terminal(&mut rx).await;

    assert_eq!(state.phase, SearchPhase::Completed);
    assert!(state.results.is_empty());
    assert!(state.error.is_none());
}
