//! Search configuration.

use std::time::Duration;

use crate::cache::DEFAULT_STALENESS_WINDOW;

/// Kilometers per mile, used for tile and cell sizing heuristics.
const KM_PER_MILE: f64 = 1.609;

/// Tunable thresholds for the search orchestrator.
///
/// Defaults reproduce the production behavior; tests shrink them to
/// exercise specific paths.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// N: size of the ranked result list.
    pub result_limit: usize,
    /// Radii below this use a single around-point query; at or above
    /// it the circle is tiled.
    pub small_radius_threshold_miles: f64,
    /// Radii at or above this restrict around-point queries to
    /// elevation-bearing features.
    pub ele_only_threshold_miles: f64,
    /// Radii at or above this are eligible for grid simplification.
    pub simplify_threshold_miles: f64,
    /// Candidate count above which grid simplification kicks in.
    pub simplify_candidate_limit: usize,
    /// Maximum tile fetches in flight.
    pub tile_concurrency: usize,
    /// Maximum age of a cached tile result before refetch.
    pub staleness_window: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_limit: 5,
            small_radius_threshold_miles: 100.0,
            ele_only_threshold_miles: 200.0,
            simplify_threshold_miles: 120.0,
            simplify_candidate_limit: 200,
            tile_concurrency: 6,
            staleness_window: DEFAULT_STALENESS_WINDOW,
        }
    }
}

impl SearchConfig {
    /// Set the result list size.
    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit;
        self
    }

    /// Set the small-radius strategy threshold in miles.
    pub fn with_small_radius_threshold(mut self, miles: f64) -> Self {
        self.small_radius_threshold_miles = miles;
        self
    }

    /// Set the maximum number of concurrent tile fetches.
    pub fn with_tile_concurrency(mut self, limit: usize) -> Self {
        self.tile_concurrency = limit;
        self
    }

    /// Set the cache staleness window.
    pub fn with_staleness_window(mut self, window: Duration) -> Self {
        self.staleness_window = window;
        self
    }

    /// Set the grid-simplification thresholds.
    pub fn with_simplify_thresholds(mut self, miles: f64, candidates: usize) -> Self {
        self.simplify_threshold_miles = miles;
        self.simplify_candidate_limit = candidates;
        self
    }

    /// Tile side in kilometers for a tiled search, scaled with the
    /// radius and bounded to [60, 120] km.
    pub fn tile_km(&self, radius_miles: f64) -> f64 {
        (radius_miles * KM_PER_MILE / 8.0).clamp(60.0, 120.0)
    }

    /// Grid-simplification cell size in degrees, scaled with the
    /// radius and bounded to [8, 40] km before conversion.
    pub fn simplify_cell_deg(&self, radius_miles: f64) -> f64 {
        let cell_km = (radius_miles * KM_PER_MILE / 15.0).clamp(8.0, 40.0);
        cell_km / 111.0
    }

    /// True when the candidate set is large enough to simplify for
    /// this radius.
    pub fn should_simplify(&self, radius_miles: f64, candidates: usize) -> bool {
        radius_miles >= self.simplify_threshold_miles && candidates > self.simplify_candidate_limit
    }
}
