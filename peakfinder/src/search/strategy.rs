//! Strategy selection.
//!
//! The small-radius and tiled strategies carry different invariants
//! (dedup key handling, filter order, streaming vs. one-shot
//! ranking), so the choice is made once per search as a tagged
//! variant rather than branching inside shared helpers.

use super::config::SearchConfig;

/// How a single search will query the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchStrategy {
    /// One around-point query (radius under the small-radius
    /// threshold), optionally restricted to elevation-bearing
    /// features for very broad searches.
    AroundPoint { ele_only: bool },
    /// Tile the circle and stream bounding-box queries through the
    /// worker pool.
    Tiled { tile_km: f64 },
}

impl SearchStrategy {
    /// Choose the strategy for a radius. Called exactly once per
    /// search, when it starts.
    pub fn choose(radius_miles: f64, config: &SearchConfig) -> Self {
        if radius_miles < config.small_radius_threshold_miles {
            SearchStrategy::AroundPoint {
                ele_only: radius_miles >= config.ele_only_threshold_miles,
            }
        } else {
            SearchStrategy::Tiled {
                tile_km: config.tile_km(radius_miles),
            }
        }
    }
}
