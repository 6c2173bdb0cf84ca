//! Search state published to display surfaces.

use crate::geo::Point;
use crate::peak::Peak;

/// Default search radius in miles.
pub const DEFAULT_RADIUS_MILES: f64 = 50.0;

/// Phase of the search state machine.
///
/// ```text
/// Idle → PendingLocation → Confirmed → Searching
///                              ▲           │
///                              └───────────┴──► {Completed, Cancelled, Failed}
/// ```
///
/// Terminal phases return control to `Confirmed` (radius edits and a
/// new search are allowed); a full reset returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// No location chosen.
    Idle,
    /// A location has been picked but not confirmed.
    PendingLocation,
    /// Location confirmed; radius may be edited freely.
    Confirmed,
    /// A search is running.
    Searching,
    /// A ranked list was produced.
    Completed,
    /// The search was aborted; never surfaced as an error.
    Cancelled,
    /// The search failed with a user-visible error.
    Failed,
}

impl SearchPhase {
    /// True when a new search may be started from this phase. Starting
    /// while `Searching` is allowed and cancels the in-flight search.
    pub fn can_start_search(&self) -> bool {
        !matches!(self, SearchPhase::Idle | SearchPhase::PendingLocation)
    }
}

/// Completed/total tile counters for a large-radius search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileProgress {
    pub done: usize,
    pub total: usize,
}

/// Snapshot of everything a display surface needs.
///
/// Owned by the orchestrator and mutated only by orchestrator-driven
/// transitions; consumers receive clones through a watch channel.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub phase: SearchPhase,
    /// Picked but not yet confirmed center.
    pub pending_center: Option<Point>,
    /// Confirmed search center.
    pub center: Option<Point>,
    /// Search radius in miles (converted to meters at the boundary).
    pub radius_miles: f64,
    /// Ranked results, descending by elevation, at most N entries.
    pub results: Vec<Peak>,
    pub in_progress: bool,
    /// Short human-readable failure text, if any.
    pub error: Option<String>,
    /// Tile counters, present only during a large-radius search.
    pub progress: Option<TileProgress>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            phase: SearchPhase::Idle,
            pending_center: None,
            center: None,
            radius_miles: DEFAULT_RADIUS_MILES,
            results: Vec::new(),
            in_progress: false,
            error: None,
            progress: None,
        }
    }
}
