//! PeakFinder - concurrent top-N mountain peak search
//!
//! This library finds the N highest peaks within a radius of a point,
//! querying the Overpass API with endpoint failover, tiling large
//! search circles into bounding-box queries fetched through a
//! bounded-concurrency pool, and streaming partial ranked results as
//! tiles complete.
//!
//! # High-Level API
//!
//! Most callers drive the [`search::SearchOrchestrator`]:
//!
//! ```ignore
//! use peakfinder::geo::Point;
//! use peakfinder::provider::{OverpassClient, ReqwestClient};
//! use peakfinder::search::{SearchConfig, SearchOrchestrator};
//!
//! let provider = OverpassClient::new(ReqwestClient::new()?);
//! let mut orch = SearchOrchestrator::new(provider, SearchConfig::default());
//!
//! orch.pick_location(Point::new(45.0, -73.0));
//! orch.confirm_location();
//! orch.set_radius(50.0);
//! orch.start_search();
//! ```

pub mod cache;
pub mod elevation;
pub mod geo;
pub mod logging;
pub mod peak;
pub mod pool;
pub mod provider;
pub mod ranking;
pub mod search;

/// Version of the PeakFinder library and CLI.
///
/// Synchronized across all components in the workspace; defined in
/// `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
