//! Search orchestration: state machine, strategy selection and the
//! task that drives a single search run.

mod config;
mod orchestrator;
mod state;
mod strategy;

pub use config::SearchConfig;
pub use orchestrator::{SearchError, SearchOrchestrator};
pub use state::{SearchPhase, SearchState, TileProgress, DEFAULT_RADIUS_MILES};
pub use strategy::SearchStrategy;
