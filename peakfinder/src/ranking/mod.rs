//! Candidate ranking: streaming top-N selection and grid-based
//! simplification of dense candidate sets.

mod aggregator;
mod grid;

pub use aggregator::{top_n, TopNAggregator};
pub use grid::simplify_by_grid;
