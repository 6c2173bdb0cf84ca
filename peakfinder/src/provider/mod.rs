//! Remote query client for the geospatial feature database.
//!
//! Exposes [`PeakProvider`], the trait the search engine depends on,
//! plus the concrete Overpass implementation and the HTTP seam used
//! to mock the network in tests.

mod http;
mod overpass;
mod types;

pub use http::{AsyncHttpClient, ReqwestClient};
pub use overpass::{OverpassClient, DEFAULT_ENDPOINTS};
pub use types::{PeakProvider, ProviderError};
