//! Provider errors and the peak query trait.

use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::geo::{Point, Tile};
use crate::peak::Peak;

/// Errors that can occur while querying the feature database.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    /// A single endpoint failed (transport error or non-success status).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Every configured endpoint failed for this request.
    #[error("All {attempts} endpoints failed")]
    AllEndpointsFailed { attempts: usize },

    /// The endpoint answered with a body that could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request was abandoned because its cancellation token fired.
    /// Callers treat this as silent termination, never a user-visible
    /// failure.
    #[error("Request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Returns true when this error is a cancellation rather than a
    /// real failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Cancelled)
    }
}

/// Trait for peak feature providers.
///
/// The seam between the search engine and the geospatial database.
/// Implementors map provider features into [`Peak`]s; tests substitute
/// scripted implementations.
pub trait PeakProvider: Send + Sync {
    /// Fetch all peaks within `radius_m` of `center`.
    ///
    /// `ele_only` restricts results to features carrying an elevation
    /// attribute, shrinking payloads for broad searches. The request
    /// is abandoned with [`ProviderError::Cancelled`] when `cancel`
    /// fires.
    fn fetch_around_point(
        &self,
        center: Point,
        radius_m: f64,
        ele_only: bool,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Vec<Peak>, ProviderError>> + Send;

    /// Fetch all peaks within a rectangular region.
    fn fetch_bounding_box(
        &self,
        tile: Tile,
        ele_only: bool,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Vec<Peak>, ProviderError>> + Send;
}
