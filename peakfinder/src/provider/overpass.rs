//! Overpass API client with endpoint failover.
//!
//! Queries public Overpass instances for nodes tagged `natural=peak`,
//! either around a point or within a bounding box. Equivalent
//! endpoints are tried in order; an individual endpoint failure is
//! logged and recovered locally, and the whole operation fails only
//! when every endpoint has failed.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::http::AsyncHttpClient;
use super::types::{PeakProvider, ProviderError};
use crate::elevation::parse_elevation;
use crate::geo::{Point, Tile};
use crate::peak::{Peak, UNNAMED_PEAK};

/// Server-side query timeout in seconds, embedded in the query text.
const OVERPASS_TIMEOUT_SECS: u32 = 25;

/// Equivalent public Overpass endpoints, tried in order.
pub const DEFAULT_ENDPOINTS: [&str; 2] = [
    "https://overpass-api.de/api/interpreter",
    "https://overpass.kumi.systems/api/interpreter",
];

/// Overpass client over any [`AsyncHttpClient`].
pub struct OverpassClient<H> {
    http: H,
    endpoints: Vec<String>,
}

impl<H: AsyncHttpClient> OverpassClient<H> {
    /// Creates a client against the default public endpoints.
    pub fn new(http: H) -> Self {
        Self::with_endpoints(http, DEFAULT_ENDPOINTS.iter().map(|s| s.to_string()))
    }

    /// Creates a client against a custom endpoint list, tried in order.
    pub fn with_endpoints(http: H, endpoints: impl IntoIterator<Item = String>) -> Self {
        Self {
            http,
            endpoints: endpoints.into_iter().collect(),
        }
    }

    /// Builds the around-point query.
    fn around_query(center: Point, radius_m: f64, ele_only: bool) -> String {
        format!(
            "[out:json][timeout:{}];\nnode(around:{},{},{})[natural=peak]{};\nout body qt;",
            OVERPASS_TIMEOUT_SECS,
            radius_m.floor() as u64,
            center.lat,
            center.lon,
            ele_filter(ele_only),
        )
    }

    /// Builds the bounding-box query.
    fn bbox_query(tile: &Tile, ele_only: bool) -> String {
        format!(
            "[out:json][timeout:{}];\nnode({},{},{},{})[natural=peak]{};\nout body qt;",
            OVERPASS_TIMEOUT_SECS,
            tile.south,
            tile.west,
            tile.north,
            tile.east,
            ele_filter(ele_only),
        )
    }

    /// Runs a query against each endpoint in turn until one succeeds.
    ///
    /// Both transport failures and undecodable bodies count as
    /// endpoint failures and fail over. Cancellation abandons the
    /// in-flight request immediately.
    async fn execute(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Peak>, ProviderError> {
        // Bound outside the select so the in-flight request future
        // never outlives the borrow it holds.
        let params = [("data", query)];
        for url in &self.endpoints {
            let outcome = tokio::select! {
                biased;

                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                res = self.http.post_form(url, &params) => res,
            };

            match outcome.and_then(|body| parse_elements(&body)) {
                Ok(peaks) => return Ok(peaks),
                Err(e) => {
                    warn!(endpoint = url.as_str(), error = %e, "Overpass endpoint failed");
                }
            }
        }

        Err(ProviderError::AllEndpointsFailed {
            attempts: self.endpoints.len(),
        })
    }
}

/// Optional elevation-tag restriction appended to the node filter.
fn ele_filter(ele_only: bool) -> &'static str {
    if ele_only {
        "[\"ele\"]"
    } else {
        ""
    }
}

#[derive(Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: HashMap<String, Value>,
}

/// Decodes an Overpass JSON body into peaks.
fn parse_elements(body: &[u8]) -> Result<Vec<Peak>, ProviderError> {
    let response: OverpassResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    let peaks = response
        .elements
        .into_iter()
        .filter(|el| el.kind == "node")
        .filter_map(|el| {
            let (lat, lon) = (el.lat?, el.lon?);
            let ele = el.tags.get("ele");
            Some(Peak {
                id: Some(el.id),
                name: el
                    .tags
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or(UNNAMED_PEAK)
                    .to_string(),
                location: Point::new(lat, lon),
                elevation_m: parse_elevation(ele),
                elevation_raw: ele.map(raw_text),
                distance_m: None,
            })
        })
        .collect();

    Ok(peaks)
}

/// Raw tag text preserved for display.
fn raw_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl<H: AsyncHttpClient> PeakProvider for OverpassClient<H> {
    async fn fetch_around_point(
        &self,
        center: Point,
        radius_m: f64,
        ele_only: bool,
        cancel: CancellationToken,
    ) -> Result<Vec<Peak>, ProviderError> {
        let query = Self::around_query(center, radius_m, ele_only);
        self.execute(&query, &cancel).await
    }

    async fn fetch_bounding_box(
        &self,
        tile: Tile,
        ele_only: bool,
        cancel: CancellationToken,
    ) -> Result<Vec<Peak>, ProviderError> {
        let query = Self::bbox_query(&tile, ele_only);
        self.execute(&query, &cancel).await
    }
}
