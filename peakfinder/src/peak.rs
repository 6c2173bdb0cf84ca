//! Peak model.

use crate::geo::Point;

/// Display name used when the provider has no `name` tag.
pub const UNNAMED_PEAK: &str = "Unnamed peak";

/// A geographic point tagged as a summit by the data provider.
///
/// Unknown elevation is a valid state, not an error: the raw tag text
/// is retained so a display surface can still show something when
/// parsing failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Peak {
    /// Provider-assigned identifier, when present.
    pub id: Option<i64>,
    /// Display name, falling back to [`UNNAMED_PEAK`].
    pub name: String,
    /// Location of the summit.
    pub location: Point,
    /// Elevation in meters, if it could be normalized.
    pub elevation_m: Option<f64>,
    /// Raw elevation tag text, kept for display when parsing fails.
    pub elevation_raw: Option<String>,
    /// Distance from the search center in meters. Derived by the
    /// search, not part of provider data.
    pub distance_m: Option<f64>,
}

impl Peak {
    /// Elevation used for ranking comparisons only: peaks without a
    /// known elevation sort below everything that has one.
    pub fn comparison_elevation(&self) -> f64 {
        self.elevation_m.unwrap_or(f64::NEG_INFINITY)
    }

    /// Dedup key: the provider id when present, otherwise the exact
    /// coordinates.
    pub fn key(&self) -> PeakKey {
        match self.id {
            Some(id) => PeakKey::Id(id),
            None => PeakKey::Coord {
                lat_bits: self.location.lat.to_bits(),
                lon_bits: self.location.lon.to_bits(),
            },
        }
    }
}

/// Identifier-or-coordinate dedup key for peaks.
///
/// Coordinates are compared by bit pattern; duplicates come from the
/// same provider payload, so equal positions are bit-identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeakKey {
    Id(i64),
    Coord { lat_bits: u64, lon_bits: u64 },
}
