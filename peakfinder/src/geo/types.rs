//! Geographic type definitions

use std::fmt;

/// Valid latitude range in degrees.
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range in degrees.
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Latitude clamp applied to tile spans to keep the circle-of-latitude
/// scale factor well away from zero at the poles.
pub const TILE_LAT_CLAMP: f64 = 89.9;

/// A point on the sphere in decimal degrees (WGS-84 approximation,
/// no datum correction).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Latitude (north positive), degrees.
    pub lat: f64,
    /// Longitude (east positive), degrees.
    pub lon: f64,
}

impl Point {
    /// Create a point, normalizing longitude into [-180, 180].
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon: super::normalize_lon(lon),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// A rectangular latitude/longitude sub-region used to bound a single
/// network query.
///
/// Bounds are in degrees with `south <= north`. A tile never spans the
/// antimeridian; [`circle_to_tiles`](super::circle_to_tiles) splits
/// wrapping spans before rasterizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Tile {
    /// Width of the tile in degrees of longitude.
    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    /// Height of the tile in degrees of latitude.
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Returns true if the point lies within the tile bounds.
    pub fn contains(&self, p: &Point) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lon >= self.west && p.lon <= self.east
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.4},{:.4})..({:.4},{:.4})",
            self.south, self.west, self.north, self.east
        )
    }
}
