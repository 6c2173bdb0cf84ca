//! Spherical geometry for search regions.
//!
//! Converts a (center, radius) circle into a covering raster of
//! rectangular [`Tile`]s sized to keep each network query small, and
//! computes great-circle distances between points.

mod types;


pub use types::{Point, Tile, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON, TILE_LAT_CLAMP};

/// Mean Earth radius in meters (spherical approximation).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Kilometers per degree of latitude (constant on a sphere).
pub const KM_PER_DEG_LAT: f64 = 111.32;

/// Meters per statute mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Minimum tile side in degrees, to avoid degenerate tiles.
const MIN_TILE_DEG: f64 = 0.05;

/// Convert a radius given in miles to meters.
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Normalize a longitude into [-180, 180].
pub fn normalize_lon(lon: f64) -> f64 {
    let mut v = lon;
    while v < MIN_LON {
        v += 360.0;
    }
    while v > MAX_LON {
        v -= 360.0;
    }
    v
}

/// Kilometers per degree of longitude at the given latitude.
///
/// Shrinks with the circle of latitude; guarded against returning zero
/// near the poles so callers can divide by it safely.
pub fn km_per_deg_lon(lat_deg: f64) -> f64 {
    let km = KM_PER_DEG_LAT * lat_deg.to_radians().cos();
    if km.abs() < 1e-6 {
        1e-6
    } else {
        km
    }
}

/// Great-circle distance between two points in meters.
///
/// Standard haversine formula on a sphere of radius
/// [`EARTH_RADIUS_M`]. Pure and deterministic.
pub fn haversine_distance(a: &Point, b: &Point) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Compute a covering set of rectangular tiles for a circle.
///
/// The circle's bounding degree-span is derived from the local
/// meters-per-degree scale, clamped in latitude to ±[`TILE_LAT_CLAMP`]
/// and normalized in longitude. Tiles are sized near `tile_km` per
/// side (never below 0.05°). When the normalized span crosses the
/// antimeridian (east < west), it is split into [west, 180] and
/// [-180, east] and each half is rasterized independently, so no tile
/// ever spans the date line.
pub fn circle_to_tiles(center: &Point, radius_m: f64, tile_km: f64) -> Vec<Tile> {
    let radius_km = radius_m / 1000.0;
    let k_lon = km_per_deg_lon(center.lat);

    let d_lat = radius_km / KM_PER_DEG_LAT;
    let d_lon = radius_km / k_lon;

    let south = (center.lat - d_lat).clamp(-TILE_LAT_CLAMP, TILE_LAT_CLAMP);
    let north = (center.lat + d_lat).clamp(-TILE_LAT_CLAMP, TILE_LAT_CLAMP);
    let west = normalize_lon(center.lon - d_lon);
    let east = normalize_lon(center.lon + d_lon);

    let lat_tile_deg = (tile_km / KM_PER_DEG_LAT).max(MIN_TILE_DEG);
    let lon_tile_deg = (tile_km / k_lon).max(MIN_TILE_DEG);

    let mut tiles = Vec::new();
    let mut raster_span = |w: f64, e: f64| {
        let mut s = south;
        while s < north {
            let n = (s + lat_tile_deg).min(north);
            let mut x = w;
            while x < e {
                let x2 = (x + lon_tile_deg).min(e);
                tiles.push(Tile {
                    south: s,
                    west: x,
                    north: n,
                    east: x2,
                });
                x += lon_tile_deg;
            }
            s += lat_tile_deg;
        }
    };

    if east >= west {
        raster_span(west, east);
    } else {
        // Span wraps the antimeridian: cover each side separately.
        raster_span(west, MAX_LON);
        raster_span(MIN_LON, east);
    }

    tiles
}
