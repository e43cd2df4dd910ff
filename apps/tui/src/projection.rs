//! Spherical web mercator (EPSG:3857) helpers and tile math.

use crate::domain::Coord;
use std::f64::consts::{FRAC_PI_4, PI};

pub const EARTH_RADIUS: f64 = 6_378_137.0;
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
pub const TILE_SIZE: f64 = 256.0;

/// Half the projected world width in metres.
pub const HALF_WORLD: f64 = PI * EARTH_RADIUS;

/// Projects longitude/latitude degrees (EPSG:4326) into display metres.
pub fn from_lon_lat(lon: f64, lat: f64) -> Coord {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = EARTH_RADIUS * lon.to_radians();
    let y = EARTH_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    Coord::new(x, y)
}

/// Inverse of [`from_lon_lat`]; returns `(lon, lat)` in degrees.
pub fn to_lon_lat(coord: Coord) -> (f64, f64) {
    let lon = (coord.x / EARTH_RADIUS).to_degrees();
    let lat = 2.0f64
        .mul_add((coord.y / EARTH_RADIUS).exp().atan(), -(PI / 2.0))
        .to_degrees();
    (lon, lat)
}

/// Metres per pixel at `zoom` for 256px tiles.
pub fn resolution(zoom: f64) -> f64 {
    (2.0 * HALF_WORLD / TILE_SIZE) / 2f64.powf(zoom)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileIndex {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

/// XYZ tile (north-west origin) containing `coord` at integer zoom `z`.
pub fn tile_at(coord: Coord, z: u32) -> TileIndex {
    let n = 2f64.powi(i32::try_from(z).unwrap_or(i32::MAX));
    let span = 2.0 * HALF_WORLD;
    let fx = ((coord.x + HALF_WORLD) / span * n).floor();
    let fy = ((HALF_WORLD - coord.y) / span * n).floor();
    let max = n - 1.0;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    TileIndex {
        z,
        x: fx.clamp(0.0, max) as u32,
        y: fy.clamp(0.0, max) as u32,
    }
}
