//! Map viewport: center, zoom and the optional custom tile layer.

use crate::domain::Coord;
use crate::projection::{self, TileIndex};
use crate::tiles::TileSource;

/// Approximate pixel size of one terminal cell.
pub const CELL_WIDTH_PX: f64 = 8.0;
pub const CELL_HEIGHT_PX: f64 = 16.0;

/// Pixels moved per pan key press.
pub const PAN_STEP_PX: f64 = 32.0;

/// View configuration as supplied by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    pub max_zoom: f64,
    pub tile_url: String,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            center_lat: 48.262_725,
            center_lon: 11.667_25,
            zoom: 18.0,
            max_zoom: 22.0,
            tile_url: String::new(),
        }
    }
}

/// Bounding box in display metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: Coord,
    pub max: Coord,
}

#[derive(Debug, Clone)]
pub struct MapView {
    center: Coord,
    zoom: f64,
    max_zoom: f64,
    tiles: Option<TileSource>,
}

impl Default for MapView {
    fn default() -> Self {
        Self::from_options(&ViewOptions::default())
    }
}

impl MapView {
    pub fn from_options(options: &ViewOptions) -> Self {
        let mut view = Self {
            center: Coord::new(0.0, 0.0),
            zoom: 0.0,
            max_zoom: 0.0,
            tiles: None,
        };
        view.apply(options);
        view
    }

    /// Re-centres the view and swaps the tile layer. A blank tile URL
    /// removes the custom layer.
    pub fn apply(&mut self, options: &ViewOptions) {
        self.center = projection::from_lon_lat(options.center_lon, options.center_lat);
        self.max_zoom = options.max_zoom.max(0.0);
        self.zoom = options.zoom.clamp(0.0, self.max_zoom);
        self.tiles = TileSource::parse(&options.tile_url);
    }

    /// Applies only what differs between `previous` and `options`, so a
    /// tile URL edit keeps the current pan and zoom.
    #[allow(clippy::float_cmp)]
    pub fn update(&mut self, previous: &ViewOptions, options: &ViewOptions) {
        if previous.center_lat != options.center_lat || previous.center_lon != options.center_lon {
            self.center = projection::from_lon_lat(options.center_lon, options.center_lat);
        }
        if previous.max_zoom != options.max_zoom {
            self.max_zoom = options.max_zoom.max(0.0);
            self.zoom = self.zoom.clamp(0.0, self.max_zoom);
        }
        if previous.zoom != options.zoom {
            self.zoom = options.zoom.clamp(0.0, self.max_zoom);
        }
        if previous.tile_url != options.tile_url {
            self.tiles = TileSource::parse(&options.tile_url);
        }
    }

    pub const fn center(&self) -> Coord {
        self.center
    }

    pub fn center_lon_lat(&self) -> (f64, f64) {
        projection::to_lon_lat(self.center)
    }

    pub const fn zoom(&self) -> f64 {
        self.zoom
    }

    pub const fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    pub const fn tiles(&self) -> Option<&TileSource> {
        self.tiles.as_ref()
    }

    /// Metres per screen pixel at the current zoom.
    pub fn resolution(&self) -> f64 {
        projection::resolution(self.zoom)
    }

    /// Moves the center by a screen-pixel offset; positive `dy` is north.
    pub fn pan(&mut self, dx_px: f64, dy_px: f64) {
        let resolution = self.resolution();
        let half = projection::HALF_WORLD;
        let moved = self.center.offset(dx_px * resolution, dy_px * resolution);
        self.center = Coord::new(moved.x.clamp(-half, half), moved.y.clamp(-half, half));
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.zoom = (self.zoom + delta).clamp(0.0, self.max_zoom);
    }

    /// Visible area for a viewport of `width_px` by `height_px`.
    pub fn extent(&self, width_px: f64, height_px: f64) -> Extent {
        let resolution = self.resolution();
        let half_w = width_px * resolution / 2.0;
        let half_h = height_px * resolution / 2.0;
        Extent {
            min: self.center.offset(-half_w, -half_h),
            max: self.center.offset(half_w, half_h),
        }
    }

    pub fn tile_under_crosshair(&self) -> TileIndex {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let z = self.zoom.floor().max(0.0) as u32;
        projection::tile_at(self.center, z)
    }

    /// Expanded URL of the tile under the crosshair, when a custom layer is set.
    pub fn tile_url(&self) -> Option<String> {
        self.tiles
            .as_ref()
            .map(|source| source.url_for(self.tile_under_crosshair()))
    }
}
