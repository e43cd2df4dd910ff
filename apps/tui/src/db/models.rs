use crate::geojson::{FeatureCollection, GeoJsonError};
use crate::view::ViewOptions;
use sqlx::FromRow;

/// The single `panel_options` row: view configuration plus the last
/// submitted feature collection
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct PanelOptions {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom_level: f64,
    pub max_zoom: f64,
    pub tile_url: String,
    pub geojson: Option<String>,
    pub saved_at: Option<String>,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self::from_view(&ViewOptions::default())
    }
}

impl PanelOptions {
    pub fn from_view(view: &ViewOptions) -> Self {
        Self {
            center_lat: view.center_lat,
            center_lon: view.center_lon,
            zoom_level: view.zoom,
            max_zoom: view.max_zoom,
            tile_url: view.tile_url.clone(),
            geojson: None,
            saved_at: None,
        }
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            center_lat: self.center_lat,
            center_lon: self.center_lon,
            zoom: self.zoom_level,
            max_zoom: self.max_zoom,
            tile_url: self.tile_url.clone(),
        }
    }

    /// The saved collection, if any. Blank text counts as none.
    pub fn saved_collection(&self) -> Result<Option<FeatureCollection>, GeoJsonError> {
        match self.geojson.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => FeatureCollection::parse(text).map(Some),
        }
    }
}
