use chrono::Local;
use color_eyre::Result;
use sqlx::{query, query_as, SqlitePool};
use tracing::info;

use crate::db::models::PanelOptions;
use crate::geojson::FeatureCollection;
use crate::view::ViewOptions;

const PANEL_COLUMNS: &str =
    "center_lat, center_lon, zoom_level, max_zoom, tile_url, geojson, saved_at";

/// Loads the panel options row, inserting the defaults when it is missing
pub async fn load_panel_options(pool: &SqlitePool) -> Result<PanelOptions, sqlx::Error> {
    let existing = query_as::<_, PanelOptions>(&format!(
        "SELECT {PANEL_COLUMNS} FROM panel_options WHERE id = 1"
    ))
    .fetch_optional(pool)
    .await?;

    if let Some(options) = existing {
        return Ok(options);
    }

    let defaults = PanelOptions::default();
    query(
        "INSERT INTO panel_options (id, center_lat, center_lon, zoom_level, max_zoom, tile_url) \
        VALUES (1, ?, ?, ?, ?, ?)",
    )
    .bind(defaults.center_lat)
    .bind(defaults.center_lon)
    .bind(defaults.zoom_level)
    .bind(defaults.max_zoom)
    .bind(&defaults.tile_url)
    .execute(pool)
    .await?;

    info!("Inserted default panel options");
    Ok(defaults)
}

/// Updates the view configuration, keeping the saved collection
pub async fn save_view_options(pool: &SqlitePool, view: &ViewOptions) -> Result<(), sqlx::Error> {
    load_panel_options(pool).await?;

    query(
        "UPDATE panel_options SET center_lat = ?, center_lon = ?, zoom_level = ?, \
        max_zoom = ?, tile_url = ? WHERE id = 1",
    )
    .bind(view.center_lat)
    .bind(view.center_lon)
    .bind(view.zoom)
    .bind(view.max_zoom)
    .bind(view.tile_url.trim())
    .execute(pool)
    .await?;

    Ok(())
}

/// Replaces the saved collection with `collection`
pub async fn save_geojson(pool: &SqlitePool, collection: &FeatureCollection) -> Result<()> {
    let text = collection.to_json_string()?;
    load_panel_options(pool).await?;

    query("UPDATE panel_options SET geojson = ?, saved_at = ? WHERE id = 1")
        .bind(&text)
        .bind(Local::now().to_rfc3339())
        .execute(pool)
        .await?;

    info!("Saved {} feature(s) to panel options", collection.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::setup_database;
    use crate::domain::{Coord, Geometry, GeometryKind};
    use crate::geojson::encode;
    use crate::layer::DrawLayer;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> Result<SqlitePool, sqlx::Error> {
        // Use an in-memory database for testing
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        setup_database(&pool).await?;
        Ok(pool)
    }

    #[tokio::test]
    async fn test_missing_row_gets_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let pool = setup_test_db().await?;

        let options = load_panel_options(&pool).await?;
        assert_eq!(options, PanelOptions::default());
        assert!((options.center_lat - 48.262_725).abs() < 1e-9);
        assert!((options.zoom_level - 18.0).abs() < f64::EPSILON);
        assert!(options.saved_collection()?.is_none());

        // second load reads the inserted row
        assert_eq!(load_panel_options(&pool).await?, options);
        Ok(())
    }

    #[tokio::test]
    async fn test_save_view_options() -> Result<(), Box<dyn std::error::Error>> {
        let pool = setup_test_db().await?;

        let view = ViewOptions {
            center_lat: 52.52,
            center_lon: 13.405,
            zoom: 16.0,
            max_zoom: 20.0,
            tile_url: " https://{a-c}.tile.example/{z}/{x}/{y}.png ".to_string(),
        };
        save_view_options(&pool, &view).await?;

        let stored = load_panel_options(&pool).await?;
        assert!((stored.center_lat - 52.52).abs() < 1e-9);
        assert!((stored.max_zoom - 20.0).abs() < f64::EPSILON);
        assert_eq!(stored.tile_url, "https://{a-c}.tile.example/{z}/{x}/{y}.png");
        assert!(stored.geojson.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_geojson_replaces_collection() -> Result<(), Box<dyn std::error::Error>> {
        let pool = setup_test_db().await?;

        let mut layer = DrawLayer::new();
        layer.add_labelled(Geometry::Point(Coord::new(0.0, 0.0)), Some("AP-1"));
        layer.add_labelled(
            Geometry::Polygon(vec![
                Coord::new(0.0, 0.0),
                Coord::new(5.0, 0.0),
                Coord::new(5.0, 5.0),
            ]),
            Some("Lobby"),
        );
        save_geojson(&pool, &encode(layer.iter())).await?;

        layer.pop_last();
        save_geojson(&pool, &encode(layer.iter())).await?;

        let stored = load_panel_options(&pool).await?;
        let collection = stored.saved_collection()?.ok_or("collection missing")?;
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.count_of(GeometryKind::Point), 1);
        assert_eq!(collection.features[0].label(), Some("AP-1"));
        assert!(stored.saved_at.is_some());
        Ok(())
    }
}
