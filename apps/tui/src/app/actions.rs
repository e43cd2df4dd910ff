use aoi_mapper::config::{init_app_config, AppConfig};
use aoi_mapper::db::{self, PanelOptions};
use aoi_mapper::geojson::FeatureCollection;
use aoi_mapper::submit::{endpoint_url, HttpTransport};
use aoi_mapper::view::ViewOptions;
use color_eyre::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};

/// Host-side resources: the panel options store and the submission client
#[derive(Debug)]
pub struct AppActions {
    pub config: Option<AppConfig>,
    pub db_pool: Option<SqlitePool>,
    transport: Option<Arc<HttpTransport>>,
}

impl AppActions {
    pub const fn new() -> Self {
        Self {
            config: None,
            db_pool: None,
            transport: None,
        }
    }

    pub async fn initialize(&mut self) -> Result<()> {
        let config = init_app_config()?;
        let database_url = config.database_url.clone();
        self.config = Some(config);
        self.db_pool = Some(db::create_database_pool(&database_url).await?);
        Ok(())
    }

    /// Stored options, or the defaults when the store is unavailable
    pub async fn load_options(&self) -> PanelOptions {
        let Ok(pool) = self.pool() else {
            return PanelOptions::default();
        };

        match db::load_panel_options(pool).await {
            Ok(options) => options,
            Err(e) => {
                warn!("Could not load panel options, using defaults: {e}");
                PanelOptions::default()
            }
        }
    }

    pub async fn save_view_options(&self, view: &ViewOptions) -> Result<()> {
        let pool = self.pool()?;
        db::save_view_options(pool, view).await.map_err(Into::into)
    }

    pub async fn save_geojson(&self, collection: &FeatureCollection) -> Result<()> {
        let pool = self.pool()?;
        db::save_geojson(pool, collection).await
    }

    pub fn submit_host(&self) -> String {
        self.config
            .as_ref()
            .map_or_else(aoi_mapper::config::get_submit_host, |config| {
                config.submit_host.clone()
            })
    }

    pub fn endpoint(&self) -> String {
        endpoint_url(&self.submit_host())
    }

    /// The shared HTTP client, built on first use
    pub fn transport(&mut self) -> Result<Arc<HttpTransport>> {
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }

        let transport = Arc::new(HttpTransport::new()?);
        info!("Submission endpoint: {}", self.endpoint());
        self.transport = Some(Arc::clone(&transport));
        Ok(transport)
    }

    fn pool(&self) -> Result<&SqlitePool> {
        self.db_pool
            .as_ref()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database not initialized"))
    }
}
