use crate::app::actions::AppActions;
use aoi_mapper::geojson::FeatureCollection;
use aoi_mapper::status::StatusLevel;
use aoi_mapper::submit::{SubmissionBatch, SubmitResult};
use aoi_mapper::view::ViewOptions;
use aoi_mapper::Session;
use color_eyre::Result;
use std::time::Instant;
use throbber_widgets_tui::ThrobberState;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Which part of the screen receives key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Map,
    LabelForm,
}

/// Editable rows of the settings popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    CenterLat,
    CenterLon,
    Zoom,
    MaxZoom,
    TileUrl,
}

impl SettingsField {
    pub const ALL: [Self; 5] = [
        Self::CenterLat,
        Self::CenterLon,
        Self::Zoom,
        Self::MaxZoom,
        Self::TileUrl,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::CenterLat => "Center latitude",
            Self::CenterLon => "Center longitude",
            Self::Zoom => "Zoom level",
            Self::MaxZoom => "Max zoom",
            Self::TileUrl => "Tile URL",
        }
    }

    pub fn value(self, options: &ViewOptions) -> String {
        match self {
            Self::CenterLat => options.center_lat.to_string(),
            Self::CenterLon => options.center_lon.to_string(),
            Self::Zoom => options.zoom.to_string(),
            Self::MaxZoom => options.max_zoom.to_string(),
            Self::TileUrl => options.tile_url.clone(),
        }
    }

    /// Writes `input` into `options`; numeric rows must parse and stay in range.
    pub fn apply(self, options: &mut ViewOptions, input: &str) -> Result<(), String> {
        let input = input.trim();
        if self == Self::TileUrl {
            input.clone_into(&mut options.tile_url);
            return Ok(());
        }

        let value: f64 = input
            .parse()
            .map_err(|_| format!("{} must be a number", self.label()))?;
        let (min, max) = match self {
            Self::CenterLat => (-90.0, 90.0),
            Self::CenterLon => (-180.0, 180.0),
            Self::Zoom | Self::MaxZoom | Self::TileUrl => (0.0, 30.0),
        };
        if !(min..=max).contains(&value) {
            return Err(format!("{} must be between {min} and {max}", self.label()));
        }

        match self {
            Self::CenterLat => options.center_lat = value,
            Self::CenterLon => options.center_lon = value,
            Self::Zoom => options.zoom = value,
            Self::MaxZoom => options.max_zoom = value,
            Self::TileUrl => {}
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub session: Session,
    pub focus: Focus,
    pub show_help: bool,
    pub show_settings: bool,
    pub settings_selection_index: usize,
    pub settings_editing: bool,
    pub settings_input: String,
    /// Host view configuration as last loaded or saved
    pub options: ViewOptions,
    pub saved_at: Option<String>,
    pub actions: AppActions,
    /// Batch waiting to be handed to the submission machine
    pub outbox: Option<SubmissionBatch>,
    pub pending: Option<oneshot::Receiver<SubmitResult>>,
    /// Collection to persist after a successful submission
    pub to_persist: Option<FeatureCollection>,
    pub throbber: ThrobberState,
}

impl App {
    pub fn new() -> Self {
        let options = ViewOptions::default();
        Self {
            running: true,
            session: Session::new(&options),
            focus: Focus::Map,
            show_help: false,
            show_settings: false,
            settings_selection_index: 0,
            settings_editing: false,
            settings_input: String::new(),
            options,
            saved_at: None,
            actions: AppActions::new(),
            outbox: None,
            pending: None,
            to_persist: None,
            throbber: ThrobberState::default(),
        }
    }

    /// Connects the store and restores the view and saved features from it.
    /// Without a store the session keeps its defaults.
    pub async fn initialize_db(&mut self) -> Result<()> {
        self.actions.initialize().await?;
        self.load_from_store().await;
        Ok(())
    }

    pub async fn load_from_store(&mut self) {
        let stored = self.actions.load_options().await;
        self.options = stored.view_options();
        self.saved_at.clone_from(&stored.saved_at);
        self.session = Session::new(&self.options);

        match stored.saved_collection() {
            Ok(Some(collection)) => {
                if let Err(e) = self.session.load_collection(&collection) {
                    warn!("Saved GeoJSON could not be loaded: {e}");
                    self.set_status(StatusLevel::Error, format!("Saved features ignored: {e}"));
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Saved GeoJSON is invalid: {e}");
                self.set_status(StatusLevel::Error, format!("Saved features ignored: {e}"));
            }
        }
    }

    pub fn set_status(&mut self, level: StatusLevel, message: impl Into<String>) {
        self.session.set_status(level, message, Instant::now());
    }

    pub fn update(&mut self) {
        let now = Instant::now();
        self.session.tick(now);
        if self.session.is_submitting() {
            self.throbber.calc_next();
        }
    }

    pub fn selected_setting(&self) -> SettingsField {
        SettingsField::ALL
            .get(self.settings_selection_index)
            .copied()
            .unwrap_or(SettingsField::CenterLat)
    }

    /// Saves the edited view configuration and applies the changed fields
    /// to the map
    pub async fn persist_settings(&mut self, previous: &ViewOptions) -> Result<()> {
        self.session.apply_options(previous, &self.options);
        self.actions.save_view_options(&self.options).await?;
        info!("Panel options updated");
        Ok(())
    }

    /// Writes the collection from a successful submission to the store
    pub async fn persist_submission(&mut self) {
        let Some(collection) = self.to_persist.take() else {
            return;
        };

        match self.actions.save_geojson(&collection).await {
            Ok(()) => {
                self.saved_at = Some(chrono::Local::now().to_rfc3339());
            }
            Err(e) => {
                warn!("Submitted features were not saved: {e}");
                self.set_status(StatusLevel::Warning, format!("Sent, but not saved: {e}"));
            }
        }
    }
}
