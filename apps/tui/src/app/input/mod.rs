mod helpers;
pub mod screens;

use crate::app::state::App;
use crossterm::event::KeyCode;
use tracing::warn;

pub async fn handle_input(app: &mut App, key: KeyCode) {
    if let Err(e) = screens::dispatch_input(app, key).await {
        warn!("Input handling failed: {e}");
        app.set_status(aoi_mapper::status::StatusLevel::Error, format!("Error: {e}"));
    }
}
