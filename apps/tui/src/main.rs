mod app;
mod cli;
mod event;
mod logging;
mod terminal;
mod ui;

use aoi_mapper::config;
use aoi_mapper::status::StatusLevel;
use app::App;
use clap::Parser;
use cli::CliArgs;
use color_eyre::Result;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so CLI flags can override it
    config::load_env();
    let args = CliArgs::parse();
    args.apply_env_overrides();

    // Setup error handling
    color_eyre::install()?;

    let log_file = config::get_log_file();
    if let Err(e) = logging::init(&log_file, args.debug) {
        eprintln!("Logging disabled: {e}");
    }
    info!("Starting aoi_mapper");

    // Initialize application state
    let mut app = App::new();

    // Check if we're running in a terminal
    if args.headless || !is_terminal() {
        return event::run_headless(&mut app, args.json).await;
    }

    // The wizard works without a store; only persistence is lost
    if let Err(e) = app.initialize_db().await {
        warn!("Error initializing database: {e}");
        app.set_status(StatusLevel::Warning, format!("Settings store unavailable: {e}"));
    } else {
        info!("Database initialization successful");
    }

    // Setup terminal
    let mut terminal = terminal::setup()?;

    // Run the application
    let result = event::run(&mut terminal, &mut app).await;

    // Restore terminal
    terminal::cleanup(true, true);

    if let Err(e) = &result {
        warn!("Application exited with error: {e}");
    }
    result
}

// Check if we're running in a terminal
fn is_terminal() -> bool {
    atty::is(atty::Stream::Stdout)
}
