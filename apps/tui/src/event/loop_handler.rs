use color_eyre::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::fmt;
use std::time::Instant;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::app::{handle_input, App};
use crate::terminal::Tui;
use crate::ui;
use aoi_mapper::geojson::FeatureCollection;
use aoi_mapper::submit::{spawn_submission, SubmissionBatch, SubmitError, SubmitResult};
use aoi_mapper::GeometryKind;

// States of the submission lifecycle
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SubmitState {
    Idle,
    Sending,
    Accepted,
    Rejected,
}

impl fmt::Display for SubmitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Sending => write!(f, "Sending"),
            Self::Accepted => write!(f, "Accepted"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

// Events that drive the submission lifecycle
#[derive(Debug)]
enum SubmitEvent {
    Start(SubmissionBatch),
    Finished(SubmitResult),
    Reset,
}

impl fmt::Display for SubmitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start(batch) => write!(f, "Start({} features)", batch.combined.len()),
            Self::Finished(Ok(())) => write!(f, "Finished(ok)"),
            Self::Finished(Err(e)) => write!(f, "Finished({e})"),
            Self::Reset => write!(f, "Reset"),
        }
    }
}

#[derive(Debug)]
struct StateTransitionError {
    from: SubmitState,
    event: String,
}

impl fmt::Display for StateTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid transition from {} with event {}",
            self.from, self.event
        )
    }
}

impl std::error::Error for StateTransitionError {}

struct SubmitMachine {
    state: SubmitState,
}

impl SubmitMachine {
    const fn new(initial_state: SubmitState) -> Self {
        Self {
            state: initial_state,
        }
    }

    const fn state(&self) -> SubmitState {
        self.state
    }

    fn process_event(
        &mut self,
        event: SubmitEvent,
        app: &mut App,
    ) -> std::result::Result<(), StateTransitionError> {
        let next_state = NextState::try_from((self.state, event, app))?;
        debug!("Submission {} -> {}", self.state, next_state.0);
        self.state = next_state.0;
        Ok(())
    }
}

struct NextState(SubmitState);

impl TryFrom<(SubmitState, SubmitEvent, &mut App)> for NextState {
    type Error = StateTransitionError;

    fn try_from(
        value: (SubmitState, SubmitEvent, &mut App),
    ) -> std::result::Result<Self, Self::Error> {
        let (current_state, event, app) = value;

        match (current_state, event) {
            (SubmitState::Idle, SubmitEvent::Start(batch)) => {
                match app.actions.transport() {
                    Ok(transport) => {
                        let url = app.actions.endpoint();
                        app.pending = Some(spawn_submission(transport, url, batch));
                    }
                    Err(e) => {
                        // no client: fail the submission like a transport error
                        warn!("No HTTP client: {e}");
                        let result = Err(SubmitError::Transport(e.to_string()));
                        app.to_persist = app.session.finish_submission(result, Instant::now());
                        return Ok(Self(SubmitState::Rejected));
                    }
                }
                Ok(Self(SubmitState::Sending))
            }
            (SubmitState::Sending, SubmitEvent::Finished(result)) => {
                app.pending = None;
                let accepted = result.is_ok();
                app.to_persist = app.session.finish_submission(result, Instant::now());
                if accepted {
                    Ok(Self(SubmitState::Accepted))
                } else {
                    Ok(Self(SubmitState::Rejected))
                }
            }
            (SubmitState::Accepted | SubmitState::Rejected, SubmitEvent::Reset) => {
                Ok(Self(SubmitState::Idle))
            }
            (from, event) => Err(StateTransitionError {
                from,
                event: event.to_string(),
            }),
        }
    }
}

/// Run the application in headless mode (no UI)
pub async fn run_headless(app: &mut App, json: bool) -> Result<()> {
    app.initialize_db().await?;

    let stored = app.actions.load_options().await;
    let collection = stored
        .saved_collection()?
        .unwrap_or_else(FeatureCollection::empty);

    if json {
        println!("{}", collection.to_pretty_string()?);
    } else {
        render_headless_summary(app, &collection);
    }

    Ok(())
}

fn render_headless_summary(app: &App, collection: &FeatureCollection) {
    let summary = HeadlessSummary::new(app, collection);

    println!("\nAOI Mapper");
    println!("==========");
    println!(
        "View: {:.6}, {:.6} at zoom {} (max {})",
        summary.center_lat, summary.center_lon, summary.zoom, summary.max_zoom
    );
    println!(
        "Tile URL: {}",
        summary.tile_url.as_deref().unwrap_or("(none)")
    );
    println!("Submission endpoint: {}", summary.endpoint);
    println!("Last saved: {}", summary.saved_at.as_deref().unwrap_or("never"));

    println!("\nSaved features: {}", summary.features);
    println!(
        "- access points: {} ({} without identifier)",
        summary.points, summary.unlabelled_points
    );
    println!(
        "- areas of interest: {} ({} without name)",
        summary.polygons, summary.unlabelled_polygons
    );
}

struct HeadlessSummary {
    center_lat: f64,
    center_lon: f64,
    zoom: f64,
    max_zoom: f64,
    tile_url: Option<String>,
    endpoint: String,
    saved_at: Option<String>,
    features: usize,
    points: usize,
    polygons: usize,
    unlabelled_points: usize,
    unlabelled_polygons: usize,
}

impl HeadlessSummary {
    fn new(app: &App, collection: &FeatureCollection) -> Self {
        let options = &app.options;
        Self {
            center_lat: options.center_lat,
            center_lon: options.center_lon,
            zoom: options.zoom,
            max_zoom: options.max_zoom,
            tile_url: Some(options.tile_url.clone()).filter(|url| !url.is_empty()),
            endpoint: app.actions.endpoint(),
            saved_at: app.saved_at.clone(),
            features: collection.len(),
            points: collection.count_of(GeometryKind::Point),
            polygons: collection.count_of(GeometryKind::Polygon),
            unlabelled_points: collection.unlabelled_of(GeometryKind::Point),
            unlabelled_polygons: collection.unlabelled_of(GeometryKind::Polygon),
        }
    }
}

/// Run the main application event loop
pub async fn run(terminal: &mut Tui, app: &mut App) -> Result<()> {
    // Configure event poll timeout (ms)
    const EVENT_POLL_TIMEOUT: u64 = 50;

    let mut submit_machine = SubmitMachine::new(SubmitState::Idle);

    loop {
        app.update();

        if let Err(e) = terminal.draw(|f| ui::ui(app, f)) {
            return Err(color_eyre::eyre::eyre!("Terminal draw error: {e}"));
        }

        if matches!(
            event::poll(std::time::Duration::from_millis(EVENT_POLL_TIMEOUT)),
            Ok(true)
        ) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    handle_input(app, key.code).await;
                    if !app.running {
                        break;
                    }
                }
                Ok(Event::Resize(_, _)) => {
                    // Redrawn on the next turn
                }
                Ok(_) | Err(_) => {
                    // Ignore non-key events
                }
            }
        }

        if let Some(batch) = app.outbox.take() {
            if submit_machine.state() != SubmitState::Idle {
                warn!("Submission already in progress; new batch dropped");
            } else if let Err(e) = submit_machine.process_event(SubmitEvent::Start(batch), app) {
                warn!("{e}");
            }
        }

        if let Some(result) = poll_submission(app) {
            if let Err(e) = submit_machine.process_event(SubmitEvent::Finished(result), app) {
                warn!("{e}");
            }
        }

        if matches!(
            submit_machine.state(),
            SubmitState::Accepted | SubmitState::Rejected
        ) {
            if submit_machine.state() == SubmitState::Accepted {
                app.persist_submission().await;
                info!("Submission saved to panel options");
            }
            if let Err(e) = submit_machine.process_event(SubmitEvent::Reset, app) {
                warn!("{e}");
            }
        }
    }
    Ok(())
}

/// Non-blocking check of the submission task's result channel
fn poll_submission(app: &mut App) -> Option<SubmitResult> {
    let receiver = app.pending.as_mut()?;
    match receiver.try_recv() {
        Ok(result) => Some(result),
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Closed) => Some(Err(SubmitError::Aborted)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aoi_mapper::db::{load_panel_options, setup_database};
    use aoi_mapper::status::StatusLevel;
    use sqlx::sqlite::SqlitePoolOptions;

    const TWO_FEATURES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [11.66725, 48.262725] },
                "properties": { "id": "AP-1" }
            },
            {
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [11.6670, 48.2625], [11.6675, 48.2625],
                        [11.6675, 48.2629], [11.6670, 48.2625]
                    ]]
                },
                "properties": { "name": "Lobby" }
            }
        ]
    }"#;

    #[test]
    fn reset_from_idle_is_rejected() {
        let mut app = App::new();
        let mut machine = SubmitMachine::new(SubmitState::Idle);

        let err = machine
            .process_event(SubmitEvent::Reset, &mut app)
            .unwrap_err();
        assert_eq!(err.from, SubmitState::Idle);
        assert_eq!(err.event, "Reset");
        assert_eq!(machine.state(), SubmitState::Idle);
    }

    #[test]
    fn successful_result_queues_collection_for_the_store() {
        let mut app = App::new();
        let mut machine = SubmitMachine::new(SubmitState::Sending);

        machine
            .process_event(SubmitEvent::Finished(Ok(())), &mut app)
            .unwrap();
        assert_eq!(machine.state(), SubmitState::Accepted);
        assert!(app.to_persist.is_some());

        machine.process_event(SubmitEvent::Reset, &mut app).unwrap();
        assert_eq!(machine.state(), SubmitState::Idle);
    }

    #[test]
    fn failed_result_reports_the_error() {
        let mut app = App::new();
        let mut machine = SubmitMachine::new(SubmitState::Sending);

        let result = Err(SubmitError::Transport("connection refused".to_string()));
        machine
            .process_event(SubmitEvent::Finished(result), &mut app)
            .unwrap();

        assert_eq!(machine.state(), SubmitState::Rejected);
        assert!(app.to_persist.is_none());
        let status = app.session.status().unwrap();
        assert_eq!(status.level, StatusLevel::Error);
        assert_eq!(status.message, "connection refused");
    }

    #[test]
    fn finished_while_idle_is_rejected() {
        let mut app = App::new();
        let mut machine = SubmitMachine::new(SubmitState::Idle);

        assert!(machine
            .process_event(SubmitEvent::Finished(Ok(())), &mut app)
            .is_err());
    }

    #[tokio::test]
    async fn accepted_submission_is_written_to_the_store() -> Result<(), Box<dyn std::error::Error>> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        setup_database(&pool).await?;

        let mut app = App::new();
        app.actions.db_pool = Some(pool.clone());
        app.session
            .load_collection(&FeatureCollection::parse(TWO_FEATURES)?)?;

        let mut machine = SubmitMachine::new(SubmitState::Sending);
        machine.process_event(SubmitEvent::Finished(Ok(())), &mut app)?;
        app.persist_submission().await;

        assert!(app.to_persist.is_none());
        assert!(app.saved_at.is_some());
        let saved = load_panel_options(&pool)
            .await?
            .saved_collection()?
            .ok_or("no collection saved")?;
        assert_eq!(saved.len(), 2);
        assert_eq!(saved.count_of(GeometryKind::Point), 1);
        assert_eq!(saved.count_of(GeometryKind::Polygon), 1);
        assert_eq!(saved.features[0].label(), Some("AP-1"));
        assert_eq!(saved.features[1].label(), Some("Lobby"));
        Ok(())
    }

    #[tokio::test]
    async fn store_failure_after_send_shows_a_warning() {
        let mut app = App::new();
        let mut machine = SubmitMachine::new(SubmitState::Sending);
        machine
            .process_event(SubmitEvent::Finished(Ok(())), &mut app)
            .unwrap();

        app.persist_submission().await;

        assert!(app.saved_at.is_none());
        let status = app.session.status().unwrap();
        assert_eq!(status.level, StatusLevel::Warning);
        assert!(status.message.starts_with("Sent, but not saved"));
    }
}
