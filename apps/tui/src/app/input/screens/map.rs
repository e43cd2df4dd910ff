use crate::app::state::{App, Focus};
use aoi_mapper::status::StatusLevel;
use aoi_mapper::view::PAN_STEP_PX;
use aoi_mapper::{Advance, Direction};
use crossterm::event::KeyCode;
use std::time::Instant;
use tracing::debug;

pub fn handle_map_input(app: &mut App, key: KeyCode) {
    let now = Instant::now();
    match key {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Up => app.session.pan(0.0, PAN_STEP_PX),
        KeyCode::Down => app.session.pan(0.0, -PAN_STEP_PX),
        KeyCode::Left => app.session.pan(-PAN_STEP_PX, 0.0),
        KeyCode::Right => app.session.pan(PAN_STEP_PX, 0.0),
        KeyCode::Char('+' | '=') => app.session.zoom_by(1.0),
        KeyCode::Char('-') => app.session.zoom_by(-1.0),
        KeyCode::Enter | KeyCode::Char(' ') => app.session.primary_action(now),
        KeyCode::Char('f') => {
            app.session.finish_sketch(now);
        }
        KeyCode::Backspace => app.session.pop_sketch_vertex(),
        KeyCode::Esc => app.session.cancel_sketch(),
        KeyCode::Char('m') => app.session.toggle_grab(now),
        KeyCode::Char('u') => {
            if let Some(id) = app.session.undo() {
                debug!("Undo removed feature {}", id);
            }
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if app.session.delete_selected().is_none() {
                app.set_status(StatusLevel::Info, "Nothing selected to delete");
            }
        }
        KeyCode::Tab => {
            app.session.cycle_label_target();
        }
        KeyCode::Char('i') => focus_label_form(app),
        KeyCode::Char('n' | ']') => step(app, Direction::Forward, now),
        KeyCode::Char('p' | '[') => step(app, Direction::Backward, now),
        KeyCode::F(2) | KeyCode::Char('s') => open_settings(app),
        _ => {}
    }
}

fn step(app: &mut App, direction: Direction, now: Instant) {
    match app.session.advance(direction, now) {
        Advance::Submit(batch) => app.outbox = Some(batch),
        Advance::Moved(step) => debug!("Moved to step {}", step.number()),
        Advance::Blocked(_) | Advance::Refused => {}
    }
}

fn focus_label_form(app: &mut App) {
    if app.session.label_kind().is_none() || app.session.is_submitting() {
        return;
    }
    if app.session.selected().is_none() {
        app.set_status(StatusLevel::Info, "Select a feature first (Tab cycles)");
        return;
    }
    app.focus = Focus::LabelForm;
}

fn open_settings(app: &mut App) {
    if app.session.is_submitting() {
        return;
    }
    app.show_settings = true;
    app.settings_editing = false;
    app.settings_input.clear();
}
