use crate::app::state::{App, Focus};
use crossterm::event::KeyCode;
use std::time::Instant;

pub fn handle_label_form_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Enter => {
            app.session.submit_label(Instant::now());
            app.focus = Focus::Map;
        }
        KeyCode::Esc => {
            // drop unsaved edits by reloading the feature's attribute
            let selected = app.session.selected();
            app.session.select(selected);
            app.focus = Focus::Map;
        }
        KeyCode::Tab => {
            app.session.cycle_label_target();
        }
        KeyCode::Backspace => app.session.pop_label_char(),
        KeyCode::Char(c) => app.session.push_label_char(c),
        _ => {}
    }
}
