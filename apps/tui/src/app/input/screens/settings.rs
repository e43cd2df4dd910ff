use crate::app::input::helpers::{wrap_decrement, wrap_increment};
use crate::app::state::{App, SettingsField};
use aoi_mapper::status::StatusLevel;
use crossterm::event::KeyCode;

pub async fn handle_settings_input(app: &mut App, key: KeyCode) -> color_eyre::Result<()> {
    if app.settings_editing {
        match key {
            KeyCode::Esc => {
                app.settings_editing = false;
                app.settings_input.clear();
            }
            KeyCode::Enter => {
                let field = app.selected_setting();
                let previous = app.options.clone();
                match field.apply(&mut app.options, &app.settings_input) {
                    Ok(()) => {
                        app.settings_editing = false;
                        app.settings_input.clear();
                        app.persist_settings(&previous).await?;
                        app.set_status(StatusLevel::Success, "Settings saved");
                    }
                    Err(message) => app.set_status(StatusLevel::Warning, message),
                }
            }
            KeyCode::Backspace => {
                app.settings_input.pop();
            }
            KeyCode::Char(ch) => {
                app.settings_input.push(ch);
            }
            _ => {}
        }
        return Ok(());
    }

    let len = SettingsField::ALL.len();
    match key {
        KeyCode::Up => {
            app.settings_selection_index = wrap_decrement(app.settings_selection_index, len);
        }
        KeyCode::Down => {
            app.settings_selection_index = wrap_increment(app.settings_selection_index, len);
        }
        KeyCode::Enter => {
            app.settings_editing = true;
            app.settings_input = app.selected_setting().value(&app.options);
        }
        KeyCode::Esc | KeyCode::F(2) | KeyCode::Char('q') => {
            app.show_settings = false;
        }
        _ => {}
    }

    Ok(())
}
