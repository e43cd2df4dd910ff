use crate::app::state::{App, Focus};
use crossterm::event::KeyCode;

mod help;
mod label_form;
mod map;
mod settings;

pub async fn dispatch_input(app: &mut App, key: KeyCode) -> color_eyre::Result<()> {
    if help::handle_help_toggle(app, key) {
        return Ok(());
    }

    if app.show_settings {
        return settings::handle_settings_input(app, key).await;
    }

    match app.focus {
        Focus::LabelForm => label_form::handle_label_form_input(app, key),
        Focus::Map => map::handle_map_input(app, key),
    }

    Ok(())
}
