// App module for aoi_mapper
// Holds the annotation session plus front-end state around it

pub mod actions;
pub mod input;
pub mod state;

pub use input::handle_input;
pub use state::{App, Focus, SettingsField};
