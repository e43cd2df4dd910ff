pub mod migrations;
pub mod models;
pub mod queries;
pub use migrations::{create_database_pool, setup_database};
pub use models::PanelOptions;
pub use queries::{load_panel_options, save_geojson, save_view_options};
