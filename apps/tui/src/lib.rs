// Export our modules for use in binaries and tests
pub mod config;
pub mod db;
pub mod domain;
pub mod geojson;
pub mod interactions;
pub mod label;
pub mod layer;
pub mod projection;
pub mod session;
pub mod status;
pub mod submit;
pub mod tiles;
pub mod view;
pub mod wizard;

pub use domain::{Feature, FeatureId, Geometry, GeometryKind};
pub use session::{Advance, Session};
pub use wizard::{Direction, Step};
