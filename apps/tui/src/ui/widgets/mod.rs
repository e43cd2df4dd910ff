pub mod map;
pub mod popup;
pub mod side_panel;
pub mod stepper;
