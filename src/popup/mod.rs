pub mod controller;
pub mod status;

pub use controller::{PopupMode, PopupServices, ToggleUi};
pub use status::StatusLabel;
