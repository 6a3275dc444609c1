pub mod attributes;
pub mod batch;
pub mod camera;
pub mod config;
pub mod contour;
pub mod depth;
pub mod error;
pub mod feature;
pub mod geodesy;
pub mod io;
pub mod localization;
pub mod projection;
pub mod synthetic;
pub mod types;
pub mod visualization;

pub use error::{LocalizationError, Result};
pub use localization::{LocalizationDispatcher, LocalizationOutcome, localize};
