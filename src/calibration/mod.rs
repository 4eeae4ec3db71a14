//! Per-page threshold calibration.
//!
//! Searches detection parameters until the detected marker count equals the
//! number of verses the page is known to hold, falling back to circle
//! detection when no template threshold gets there.

pub mod config;
pub mod search;

pub use config::{get_config, init_config};
pub use search::{calibrate, CalibrationOutcome, DetectionMethod};
