// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod app_config;
pub mod logging;
pub mod settings;

pub use app_config::*;
pub use logging::*;
pub use settings::*;
