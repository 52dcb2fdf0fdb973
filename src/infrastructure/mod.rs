//! Infrastructure layer
//!
//! Configuration loading and logging setup.

mod config;
mod logging;

pub use config::{Config, DEFAULT_BUILD_CONDITIONS};
pub use logging::init_logging;
