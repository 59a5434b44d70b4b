/// Vibria CLI - headless shell over the player core
pub mod app;
pub mod config;
pub mod engine;
pub mod error;

pub use config::PlayerConfig;
pub use engine::SimulatedEngine;
pub use error::{CliError, Result};
