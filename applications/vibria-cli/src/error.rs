/// CLI error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No playlist named {0:?}")]
    UnknownPlaylist(String),

    #[error("Playback error: {0}")]
    Playback(#[from] vibria_playback::PlaybackError),

    #[error("Storage error: {0}")]
    Storage(#[from] vibria_core::VibriaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<vibria_storage::StorageError> for CliError {
    fn from(err: vibria_storage::StorageError) -> Self {
        CliError::Storage(err.into())
    }
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}
