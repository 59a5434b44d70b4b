/// Core error types for Vibria
use thiserror::Error;

/// Result type alias using `VibriaError`
pub type Result<T> = std::result::Result<T, VibriaError>;

/// Core error type for Vibria
#[derive(Error, Debug)]
pub enum VibriaError {
    /// Persistence backend errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Audio engine errors (load, seek, session)
    #[error("Engine error: {0}")]
    Engine(String),

    /// File access could not be granted or restored
    #[error("Access error: {0}")]
    Access(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl VibriaError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create an access error
    pub fn access(msg: impl Into<String>) -> Self {
        Self::Access(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
