use thiserror::Error;

/// Result type for drawing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating or styling a drawing
#[derive(Error, Debug)]
pub enum Error {
    #[error("No geometry to section: the model has no meshes")]
    NoMeshes,

    #[error("Invalid section configuration: {0}")]
    InvalidConfig(String),

    #[error("Drawing generation was cancelled")]
    Cancelled,

    #[error("Invalid rule set: {0}")]
    Rules(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
