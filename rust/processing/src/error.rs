use thiserror::Error;

/// Result type for generation requests
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors that end a generation request
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Drawing(#[from] ifc_lite_drawing::Error),

    #[error("Geometry context unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Geometry producer failed: {0}")]
    Geometry(String),

    #[error("Request superseded by a newer request")]
    Superseded,

    #[error("Drawing panel disposed")]
    Disposed,

    #[error("Generation task panicked")]
    Panicked,
}

impl GenerationError {
    /// Short text for the panel's error state. Internal details stay in the logs.
    pub fn user_message(&self) -> String {
        use ifc_lite_drawing::Error as DrawingError;

        match self {
            GenerationError::Drawing(DrawingError::NoMeshes) => {
                "The model has no geometry to draw.".to_string()
            }
            GenerationError::Drawing(DrawingError::InvalidConfig(reason)) => {
                format!("Invalid section settings: {reason}.")
            }
            GenerationError::Drawing(DrawingError::Cancelled) | GenerationError::Superseded => {
                "Generation was replaced by a newer request.".to_string()
            }
            GenerationError::Drawing(DrawingError::Rules(_)) => "The style rules could not be read.".to_string(),
            GenerationError::Drawing(DrawingError::Json(_)) => "The drawing data could not be read.".to_string(),
            GenerationError::ResourceUnavailable(_) => {
                "The geometry engine is not available. Please retry.".to_string()
            }
            GenerationError::Geometry(_) => "The model geometry could not be processed. Please retry.".to_string(),
            GenerationError::Disposed => "The drawing panel was closed.".to_string(),
            GenerationError::Panicked => "Drawing generation failed unexpectedly. Please retry.".to_string(),
        }
    }
}
