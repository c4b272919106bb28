//! Error types for CaptchaLab
//!
//! A single error enum covers the collaborator failures (provider,
//! classifier), configuration rejections, and the ambient I/O and encoding
//! failures of the binary.

use thiserror::Error;

/// Main error type for the refinement system
#[derive(Error, Debug)]
pub enum LabError {
    /// The sample provider could not produce a sample for the given parameters
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// The classifier could not score an image
    #[error("Classification error: {0}")]
    ClassificationError(String),

    /// Rejected before any sampling begins
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Refinement state machine transition errors
    #[error("Invalid phase transition from {from} via {event}")]
    InvalidTransition { from: String, event: String },

    /// Session stopped through its cancellation token
    #[error("Session cancelled during round {round}")]
    Cancelled { round: usize },

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Image encoding errors
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("Lab error: {0}")]
    Generic(String),
}

impl LabError {
    /// Whether the error came from one of the external collaborators
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            LabError::ProviderError(_) | LabError::ClassificationError(_)
        )
    }
}

/// Result type alias for lab operations
pub type Result<T> = std::result::Result<T, LabError>;

/// Convert anyhow errors to LabError
impl From<anyhow::Error> for LabError {
    fn from(err: anyhow::Error) -> Self {
        LabError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LabError::InvalidConfiguration("grid size must be at least 1".to_string());
        assert!(err.to_string().contains("grid size"));
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = LabError::InvalidTransition {
            from: "Idle".to_string(),
            event: "RoundCommitted".to_string(),
        };
        assert!(err.to_string().contains("Idle"));
        assert!(err.to_string().contains("RoundCommitted"));
    }

    #[test]
    fn test_collaborator_failure() {
        assert!(LabError::ProviderError("x".into()).is_collaborator_failure());
        assert!(LabError::ClassificationError("x".into()).is_collaborator_failure());
        assert!(!LabError::Cancelled { round: 1 }.is_collaborator_failure());
    }
}
