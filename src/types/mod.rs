//! Type definitions module
//!
//! Core value types shared by the providers, the classifier and the
//! refinement loop.

pub mod difficulty;
pub mod sample;

// Re-export commonly used types
pub use difficulty::Difficulty;
pub use sample::{PredictionResult, Sample, StyleParams};
