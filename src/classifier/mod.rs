//! Difficulty classifiers
//!
//! The refinement loop only sees the [`DifficultyClassifier`] trait; the
//! built-in [`HeuristicClassifier`] scores images from pixel statistics.

pub mod heuristic;

pub use heuristic::{HeuristicClassifier, ImageFeatures};

use crate::errors::Result;
use crate::types::PredictionResult;
use image::GrayImage;

/// Scores a sample image with a difficulty label and a confidence in [0, 1]
pub trait DifficultyClassifier {
    fn classify(&mut self, image: &GrayImage) -> Result<PredictionResult>;

    /// Short name used in logs
    fn name(&self) -> &str;
}
