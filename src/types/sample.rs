//! Sample and prediction value types

use crate::errors::{LabError, Result};
use crate::types::Difficulty;
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// Clutter line count that saturates the clutter term of the difficulty score
pub const MAX_CLUTTER: u32 = 12;

/// Most clutter lines a provider will draw
pub const MAX_CLUTTER_LINES: u32 = 64;

/// Longest ground-truth text a provider will render
pub const MAX_TEXT_LENGTH: usize = 12;

/// Style parameters that drive sample rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleParams {
    /// Salt-and-pepper noise probability (0.0 to 1.0)
    pub noise: f32,

    /// Row-wave distortion strength (0.0 to 1.0)
    pub distortion: f32,

    /// Number of clutter lines drawn over the text
    pub clutter: u32,

    /// Ground-truth text length
    pub text_length: usize,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            noise: 0.1,
            distortion: 0.2,
            clutter: 2,
            text_length: 5,
        }
    }
}

impl StyleParams {
    /// Check the parameters can be rendered
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.noise) {
            return Err(LabError::ProviderError(format!(
                "noise must be between 0.0 and 1.0, got {}",
                self.noise
            )));
        }
        if !(0.0..=1.0).contains(&self.distortion) {
            return Err(LabError::ProviderError(format!(
                "distortion must be between 0.0 and 1.0, got {}",
                self.distortion
            )));
        }
        if self.clutter > MAX_CLUTTER_LINES {
            return Err(LabError::ProviderError(format!(
                "clutter must be at most {} lines, got {}",
                MAX_CLUTTER_LINES, self.clutter
            )));
        }
        if self.text_length == 0 || self.text_length > MAX_TEXT_LENGTH {
            return Err(LabError::ProviderError(format!(
                "text length must be between 1 and {}, got {}",
                MAX_TEXT_LENGTH, self.text_length
            )));
        }
        Ok(())
    }

    /// Unit-scale difficulty implied by these parameters
    pub fn difficulty_score(&self) -> f64 {
        let clutter = (self.clutter.min(MAX_CLUTTER) as f64) / MAX_CLUTTER as f64;
        (0.4 * self.noise as f64 + 0.4 * self.distortion as f64 + 0.2 * clutter).clamp(0.0, 1.0)
    }

    /// Difficulty class implied by these parameters
    pub fn implied_level(&self) -> Difficulty {
        Difficulty::from_score(self.difficulty_score())
    }
}

/// One generated CAPTCHA instance
#[derive(Debug, Clone)]
pub struct Sample {
    image: GrayImage,
    text: String,
    style: StyleParams,
    target: Option<Difficulty>,
    achieved: Difficulty,
}

impl Sample {
    /// Create a sample rendered from explicit style parameters
    pub fn new(image: GrayImage, text: impl Into<String>, style: StyleParams) -> Self {
        Self {
            image,
            text: text.into(),
            style,
            target: None,
            achieved: style.implied_level(),
        }
    }

    /// Mark the sample as drawn toward `target`, reaching `achieved`
    pub fn with_target(mut self, target: Difficulty, achieved: Difficulty) -> Self {
        self.target = Some(target);
        self.achieved = achieved;
        self
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    /// Ground-truth text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &StyleParams {
        &self.style
    }

    /// Target difficulty, if the sample came from a refine request
    pub fn target(&self) -> Option<Difficulty> {
        self.target
    }

    /// Difficulty level the provider reports having produced
    pub fn achieved(&self) -> Difficulty {
        self.achieved
    }
}

/// Classifier output for exactly one sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    label: Difficulty,
    confidence: f64,
}

impl PredictionResult {
    /// Create a prediction, rejecting confidences outside [0, 1]
    pub fn new(label: Difficulty, confidence: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(LabError::ClassificationError(format!(
                "confidence {} is outside [0, 1]",
                confidence
            )));
        }
        Ok(Self { label, confidence })
    }

    pub fn label(&self) -> Difficulty {
        self.label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}
