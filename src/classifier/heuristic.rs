//! Pixel-statistics classifier
//!
//! Estimates noise from isolated ink pixels and clutter/distortion from the
//! density of ink transitions along rows, then maps the combined score onto
//! the difficulty bands.

use crate::classifier::DifficultyClassifier;
use crate::errors::{LabError, Result};
use crate::types::{Difficulty, PredictionResult};
use image::GrayImage;

/// Pixels darker than this count as ink
const INK_THRESHOLD: u8 = 128;

/// Isolated-ink ratio treated as maximal noise
const ISOLATED_SATURATION: f64 = 0.06;

/// Row transition density treated as maximal clutter
const TRANSITION_SATURATION: f64 = 0.25;

/// Raw measurements taken from one image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageFeatures {
    /// Fraction of pixels that are ink
    pub ink_ratio: f64,

    /// Fraction of pixels that are ink with at most one inked 4-neighbour
    pub isolated_ratio: f64,

    /// Ink/paper transitions per pixel of row width
    pub transition_density: f64,
}

impl ImageFeatures {
    /// Measure an image
    pub fn measure(image: &GrayImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(LabError::ClassificationError(
                "cannot classify an empty image".to_string(),
            ));
        }

        let is_ink = |x: u32, y: u32| image.get_pixel(x, y).0[0] < INK_THRESHOLD;
        let mut ink = 0usize;
        let mut isolated = 0usize;
        let mut transitions = 0usize;

        for y in 0..height {
            for x in 0..width {
                let here = is_ink(x, y);
                if x > 0 && here != is_ink(x - 1, y) {
                    transitions += 1;
                }
                if !here {
                    continue;
                }
                ink += 1;
                let neighbours = [
                    x > 0 && is_ink(x - 1, y),
                    x + 1 < width && is_ink(x + 1, y),
                    y > 0 && is_ink(x, y - 1),
                    y + 1 < height && is_ink(x, y + 1),
                ];
                if neighbours.iter().filter(|n| **n).count() <= 1 {
                    isolated += 1;
                }
            }
        }

        let pixels = (width as f64) * (height as f64);
        Ok(Self {
            ink_ratio: ink as f64 / pixels,
            isolated_ratio: isolated as f64 / pixels,
            transition_density: transitions as f64 / pixels,
        })
    }

    /// Combined unit-scale difficulty score
    pub fn score(&self) -> f64 {
        let noise = (self.isolated_ratio / ISOLATED_SATURATION).min(1.0);
        let clutter = (self.transition_density / TRANSITION_SATURATION).min(1.0);
        (0.6 * noise + 0.4 * clutter).clamp(0.0, 1.0)
    }
}

/// Classifier driven by [`ImageFeatures`]
#[derive(Debug, Default, Clone)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Confidence from the margin to the nearest boundary with another class
    ///
    /// Ranges from 0.5 on a boundary to 1.0 at the point furthest from one.
    fn confidence(score: f64, label: Difficulty) -> f64 {
        let (low, high) = label.band();
        let (margin, max_margin) = match label {
            Difficulty::Easy => (high - score, high - low),
            Difficulty::Hard => (score - low, high - low),
            Difficulty::Medium => ((score - low).min(high - score), (high - low) / 2.0),
        };
        (0.5 + 0.5 * (margin / max_margin).clamp(0.0, 1.0)).clamp(0.0, 1.0)
    }
}

impl DifficultyClassifier for HeuristicClassifier {
    fn classify(&mut self, image: &GrayImage) -> Result<PredictionResult> {
        let score = ImageFeatures::measure(image)?.score();
        let label = Difficulty::from_score(score);
        PredictionResult::new(label, Self::confidence(score, label))
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
