//! Sample providers
//!
//! The refinement loop only sees the [`SampleProvider`] trait; the built-in
//! [`SyntheticProvider`] renders CAPTCHA-like images locally.

pub mod synthetic;

pub use synthetic::{RenderSettings, SyntheticProvider};

use crate::errors::Result;
use crate::types::{Difficulty, Sample, StyleParams};

/// Stochastic source of CAPTCHA samples
///
/// No determinism is expected between calls with identical arguments.
pub trait SampleProvider {
    /// Render a sample from explicit style parameters
    fn generate(&mut self, style: &StyleParams) -> Result<Sample>;

    /// Render a sample biased toward `target`, reporting the achieved level
    fn refine(&mut self, target: Difficulty) -> Result<Sample>;

    /// Whether `target` is a difficulty this provider can aim for
    fn accepts(&self, _target: Difficulty) -> bool {
        true
    }

    /// Short name used in logs
    fn name(&self) -> &str;
}
