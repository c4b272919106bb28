//! Shared mock collaborators for integration tests

#![allow(dead_code)]

use captcha_lab::classifier::DifficultyClassifier;
use captcha_lab::provider::SampleProvider;
use captcha_lab::refinement::{PresentationSink, RoundReport, SampleReport, SessionSummary};
use captcha_lab::types::{Difficulty, PredictionResult, Sample, StyleParams};
use captcha_lab::{LabError, Result};
use image::GrayImage;

/// Provider that counts calls and returns tiny blank samples
#[derive(Default)]
pub struct CountingProvider {
    pub generate_calls: usize,
    pub refine_calls: usize,
}

impl SampleProvider for CountingProvider {
    fn generate(&mut self, style: &StyleParams) -> Result<Sample> {
        self.generate_calls += 1;
        Ok(Sample::new(GrayImage::new(4, 4), "MOCK", *style))
    }

    fn refine(&mut self, target: Difficulty) -> Result<Sample> {
        self.refine_calls += 1;
        let sample = Sample::new(GrayImage::new(4, 4), "MOCK", StyleParams::default());
        Ok(sample.with_target(target, target))
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Classifier that cycles through scripted confidences
pub struct ScriptedClassifier {
    values: Vec<f64>,
    pub calls: usize,
    /// 1-based call number that fails with a classification error
    pub fail_on: Option<usize>,
}

impl ScriptedClassifier {
    pub fn constant(value: f64) -> Self {
        Self::cycle(vec![value])
    }

    pub fn cycle(values: Vec<f64>) -> Self {
        Self {
            values,
            calls: 0,
            fail_on: None,
        }
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on = Some(call);
        self
    }
}

impl DifficultyClassifier for ScriptedClassifier {
    fn classify(&mut self, _image: &GrayImage) -> Result<PredictionResult> {
        self.calls += 1;
        if self.fail_on == Some(self.calls) {
            return Err(LabError::ClassificationError(format!(
                "scripted failure on call {}",
                self.calls
            )));
        }
        let value = self.values[(self.calls - 1) % self.values.len()];
        PredictionResult::new(Difficulty::Medium, value)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Sink that keeps everything it is shown
#[derive(Default)]
pub struct RecordingSink {
    pub samples: Vec<f64>,
    pub rounds: Vec<RoundReport>,
    pub failures: Vec<usize>,
    pub summaries: Vec<SessionSummary>,
}

impl PresentationSink for RecordingSink {
    fn on_sample(&mut self, report: &SampleReport) {
        self.samples.push(report.confidence());
    }

    fn on_round(&mut self, report: &RoundReport) {
        self.rounds.push(report.clone());
    }

    fn on_round_failed(&mut self, round: usize, _error: &LabError) {
        self.failures.push(round);
    }

    fn on_session_finished(&mut self, summary: &SessionSummary) {
        self.summaries.push(summary.clone());
    }
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
