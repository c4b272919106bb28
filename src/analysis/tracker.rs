//! Convergence history and running confidence average

use crate::analysis::types::RoundOutcome;
use serde::{Deserialize, Serialize};

/// Incremental arithmetic mean
///
/// Folding uses `avg' = avg + (x - avg) / (count + 1)` so each update is
/// O(1) and no values are retained. An empty average reads as 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunningAverage {
    mean: f64,
    count: u64,
}

impl RunningAverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one value in
    pub fn fold(&mut self, value: f64) {
        self.mean += (value - self.mean) / (self.count + 1) as f64;
        self.count += 1;
    }

    pub fn value(&self) -> f64 {
        self.mean
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Point-in-time copy of the tracker for presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub history: Vec<f64>,
    pub running_average: f64,
    pub samples_seen: u64,
}

/// Round-mean history plus the global running average
///
/// Every individual confidence is folded into the running average exactly
/// once; round means only go to the history.
#[derive(Debug, Clone, Default)]
pub struct ConvergenceTracker {
    history: Vec<f64>,
    running: RunningAverage,
}

impl ConvergenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a completed round's mean
    pub fn record_round(&mut self, mean: f64) {
        self.history.push(mean);
    }

    /// Fold one observed confidence into the running average
    pub fn record_sample(&mut self, confidence: f64) {
        self.running.fold(confidence);
    }

    /// Commit a completed round: fold every cell, then append the mean
    pub fn commit_round(&mut self, outcome: &RoundOutcome) {
        for &confidence in outcome.grid.cells() {
            self.record_sample(confidence);
        }
        self.record_round(outcome.mean);
    }

    pub fn current_average(&self) -> f64 {
        self.running.value()
    }

    pub fn running_average(&self) -> &RunningAverage {
        &self.running
    }

    /// Means of completed rounds, oldest first
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn rounds_completed(&self) -> usize {
        self.history.len()
    }

    pub fn samples_seen(&self) -> u64 {
        self.running.count()
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            history: self.history.clone(),
            running_average: self.current_average(),
            samples_seen: self.samples_seen(),
        }
    }

    /// Start a new history; the running average carries over
    pub fn begin_session(&mut self) {
        self.history.clear();
    }

    /// Forget everything
    pub fn reset(&mut self) {
        self.history.clear();
        self.running = RunningAverage::new();
    }
}
