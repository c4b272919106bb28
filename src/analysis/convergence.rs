//! Stability detection over round means
//!
//! Judges whether the last few round means have settled and decides when a
//! session should stop drawing rounds.

use crate::analysis::types::{StabilityVerdict, TerminationReason, VelocityMetric};
use crate::errors::{LabError, Result};
use serde::{Deserialize, Serialize};

/// Stability detector configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// Number of trailing round means examined
    pub window: usize,

    /// Largest population standard deviation still considered stable
    pub max_std_dev: f64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            window: 3,
            max_std_dev: 0.05,
        }
    }
}

impl StabilityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window < 2 {
            return Err(LabError::InvalidConfiguration(format!(
                "stability window must cover at least 2 rounds, got {}",
                self.window
            )));
        }
        if !self.max_std_dev.is_finite() || self.max_std_dev < 0.0 {
            return Err(LabError::InvalidConfiguration(format!(
                "max_std_dev must be a non-negative number, got {}",
                self.max_std_dev
            )));
        }
        Ok(())
    }
}

/// Stability detector for round-mean series
#[derive(Debug, Clone, Default)]
pub struct StabilityDetector {
    config: StabilityConfig,
}

impl StabilityDetector {
    pub fn new() -> Self {
        Self::with_config(StabilityConfig::default())
    }

    pub fn with_config(config: StabilityConfig) -> Self {
        Self { config }
    }

    /// Assess the trailing window of `history`
    pub fn assess(&self, history: &[f64]) -> StabilityVerdict {
        let window = self.config.window;
        if history.len() < window {
            return StabilityVerdict::InsufficientData {
                rounds_needed: window - history.len(),
            };
        }

        let std_dev = std_dev(&history[history.len() - window..]);
        if std_dev <= self.config.max_std_dev {
            StabilityVerdict::Stable { std_dev, window }
        } else {
            StabilityVerdict::Drifting { std_dev, window }
        }
    }

    /// Change rate of the round means across the trailing window
    pub fn velocity(&self, history: &[f64]) -> Option<VelocityMetric> {
        if history.len() < 2 {
            return None;
        }
        let window = self.config.window.min(history.len());
        let start = history[history.len() - window];
        let end = history[history.len() - 1];
        Some(VelocityMetric::calculate(start, end, window - 1))
    }

    pub fn config(&self) -> &StabilityConfig {
        &self.config
    }
}

/// Population standard deviation; 0.0 for fewer than two values
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// When a session stops drawing rounds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum StoppingRule {
    /// Run exactly the configured number of rounds
    #[default]
    FixedRounds,

    /// Stop early once the trailing round means are stable
    Variance(StabilityConfig),
}

impl StoppingRule {
    pub fn validate(&self) -> Result<()> {
        match self {
            StoppingRule::FixedRounds => Ok(()),
            StoppingRule::Variance(config) => config.validate(),
        }
    }

    /// Detector matching this rule's window
    pub fn detector(&self) -> StabilityDetector {
        match self {
            StoppingRule::FixedRounds => StabilityDetector::new(),
            StoppingRule::Variance(config) => StabilityDetector::with_config(*config),
        }
    }

    /// Decide whether to stop after `rounds_completed` of `budget` rounds
    pub fn decide(
        &self,
        rounds_completed: usize,
        budget: usize,
        verdict: &StabilityVerdict,
    ) -> Option<TerminationReason> {
        if rounds_completed >= budget {
            return Some(TerminationReason::RoundBudget);
        }
        match self {
            StoppingRule::FixedRounds => None,
            StoppingRule::Variance(_) if verdict.is_stable() => Some(TerminationReason::Stabilized),
            StoppingRule::Variance(_) => None,
        }
    }
}
