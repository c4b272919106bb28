//! Analysis system type definitions

use crate::analysis::aggregator::cell_count;
use crate::errors::{LabError, Result};
use crate::types::Difficulty;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fully populated N×N grid of confidences, row-major
///
/// A grid can only be built from exactly N² cells, so a partially drawn
/// round never has a grid to read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceGrid {
    size: usize,
    cells: Vec<f64>,
    labels: Vec<Difficulty>,
}

impl ConfidenceGrid {
    /// Build a grid from row-major cells and their predicted labels
    pub fn from_cells(size: usize, cells: Vec<f64>, labels: Vec<Difficulty>) -> Result<Self> {
        let expected = cell_count(size)?;
        if cells.len() != expected || labels.len() != cells.len() {
            return Err(LabError::Generic(format!(
                "grid of size {} needs {} cells, got {} confidences and {} labels",
                size,
                expected,
                cells.len(),
                labels.len()
            )));
        }
        Ok(Self { size, cells, labels })
    }

    /// Side length N
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    pub fn labels(&self) -> &[Difficulty] {
        &self.labels
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.size || col >= self.size {
            return None;
        }
        self.cells.get(row * self.size + col).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.cells.chunks(self.size)
    }

    /// Arithmetic mean of every cell
    pub fn mean(&self) -> f64 {
        self.cells.iter().sum::<f64>() / self.cells.len() as f64
    }

    pub fn min(&self) -> f64 {
        self.cells.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.cells.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Fraction of cells whose predicted label equals `target`
    pub fn label_agreement(&self, target: Difficulty) -> f64 {
        let hits = self.labels.iter().filter(|label| **label == target).count();
        hits as f64 / self.labels.len() as f64
    }
}

/// Result of one completed round
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub grid: ConfidenceGrid,
    pub mean: f64,
    pub duration: Duration,
}

/// Rate of change of the round means over a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityMetric {
    /// Change in round mean across the window
    pub delta_mean: f64,

    /// Rounds spanned by the window
    pub delta_rounds: usize,

    /// Mean change per round
    pub velocity: f64,
}

impl VelocityMetric {
    pub fn calculate(mean_start: f64, mean_end: f64, delta_rounds: usize) -> Self {
        let delta_mean = mean_end - mean_start;
        let velocity = if delta_rounds > 0 {
            delta_mean / delta_rounds as f64
        } else {
            0.0
        };
        Self {
            delta_mean,
            delta_rounds,
            velocity,
        }
    }
}

/// Measured stability of the round-mean series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum StabilityVerdict {
    /// The last `window` round means lie within the configured spread
    Stable { std_dev: f64, window: usize },

    /// The last `window` round means are still spread out
    Drifting { std_dev: f64, window: usize },

    /// Too few rounds to judge
    InsufficientData { rounds_needed: usize },
}

impl StabilityVerdict {
    pub fn is_stable(&self) -> bool {
        matches!(self, StabilityVerdict::Stable { .. })
    }

    /// Short label for terminal output
    pub fn label(&self) -> &'static str {
        match self {
            StabilityVerdict::Stable { .. } => "stable",
            StabilityVerdict::Drifting { .. } => "drifting",
            StabilityVerdict::InsufficientData { .. } => "insufficient data",
        }
    }
}

/// Why a session stopped drawing rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// All configured rounds ran
    RoundBudget,

    /// The stopping rule saw stable round means before the budget ran out
    Stabilized,
}
