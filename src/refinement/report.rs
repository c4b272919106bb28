//! Reports handed to presentation sinks

use crate::analysis::{ConfidenceGrid, StabilityVerdict, TerminationReason, VelocityMetric};
use crate::types::{Difficulty, PredictionResult, Sample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of one manual generation or refine-once draw
#[derive(Debug, Clone)]
pub struct SampleReport {
    pub sample: Sample,
    pub prediction: PredictionResult,

    /// Running average after this sample was folded in
    pub running_average: f64,
}

impl SampleReport {
    pub fn confidence(&self) -> f64 {
        self.prediction.confidence()
    }
}

/// State exposed after each completed round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub session_id: Uuid,

    /// 1-based round number
    pub round: usize,

    /// Round budget of the session
    pub rounds: usize,

    pub target: Difficulty,
    pub grid: ConfidenceGrid,
    pub mean: f64,

    /// Round means so far, this round included
    pub history: Vec<f64>,

    pub running_average: f64,
    pub verdict: StabilityVerdict,

    /// Per-round change of the mean over the stability window; `None` before round 2
    pub velocity: Option<VelocityMetric>,

    pub duration_ms: u64,
}

/// Outcome of a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub target: Difficulty,
    pub grid_size: usize,
    pub rounds_planned: usize,
    pub rounds_completed: usize,
    pub history: Vec<f64>,
    pub running_average: f64,
    pub samples_seen: u64,
    pub verdict: StabilityVerdict,
    pub velocity: Option<VelocityMetric>,
    pub termination: TerminationReason,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SessionSummary {
    /// Mean of the last completed round
    pub fn final_mean(&self) -> Option<f64> {
        self.history.last().copied()
    }
}
