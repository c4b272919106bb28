//! Round aggregation and convergence tracking
//!
//! The aggregator turns one round of draws into a grid and a mean, the
//! tracker accumulates round means and the global running average, and the
//! stability detector judges whether the round means have settled.

pub mod aggregator;
pub mod convergence;
pub mod tracker;
pub mod types;

pub use aggregator::ConfidenceAggregator;
pub use convergence::{StabilityConfig, StabilityDetector, StoppingRule};
pub use tracker::{ConvergenceTracker, RunningAverage, TrackerSnapshot};
pub use types::{ConfidenceGrid, RoundOutcome, StabilityVerdict, TerminationReason, VelocityMetric};
