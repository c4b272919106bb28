//! Confidence aggregation for a single round

use crate::analysis::types::{ConfidenceGrid, RoundOutcome};
use crate::classifier::DifficultyClassifier;
use crate::errors::{LabError, Result};
use crate::provider::SampleProvider;
use crate::refinement::CancelToken;
use crate::types::Difficulty;
use std::time::Instant;
use tracing::trace;

/// Draws and classifies an N×N grid of fresh samples per round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceAggregator {
    grid_size: usize,
    cells: usize,
}

/// Draws per round for a `grid_size`×`grid_size` grid
///
/// Rejects zero and sizes whose square does not fit in `usize`.
pub fn cell_count(grid_size: usize) -> Result<usize> {
    if grid_size == 0 {
        return Err(LabError::InvalidConfiguration(
            "grid size must be at least 1".to_string(),
        ));
    }
    grid_size.checked_mul(grid_size).ok_or_else(|| {
        LabError::InvalidConfiguration(format!(
            "grid size {} overflows the per-round cell count",
            grid_size
        ))
    })
}

impl ConfidenceAggregator {
    /// Create an aggregator for `grid_size`×`grid_size` rounds
    pub fn new(grid_size: usize) -> Result<Self> {
        let cells = cell_count(grid_size)?;
        Ok(Self { grid_size, cells })
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Number of draws per round
    pub fn cells(&self) -> usize {
        self.cells
    }

    /// Run one round at `target`
    ///
    /// Performs exactly `grid_size²` refine+classify pairs in row-major
    /// order. The first failure (or a tripped cancellation token) aborts the
    /// round and nothing drawn so far escapes.
    pub fn run_round<P, C>(
        &self,
        round: usize,
        target: Difficulty,
        provider: &mut P,
        classifier: &mut C,
        cancel: &CancelToken,
    ) -> Result<RoundOutcome>
    where
        P: SampleProvider + ?Sized,
        C: DifficultyClassifier + ?Sized,
    {
        let started = Instant::now();
        let mut cells = Vec::new();
        let mut labels = Vec::new();

        for cell in 0..self.cells() {
            cancel.check(round)?;

            let sample = provider.refine(target)?;
            let prediction = classifier.classify(sample.image())?;
            trace!(
                round,
                cell,
                label = %prediction.label(),
                confidence = prediction.confidence(),
                "cell classified"
            );

            cells.push(prediction.confidence());
            labels.push(prediction.label());
        }

        let grid = ConfidenceGrid::from_cells(self.grid_size, cells, labels)?;
        let mean = grid.mean();
        Ok(RoundOutcome {
            grid,
            mean,
            duration: started.elapsed(),
        })
    }
}
