//! Cooperative cancellation for refinement sessions

use crate::errors::{LabError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag checked between rounds and between cells
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with [`LabError::Cancelled`] if cancellation was requested
    pub fn check(&self, round: usize) -> Result<()> {
        if self.is_cancelled() {
            return Err(LabError::Cancelled { round });
        }
        Ok(())
    }
}
