//! Presentation sink interface
//!
//! Sinks receive read-only reports between rounds. They never see a round
//! that has not been committed.

use crate::errors::LabError;
use crate::refinement::report::{RoundReport, SampleReport, SessionSummary};

/// Observer for refinement progress
pub trait PresentationSink {
    /// A manual generation or refine-once draw was classified
    fn on_sample(&mut self, _report: &SampleReport) {}

    /// A round was committed
    fn on_round(&mut self, _report: &RoundReport) {}

    /// A round was aborted; history and average are unchanged
    fn on_round_failed(&mut self, _round: usize, _error: &LabError) {}

    /// A session ran to completion
    fn on_session_finished(&mut self, _summary: &SessionSummary) {}
}

/// Discards everything
impl PresentationSink for () {}

impl<S: PresentationSink + ?Sized> PresentationSink for &mut S {
    fn on_sample(&mut self, report: &SampleReport) {
        (**self).on_sample(report)
    }

    fn on_round(&mut self, report: &RoundReport) {
        (**self).on_round(report)
    }

    fn on_round_failed(&mut self, round: usize, error: &LabError) {
        (**self).on_round_failed(round, error)
    }

    fn on_session_finished(&mut self, summary: &SessionSummary) {
        (**self).on_session_finished(summary)
    }
}

/// Fan out to two sinks, left first
impl<A: PresentationSink, B: PresentationSink> PresentationSink for (A, B) {
    fn on_sample(&mut self, report: &SampleReport) {
        self.0.on_sample(report);
        self.1.on_sample(report);
    }

    fn on_round(&mut self, report: &RoundReport) {
        self.0.on_round(report);
        self.1.on_round(report);
    }

    fn on_round_failed(&mut self, round: usize, error: &LabError) {
        self.0.on_round_failed(round, error);
        self.1.on_round_failed(round, error);
    }

    fn on_session_finished(&mut self, summary: &SessionSummary) {
        self.0.on_session_finished(summary);
        self.1.on_session_finished(summary);
    }
}
