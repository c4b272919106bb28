//! Refinement controller
//!
//! Owns the collaborators and the convergence tracker. Each session gets an
//! explicit [`ControllerState`] from [`RefinementController::start_session`]
//! and is driven one round at a time through [`RefinementController::run_round`],
//! or end to end through [`RefinementController::run_session`].
//!
//! The tracker is only written at a round's commit point, after every cell
//! of the grid has been drawn, so a failed or cancelled round leaves the
//! history and the running average exactly as they were.

use crate::analysis::aggregator::cell_count;
use crate::analysis::{
    ConfidenceAggregator, ConvergenceTracker, StabilityDetector, StoppingRule, TerminationReason,
};
use crate::classifier::DifficultyClassifier;
use crate::errors::{LabError, Result};
use crate::provider::SampleProvider;
use crate::refinement::cancel::CancelToken;
use crate::refinement::report::{RoundReport, SampleReport, SessionSummary};
use crate::refinement::sink::PresentationSink;
use crate::refinement::state::{PhaseEvent, RefinementPhase};
use crate::types::{Difficulty, Sample, StyleParams};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default round budget
pub const DEFAULT_ROUNDS: usize = 6;

/// Default grid side length
pub const DEFAULT_GRID_SIZE: usize = 4;

/// Parameters of one refinement session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub target: Difficulty,
    pub grid_size: usize,
    pub rounds: usize,
    pub stopping: StoppingRule,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target: Difficulty::Medium,
            grid_size: DEFAULT_GRID_SIZE,
            rounds: DEFAULT_ROUNDS,
            stopping: StoppingRule::FixedRounds,
        }
    }
}

impl SessionConfig {
    pub fn new(target: Difficulty, grid_size: usize, rounds: usize) -> Self {
        Self {
            target,
            grid_size,
            rounds,
            ..Default::default()
        }
    }

    pub fn with_stopping(mut self, stopping: StoppingRule) -> Self {
        self.stopping = stopping;
        self
    }

    pub fn validate(&self) -> Result<()> {
        cell_count(self.grid_size)?;
        if self.rounds == 0 {
            return Err(LabError::InvalidConfiguration(
                "round count must be at least 1".to_string(),
            ));
        }
        self.stopping.validate()
    }
}

/// Per-session state, alive from `start_session` until the session ends
#[derive(Debug, Clone)]
pub struct ControllerState {
    session_id: Uuid,
    config: SessionConfig,
    aggregator: ConfidenceAggregator,
    detector: StabilityDetector,
    phase: RefinementPhase,
    rounds_completed: usize,
    termination: Option<TerminationReason>,
    started_at: DateTime<Utc>,
}

impl ControllerState {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> RefinementPhase {
        self.phase
    }

    pub fn rounds_completed(&self) -> usize {
        self.rounds_completed
    }

    /// Why the session stopped, once it reached `Done`
    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    fn advance(&mut self, event: PhaseEvent) -> Result<()> {
        self.phase = self.phase.transition(event)?;
        Ok(())
    }
}

/// Drives refinement sessions over a provider and a classifier
pub struct RefinementController<P, C> {
    provider: P,
    classifier: C,
    tracker: ConvergenceTracker,
}

impl<P, C> RefinementController<P, C>
where
    P: SampleProvider,
    C: DifficultyClassifier,
{
    pub fn new(provider: P, classifier: C) -> Self {
        Self {
            provider,
            classifier,
            tracker: ConvergenceTracker::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn tracker(&self) -> &ConvergenceTracker {
        &self.tracker
    }

    /// Running average over every confidence observed so far
    pub fn running_average(&self) -> f64 {
        self.tracker.current_average()
    }

    /// Forget the history and the running average
    pub fn reset(&mut self) {
        self.tracker.reset();
    }

    /// Manual draw from explicit style parameters
    pub fn generate_once<S>(&mut self, style: &StyleParams, sink: &mut S) -> Result<SampleReport>
    where
        S: PresentationSink + ?Sized,
    {
        let sample = self.provider.generate(style)?;
        self.classify_manual(sample, sink)
    }

    /// Single refine-and-classify draw at `target`
    ///
    /// Folds the confidence into the running average without touching the
    /// round history.
    pub fn refine_once<S>(&mut self, target: Difficulty, sink: &mut S) -> Result<SampleReport>
    where
        S: PresentationSink + ?Sized,
    {
        self.check_target(target)?;
        let sample = self.provider.refine(target)?;
        self.classify_manual(sample, sink)
    }

    fn classify_manual<S>(&mut self, sample: Sample, sink: &mut S) -> Result<SampleReport>
    where
        S: PresentationSink + ?Sized,
    {
        let prediction = self.classifier.classify(sample.image())?;
        self.tracker.record_sample(prediction.confidence());

        let report = SampleReport {
            sample,
            prediction,
            running_average: self.tracker.current_average(),
        };
        debug!(
            text = report.sample.text(),
            label = %prediction.label(),
            confidence = prediction.confidence(),
            running_average = report.running_average,
            "manual sample classified"
        );
        sink.on_sample(&report);
        Ok(report)
    }

    fn check_target(&self, target: Difficulty) -> Result<()> {
        if !self.provider.accepts(target) {
            return Err(LabError::InvalidConfiguration(format!(
                "provider '{}' does not accept target difficulty '{}'",
                self.provider.name(),
                target
            )));
        }
        Ok(())
    }

    /// Validate `config` and open a session
    ///
    /// Clears the round history; the running average carries over.
    pub fn start_session(&mut self, config: SessionConfig) -> Result<ControllerState> {
        config.validate()?;
        self.check_target(config.target)?;
        let aggregator = ConfidenceAggregator::new(config.grid_size)?;

        self.tracker.begin_session();
        let mut state = ControllerState {
            session_id: Uuid::new_v4(),
            config,
            aggregator,
            detector: config.stopping.detector(),
            phase: RefinementPhase::Idle,
            rounds_completed: 0,
            termination: None,
            started_at: Utc::now(),
        };
        state.advance(PhaseEvent::Start)?;

        info!(
            session = %state.session_id,
            target = %config.target,
            grid_size = config.grid_size,
            rounds = config.rounds,
            provider = self.provider.name(),
            classifier = self.classifier.name(),
            "refinement session started"
        );
        Ok(state)
    }

    /// Run the round `state` is sampling and report it
    pub fn run_round<S>(
        &mut self,
        state: &mut ControllerState,
        sink: &mut S,
        cancel: &CancelToken,
    ) -> Result<RoundReport>
    where
        S: PresentationSink + ?Sized,
    {
        let round = match state.phase {
            RefinementPhase::Sampling { round } => round,
            other => {
                return Err(LabError::InvalidTransition {
                    from: other.to_string(),
                    event: "run_round".to_string(),
                });
            }
        };

        let drawn = cancel.check(round).and_then(|()| {
            state.aggregator.run_round(
                round,
                state.config.target,
                &mut self.provider,
                &mut self.classifier,
                cancel,
            )
        });
        let outcome = match drawn {
            Ok(outcome) => outcome,
            Err(err) => {
                let event = match &err {
                    LabError::Cancelled { .. } => PhaseEvent::Cancel,
                    _ => PhaseEvent::RoundFailed,
                };
                state.advance(event)?;
                warn!(session = %state.session_id, round, error = %err, "round aborted");
                sink.on_round_failed(round, &err);
                return Err(err);
            }
        };

        state.advance(PhaseEvent::GridComplete)?;
        self.tracker.commit_round(&outcome);
        state.rounds_completed += 1;
        state.advance(PhaseEvent::RoundCommitted)?;

        let verdict = state.detector.assess(self.tracker.history());
        let report = RoundReport {
            session_id: state.session_id,
            round,
            rounds: state.config.rounds,
            target: state.config.target,
            grid: outcome.grid,
            mean: outcome.mean,
            history: self.tracker.history().to_vec(),
            running_average: self.tracker.current_average(),
            verdict,
            velocity: state.detector.velocity(self.tracker.history()),
            duration_ms: outcome.duration.as_millis() as u64,
        };
        debug!(
            session = %state.session_id,
            round,
            mean = report.mean,
            running_average = report.running_average,
            verdict = report.verdict.label(),
            "round committed"
        );
        sink.on_round(&report);

        match state
            .config
            .stopping
            .decide(state.rounds_completed, state.config.rounds, &report.verdict)
        {
            Some(reason) => {
                state.termination = Some(reason);
                state.advance(PhaseEvent::Finish)?;
            }
            None => state.advance(PhaseEvent::NextRound)?,
        }
        Ok(report)
    }

    /// Close a session that reached `Done`
    pub fn finish_session(&self, state: ControllerState) -> Result<SessionSummary> {
        let termination = match (state.phase, state.termination) {
            (RefinementPhase::Done, Some(reason)) => reason,
            (phase, _) => {
                return Err(LabError::InvalidTransition {
                    from: phase.to_string(),
                    event: "finish_session".to_string(),
                });
            }
        };

        let summary = SessionSummary {
            session_id: state.session_id,
            target: state.config.target,
            grid_size: state.config.grid_size,
            rounds_planned: state.config.rounds,
            rounds_completed: state.rounds_completed,
            history: self.tracker.history().to_vec(),
            running_average: self.tracker.current_average(),
            samples_seen: self.tracker.samples_seen(),
            verdict: state.detector.assess(self.tracker.history()),
            velocity: state.detector.velocity(self.tracker.history()),
            termination,
            started_at: state.started_at,
            finished_at: Utc::now(),
        };
        info!(
            session = %summary.session_id,
            rounds = summary.rounds_completed,
            running_average = summary.running_average,
            verdict = summary.verdict.label(),
            "refinement session finished"
        );
        Ok(summary)
    }

    /// Run a whole session: start, every round, finish
    pub fn run_session<S>(
        &mut self,
        config: SessionConfig,
        sink: &mut S,
        cancel: &CancelToken,
    ) -> Result<SessionSummary>
    where
        S: PresentationSink + ?Sized,
    {
        let mut state = self.start_session(config)?;
        while !state.phase().is_terminal() {
            self.run_round(&mut state, sink, cancel)?;
        }

        let summary = self.finish_session(state)?;
        sink.on_session_finished(&summary);
        Ok(summary)
    }
}
