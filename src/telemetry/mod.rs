//! Telemetry system for CaptchaLab
//!
//! Collects sample, round and session events as a presentation sink and
//! prints an end-of-run summary.

use crate::cli::Verbosity;
use crate::errors::LabError;
use crate::refinement::{PresentationSink, RoundReport, SampleReport, SessionSummary};
use crate::types::Difficulty;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    SampleClassified {
        label: Difficulty,
        confidence: f64,
        timestamp: Instant,
    },
    RoundCompleted {
        round: usize,
        cells: usize,
        mean: f64,
        duration_ms: u64,
        timestamp: Instant,
    },
    RoundFailed {
        round: usize,
        error: String,
        timestamp: Instant,
    },
    SessionFinished {
        rounds: usize,
        stable: bool,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    /// Manual draws plus every grid cell
    pub samples_classified: usize,
    pub rounds_completed: usize,
    pub rounds_failed: usize,
    pub sessions_finished: usize,
    pub stable_sessions: usize,
    pub round_time_ms: u64,
    pub lowest_round_mean: Option<f64>,
    pub highest_round_mean: Option<f64>,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                TelemetryEvent::SampleClassified { .. } => {
                    stats.samples_classified += 1;
                }
                TelemetryEvent::RoundCompleted {
                    cells,
                    mean,
                    duration_ms,
                    ..
                } => {
                    stats.samples_classified += cells;
                    stats.rounds_completed += 1;
                    stats.round_time_ms += duration_ms;
                    stats.lowest_round_mean =
                        Some(stats.lowest_round_mean.map_or(*mean, |low| low.min(*mean)));
                    stats.highest_round_mean =
                        Some(stats.highest_round_mean.map_or(*mean, |high| high.max(*mean)));
                }
                TelemetryEvent::RoundFailed { .. } => {
                    stats.rounds_failed += 1;
                }
                TelemetryEvent::SessionFinished { stable, .. } => {
                    stats.sessions_finished += 1;
                    if *stable {
                        stats.stable_sessions += 1;
                    }
                }
            }
        }

        lock(&self.events).push(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Share of attempted rounds that completed
    pub fn round_success_rate(&self) -> f64 {
        let stats = lock(&self.stats);
        let total = stats.rounds_completed + stats.rounds_failed;
        if total == 0 {
            1.0
        } else {
            stats.rounds_completed as f64 / total as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationSink for TelemetryCollector {
    fn on_sample(&mut self, report: &SampleReport) {
        self.record(TelemetryEvent::SampleClassified {
            label: report.prediction.label(),
            confidence: report.prediction.confidence(),
            timestamp: Instant::now(),
        });
    }

    fn on_round(&mut self, report: &RoundReport) {
        self.record(TelemetryEvent::RoundCompleted {
            round: report.round,
            cells: report.grid.cells().len(),
            mean: report.mean,
            duration_ms: report.duration_ms,
            timestamp: Instant::now(),
        });
    }

    fn on_round_failed(&mut self, round: usize, error: &LabError) {
        self.record(TelemetryEvent::RoundFailed {
            round,
            error: error.to_string(),
            timestamp: Instant::now(),
        });
    }

    fn on_session_finished(&mut self, summary: &SessionSummary) {
        self.record(TelemetryEvent::SessionFinished {
            rounds: summary.rounds_completed,
            stable: summary.verdict.is_stable(),
            timestamp: Instant::now(),
        });
    }
}

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: Verbosity,
}

impl TelemetryDisplay {
    pub fn new(collector: TelemetryCollector, verbosity: Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Display summary statistics
    pub fn display_summary(&self) {
        if !self.verbosity.show_progress() {
            return;
        }
        let stats = self.collector.get_stats();
        let elapsed = self.collector.elapsed();

        println!();
        println!("Run Summary");
        println!("─────────────────────────────────────");
        println!("Duration:            {:?}", elapsed);
        println!("Samples classified:  {}", stats.samples_classified);
        println!("Rounds completed:    {}", stats.rounds_completed);
        println!("Rounds failed:       {}", stats.rounds_failed);
        println!(
            "Round success rate:  {:.1}%",
            self.collector.round_success_rate() * 100.0
        );
        if let (Some(low), Some(high)) = (stats.lowest_round_mean, stats.highest_round_mean) {
            println!("Round mean range:    {:.3} – {:.3}", low, high);
        }
        if self.should_show_details() {
            println!("Time in rounds:      {}ms", stats.round_time_ms);
            println!("Events recorded:     {}", self.collector.event_count());
        }
        println!();
    }

    pub fn should_show_details(&self) -> bool {
        self.verbosity.show_events()
    }
}
