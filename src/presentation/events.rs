//! Event bus for live refinement updates
//!
//! Publisher-subscriber bridge from the synchronous refinement loop to the
//! async terminal renderer, over a bounded channel.

use crate::errors::LabError;
use crate::refinement::{PresentationSink, RoundReport, SampleReport, SessionSummary};
use crate::types::Difficulty;
use tokio::sync::mpsc;

/// Channel capacity; a full channel makes the emitting worker wait
pub const EVENT_CAPACITY: usize = 100;

/// Owned copy of a presentation callback
#[derive(Debug, Clone)]
pub enum LabEvent {
    SampleDrawn {
        text: String,
        target: Option<Difficulty>,
        achieved: Difficulty,
        label: Difficulty,
        confidence: f64,
        running_average: f64,
    },
    RoundCompleted(RoundReport),
    RoundFailed {
        round: usize,
        error: String,
    },
    SessionFinished(SessionSummary),
}

impl From<&SampleReport> for LabEvent {
    fn from(report: &SampleReport) -> Self {
        LabEvent::SampleDrawn {
            text: report.sample.text().to_string(),
            target: report.sample.target(),
            achieved: report.sample.achieved(),
            label: report.prediction.label(),
            confidence: report.prediction.confidence(),
            running_average: report.running_average,
        }
    }
}

/// Event bus publishing refinement events to a single receiver
#[derive(Clone)]
pub struct EventBus {
    sender: mpsc::Sender<LabEvent>,
}

impl EventBus {
    /// Create new event bus with bounded channel
    pub fn new() -> (Self, mpsc::Receiver<LabEvent>) {
        let (sender, receiver) = mpsc::channel(EVENT_CAPACITY);
        (EventBus { sender }, receiver)
    }

    /// Publish an event, waiting for room when the channel is full
    ///
    /// Blocks the calling thread, so it must run outside the async runtime
    /// (the session worker runs on `spawn_blocking`). Events sent after the
    /// receiver is gone are discarded.
    pub fn emit(&self, event: LabEvent) {
        let _ = self.sender.blocking_send(event);
    }
}

impl PresentationSink for EventBus {
    fn on_sample(&mut self, report: &SampleReport) {
        self.emit(LabEvent::from(report));
    }

    fn on_round(&mut self, report: &RoundReport) {
        self.emit(LabEvent::RoundCompleted(report.clone()));
    }

    fn on_round_failed(&mut self, round: usize, error: &LabError) {
        self.emit(LabEvent::RoundFailed {
            round,
            error: error.to_string(),
        });
    }

    fn on_session_finished(&mut self, summary: &SessionSummary) {
        self.emit(LabEvent::SessionFinished(summary.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_event_emission() {
        let (bus, mut receiver) = EventBus::new();

        bus.emit(LabEvent::RoundFailed {
            round: 2,
            error: "provider down".to_string(),
        });

        match receiver.try_recv() {
            Ok(LabEvent::RoundFailed { round, error }) => {
                assert_eq!(round, 2);
                assert_eq!(error, "provider down");
            }
            other => panic!("unexpected receive result: {:?}", other),
        }
    }

    #[test]
    fn test_sink_failure_forwarded() {
        let (mut bus, mut receiver) = EventBus::new();

        bus.on_round_failed(1, &LabError::ProviderError("no glyphs".to_string()));

        let event = receiver.try_recv().expect("event queued");
        assert!(matches!(event, LabEvent::RoundFailed { round: 1, .. }));
    }

    #[test]
    fn test_full_channel_waits_instead_of_dropping() {
        let (bus, mut receiver) = EventBus::new();
        let total = EVENT_CAPACITY + 50;

        let producer = thread::spawn(move || {
            for round in 0..total {
                bus.emit(LabEvent::RoundFailed {
                    round,
                    error: String::new(),
                });
            }
        });

        // Let the producer fill the channel before draining
        thread::sleep(Duration::from_millis(20));
        let mut rounds = Vec::new();
        while let Some(event) = receiver.blocking_recv() {
            if let LabEvent::RoundFailed { round, .. } = event {
                rounds.push(round);
            }
        }
        producer.join().expect("producer thread");

        assert_eq!(rounds, (0..total).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_blocking_worker_feeds_async_consumer() {
        let (bus, mut receiver) = EventBus::new();

        let worker = tokio::task::spawn_blocking(move || {
            for round in 1..=EVENT_CAPACITY * 2 {
                bus.emit(LabEvent::RoundFailed {
                    round,
                    error: String::new(),
                });
            }
        });

        let mut received = 0;
        while receiver.recv().await.is_some() {
            received += 1;
        }
        worker.await.expect("worker task");
        assert_eq!(received, EVENT_CAPACITY * 2);
    }

    #[test]
    fn test_emit_after_receiver_dropped() {
        let (bus, receiver) = EventBus::new();
        drop(receiver);
        bus.emit(LabEvent::RoundFailed {
            round: 1,
            error: String::new(),
        });
    }
}
