//! Refinement phase state machine
//!
//! Valid transitions:
//! 1. Idle           → Sampling(1)     (on: Start)
//! 2. Sampling(r)    → Aggregating(r)  (on: GridComplete)
//! 3. Aggregating(r) → Reporting(r)    (on: RoundCommitted)
//! 4. Reporting(r)   → Sampling(r+1)   (on: NextRound)
//! 5. Reporting(r)   → Done            (on: Finish)
//! 6. Sampling | Aggregating → Failed  (on: RoundFailed)
//! 7. any non-terminal → Cancelled     (on: Cancel)
//! 8. Done, Failed, Cancelled are terminal self-loops

use crate::errors::{LabError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phases of a refinement session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefinementPhase {
    /// Session allocated, no round started
    Idle,

    /// Drawing the grid for round `round`
    Sampling { round: usize },

    /// Reducing and committing round `round`
    Aggregating { round: usize },

    /// Exposing round `round` to the presentation sink
    Reporting { round: usize },

    /// All rounds done (terminal)
    Done,

    /// A round failed (terminal)
    Failed,

    /// Stopped through the cancellation token (terminal)
    Cancelled,
}

/// Events that drive phase transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    Start,
    GridComplete,
    RoundCommitted,
    NextRound,
    Finish,
    RoundFailed,
    Cancel,
}

impl RefinementPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RefinementPhase::Done | RefinementPhase::Failed | RefinementPhase::Cancelled
        )
    }

    /// Round the phase belongs to, if any
    pub fn round(&self) -> Option<usize> {
        match self {
            RefinementPhase::Sampling { round }
            | RefinementPhase::Aggregating { round }
            | RefinementPhase::Reporting { round } => Some(*round),
            _ => None,
        }
    }

    /// Attempt a transition
    pub fn transition(&self, event: PhaseEvent) -> Result<RefinementPhase> {
        use PhaseEvent::*;
        use RefinementPhase::*;

        let next = match (*self, event) {
            (Done, _) => Done,
            (Failed, _) => Failed,
            (Cancelled, _) => Cancelled,

            (_, Cancel) => Cancelled,

            (Idle, Start) => Sampling { round: 1 },
            (Sampling { round }, GridComplete) => Aggregating { round },
            (Sampling { .. }, RoundFailed) => Failed,
            (Aggregating { round }, RoundCommitted) => Reporting { round },
            (Aggregating { .. }, RoundFailed) => Failed,
            (Reporting { round }, NextRound) => Sampling { round: round + 1 },
            (Reporting { .. }, Finish) => Done,

            (from, event) => {
                return Err(LabError::InvalidTransition {
                    from: from.to_string(),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next)
    }

    /// Human-readable phase name
    pub fn display_name(&self) -> &'static str {
        match self {
            RefinementPhase::Idle => "Idle",
            RefinementPhase::Sampling { .. } => "Sampling",
            RefinementPhase::Aggregating { .. } => "Aggregating",
            RefinementPhase::Reporting { .. } => "Reporting",
            RefinementPhase::Done => "Done",
            RefinementPhase::Failed => "Failed",
            RefinementPhase::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for RefinementPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.round() {
            Some(round) => write!(f, "{}({})", self.display_name(), round),
            None => f.write_str(self.display_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_round_cycle() {
        let phase = RefinementPhase::Idle;
        let phase = phase.transition(PhaseEvent::Start).unwrap();
        assert_eq!(phase, RefinementPhase::Sampling { round: 1 });

        let phase = phase.transition(PhaseEvent::GridComplete).unwrap();
        assert_eq!(phase, RefinementPhase::Aggregating { round: 1 });

        let phase = phase.transition(PhaseEvent::RoundCommitted).unwrap();
        assert_eq!(phase, RefinementPhase::Reporting { round: 1 });

        let phase = phase.transition(PhaseEvent::NextRound).unwrap();
        assert_eq!(phase, RefinementPhase::Sampling { round: 2 });
    }

    #[test]
    fn test_finish_from_reporting() {
        let phase = RefinementPhase::Reporting { round: 6 };
        assert_eq!(phase.transition(PhaseEvent::Finish).unwrap(), RefinementPhase::Done);
    }

    #[test]
    fn test_failure_paths() {
        assert_eq!(
            RefinementPhase::Sampling { round: 2 }
                .transition(PhaseEvent::RoundFailed)
                .unwrap(),
            RefinementPhase::Failed
        );
        assert!(RefinementPhase::Reporting { round: 2 }
            .transition(PhaseEvent::RoundFailed)
            .is_err());
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(RefinementPhase::Idle.transition(PhaseEvent::RoundCommitted).is_err());
        assert!(RefinementPhase::Sampling { round: 1 }
            .transition(PhaseEvent::Finish)
            .is_err());
        assert!(RefinementPhase::Aggregating { round: 1 }
            .transition(PhaseEvent::NextRound)
            .is_err());
    }

    #[test]
    fn test_cancel_from_any_live_phase() {
        for phase in [
            RefinementPhase::Idle,
            RefinementPhase::Sampling { round: 3 },
            RefinementPhase::Aggregating { round: 3 },
            RefinementPhase::Reporting { round: 3 },
        ] {
            assert_eq!(phase.transition(PhaseEvent::Cancel).unwrap(), RefinementPhase::Cancelled);
        }
    }

    #[test]
    fn test_terminal_states_absorb() {
        for phase in [
            RefinementPhase::Done,
            RefinementPhase::Failed,
            RefinementPhase::Cancelled,
        ] {
            assert!(phase.is_terminal());
            assert_eq!(phase.transition(PhaseEvent::Start).unwrap(), phase);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(RefinementPhase::Sampling { round: 4 }.to_string(), "Sampling(4)");
        assert_eq!(RefinementPhase::Done.to_string(), "Done");
    }
}
