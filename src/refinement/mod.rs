//! Refinement sessions
//!
//! The controller drives the round loop through the phase state machine,
//! commits each round to the tracker and hands reports to a presentation
//! sink.

pub mod cancel;
pub mod controller;
pub mod report;
pub mod sink;
pub mod state;

pub use cancel::CancelToken;
pub use controller::{ControllerState, RefinementController, SessionConfig};
pub use report::{RoundReport, SampleReport, SessionSummary};
pub use sink::PresentationSink;
pub use state::{PhaseEvent, RefinementPhase};
