//! Terminal presentation
//!
//! The event bus carries owned copies of sink callbacks off the refinement
//! thread; the terminal display renders them.

pub mod display;
pub mod events;

pub use display::TerminalDisplay;
pub use events::{EventBus, LabEvent};
