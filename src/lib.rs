//! CaptchaLab - synthetic CAPTCHA refinement workbench
//!
//! Draws synthetic CAPTCHA samples, scores them with a difficulty
//! classifier, and runs closed-loop refinement sessions that sample N×N
//! grids at a target difficulty and track whether confidence settles.
//!
//! # Architecture
//!
//! - **provider** / **classifier**: collaborator traits plus built-in implementations
//! - **analysis**: round aggregation, convergence tracking, stability detection
//! - **refinement**: session state machine, controller, presentation sink
//! - **presentation** / **telemetry**: terminal rendering and run statistics

pub mod errors;
pub mod types;

// Re-export commonly used types
pub use errors::{LabError, Result};

// Collaborators
pub mod classifier;
pub mod provider;

// Refinement core
pub mod analysis;
pub mod refinement;

// Interface layer
pub mod cli;
pub mod export;
pub mod logging;
pub mod presentation;
pub mod telemetry;
