//! Command-line argument parsing for CaptchaLab
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use crate::types::sample::MAX_CLUTTER_LINES;
use crate::types::Difficulty;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CaptchaLab - generate synthetic CAPTCHAs and watch classifier confidence converge
#[derive(Parser, Debug)]
#[command(name = "captcha-lab")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Generate synthetic CAPTCHAs and watch a classifier's confidence converge", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Seed for the sample provider (random when omitted)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render one sample from explicit style parameters and classify it
    Generate {
        /// Salt-and-pepper noise (0.0 to 1.0)
        #[arg(long)]
        noise: Option<f32>,

        /// Row-wave distortion (0.0 to 1.0)
        #[arg(long)]
        distortion: Option<f32>,

        /// Number of clutter lines
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_CLUTTER_LINES as i64))]
        clutter: Option<u32>,

        /// Ground-truth text length
        #[arg(long)]
        length: Option<usize>,

        /// Save the sample as PNG
        #[arg(long)]
        save: bool,

        /// Output directory for saved samples
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Draw one sample biased toward a difficulty and classify it
    Refine {
        /// Target difficulty: easy, medium or hard
        #[arg(short, long)]
        target: Option<Difficulty>,

        /// Save the sample as PNG
        #[arg(long)]
        save: bool,

        /// Output directory for saved samples
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Run a multi-round refinement session
    Session {
        /// Target difficulty: easy, medium or hard
        #[arg(short, long)]
        target: Option<Difficulty>,

        /// Grid side length N (N×N draws per round)
        #[arg(short, long)]
        grid: Option<usize>,

        /// Round budget
        #[arg(short, long)]
        rounds: Option<usize>,

        /// Stop early once the trailing round means are stable
        #[arg(long)]
        stop_when_stable: bool,

        /// Write the session summary as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::from_count(self.verbose)
        }
    }

    /// Reject contradictory flags
    pub fn validate(&self) -> Result<(), String> {
        if self.quiet && self.verbose > 0 {
            return Err("Cannot combine --quiet with --verbose.".to_string());
        }
        if let Commands::Session {
            grid: Some(0), ..
        } = self.command
        {
            return Err("--grid must be at least 1.".to_string());
        }
        if let Commands::Session {
            rounds: Some(0), ..
        } = self.command
        {
            return Err("--rounds must be at least 1.".to_string());
        }
        Ok(())
    }
}

impl Verbosity {
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::VeryVerbose,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Parse the config-file spelling
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "quiet" => Some(Verbosity::Quiet),
            "normal" => Some(Verbosity::Normal),
            "verbose" => Some(Verbosity::Verbose),
            "very_verbose" => Some(Verbosity::VeryVerbose),
            _ => None,
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show per-round grids
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
