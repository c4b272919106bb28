//! Logging setup
//!
//! Installs a global tracing subscriber writing to stderr so log lines never
//! interleave with the rendered grids on stdout. `RUST_LOG` overrides the
//! level derived from the command-line verbosity.

use crate::cli::Verbosity;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Errors that may occur while initializing logging
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Failed to set the global tracing subscriber
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Default filter directive for a verbosity level
pub fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "captcha_lab=info",
        Verbosity::VeryVerbose => "captcha_lab=trace",
    }
}

/// Initialize tracing; subsequent calls are no-ops
pub fn init(verbosity: Verbosity) -> Result<(), LoggingError> {
    if INITIALIZED.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let subscriber = Registry::default().with(env_filter).with(stderr_layer);
    tracing::subscriber::set_global_default(subscriber)?;
    let _ = INITIALIZED.set(());

    tracing::debug!(verbosity = verbosity.as_str(), "logging initialized");
    Ok(())
}
