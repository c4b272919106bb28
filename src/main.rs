//! CaptchaLab - Main CLI Entry Point

use anyhow::{Context, Result};
use captcha_lab::{
    classifier::HeuristicClassifier,
    cli::{Args, Commands, Config, Verbosity},
    export, logging,
    presentation::{EventBus, TerminalDisplay},
    provider::SyntheticProvider,
    refinement::{CancelToken, RefinementController, SampleReport},
    telemetry::{TelemetryCollector, TelemetryDisplay},
    types::StyleParams,
    LabError,
};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

type Controller = RefinementController<SyntheticProvider, HeuristicClassifier>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Err(e) = args.validate() {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(2);
    }

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    let verbosity = if args.quiet || args.verbose > 0 {
        args.verbosity()
    } else {
        config.default_verbosity()
    };
    if !config.telemetry.color_output {
        colored::control::set_override(false);
    }
    if let Err(e) = logging::init(verbosity) {
        eprintln!("{}: {}", "Warning".yellow(), e);
    }

    let provider = match args.seed.or(config.sampling.seed) {
        Some(seed) => SyntheticProvider::with_seed(config.render, seed),
        None => SyntheticProvider::new(config.render),
    };
    let mut controller = RefinementController::new(provider, HeuristicClassifier::new());
    let telemetry = TelemetryCollector::new();
    let mut display = TerminalDisplay::new(verbosity)
        .with_progress_bars(config.telemetry.show_progress_bars);

    match args.command {
        Commands::Config => show_config(&config),

        Commands::Generate {
            noise,
            distortion,
            clutter,
            length,
            save,
            out,
        } => {
            let defaults = StyleParams::default();
            let style = StyleParams {
                noise: noise.unwrap_or(defaults.noise),
                distortion: distortion.unwrap_or(defaults.distortion),
                clutter: clutter.unwrap_or(defaults.clutter),
                text_length: length.unwrap_or(config.render.text_length),
            };
            let report = controller.generate_once(&style, &mut (&mut display, telemetry))?;
            maybe_save(&report, save, out, &config, verbosity)
        }

        Commands::Refine { target, save, out } => {
            let target = match target {
                Some(target) => target,
                None => config.target()?,
            };
            let report = controller.refine_once(target, &mut (&mut display, telemetry))?;
            maybe_save(&report, save, out, &config, verbosity)
        }

        Commands::Session {
            target,
            grid,
            rounds,
            stop_when_stable,
            report,
        } => {
            let mut session = config.session_config()?;
            if let Some(target) = target {
                session.target = target;
            }
            if let Some(grid) = grid {
                session.grid_size = grid;
            }
            if let Some(rounds) = rounds {
                session.rounds = rounds;
            }
            if stop_when_stable {
                let mut stopping = config.clone();
                stopping.stopping.rule = "variance".to_string();
                session.stopping = stopping.stopping_rule()?;
            }
            session.validate()?;

            display.show_banner(env!("CARGO_PKG_VERSION"));
            run_session(controller, session, display, telemetry.clone(), report).await?;
            TelemetryDisplay::new(telemetry, verbosity).display_summary();
            Ok(())
        }
    }
}

/// Run a refinement session on a blocking worker while rendering its events
async fn run_session(
    controller: Controller,
    session: captcha_lab::refinement::SessionConfig,
    mut display: TerminalDisplay,
    telemetry: TelemetryCollector,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let (bus, mut events) = EventBus::new();
    let cancel = CancelToken::new();

    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    display.begin_session(session.target, session.grid_size, session.rounds);
    let worker = tokio::task::spawn_blocking(move || {
        let mut controller = controller;
        let mut sink = (bus, telemetry);
        controller.run_session(session, &mut sink, &cancel)
    });

    // The channel closes once the worker drops its sink
    while let Some(event) = events.recv().await {
        display.handle(&event);
    }

    match worker.await.context("Refinement worker panicked")? {
        Ok(summary) => {
            if let Some(path) = report_path {
                export::save_report(&summary, &path)?;
                println!("Report written to {}", path.display());
            }
            Ok(())
        }
        Err(LabError::Cancelled { round }) => {
            eprintln!("{} during round {}", "Session cancelled".yellow().bold(), round);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn maybe_save(
    report: &SampleReport,
    save: bool,
    out: Option<PathBuf>,
    config: &Config,
    verbosity: Verbosity,
) -> Result<()> {
    if !save {
        return Ok(());
    }
    let dir = out.unwrap_or_else(|| config.output_dir());
    let path = export::save_sample(&report.sample, &dir)?;
    if verbosity.show_progress() {
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to serialize config")?;
    match Config::default_path() {
        Some(path) => println!("{} {}", "# Config file:".dimmed(), path.display()),
        None => println!("{}", "# No home directory; using built-in defaults".dimmed()),
    }
    println!("{}", rendered);
    Ok(())
}
