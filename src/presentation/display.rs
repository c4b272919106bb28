//! Terminal rendering of samples, rounds and sessions

use crate::analysis::{ConfidenceGrid, VelocityMetric};
use crate::cli::Verbosity;
use crate::errors::LabError;
use crate::presentation::events::LabEvent;
use crate::refinement::{PresentationSink, RoundReport, SampleReport, SessionSummary};
use crate::types::Difficulty;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Renders lab events to stdout
pub struct TerminalDisplay {
    verbosity: Verbosity,
    progress_bars: bool,
    progress: Option<ProgressBar>,
}

impl TerminalDisplay {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            progress_bars: true,
            progress: None,
        }
    }

    pub fn with_progress_bars(mut self, enabled: bool) -> Self {
        self.progress_bars = enabled;
        self
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str) {
        if !self.verbosity.show_progress() {
            return;
        }
        let width = 56;
        println!("{}", "=".repeat(width).cyan());
        println!("{}", format!("  CaptchaLab {}", version).bold().cyan());
        println!("{}", "=".repeat(width).cyan());
    }

    /// Open a round progress bar for a session
    pub fn begin_session(&mut self, target: Difficulty, grid_size: usize, rounds: usize) {
        self.emit_line(format!(
            "Refining toward {} with {}×{} grids over {} rounds",
            target.to_string().bold(),
            grid_size,
            grid_size,
            rounds
        ));
        if !self.progress_bars || !self.verbosity.show_progress() {
            return;
        }
        let pb = ProgressBar::new(rounds as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("Round [{bar:40.cyan/blue}] {pos}/{len} | {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        self.progress = Some(pb);
    }

    /// Render one event
    pub fn handle(&mut self, event: &LabEvent) {
        match event {
            LabEvent::SampleDrawn {
                text,
                target,
                achieved,
                label,
                confidence,
                running_average,
            } => {
                let target = target.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string());
                self.emit_line(format!(
                    "{} {}  target={} achieved={}  predicted {} @ {}  | avg {:.3}",
                    "Sample".bold(),
                    text.bold(),
                    target,
                    achieved,
                    label.to_string().bold(),
                    colorize(*confidence),
                    running_average
                ));
            }
            LabEvent::RoundCompleted(report) => self.render_round(report),
            LabEvent::RoundFailed { round, error } => {
                if let Some(pb) = self.progress.take() {
                    pb.abandon();
                }
                eprintln!("{} round {} failed: {}", "Error:".red().bold(), round, error);
            }
            LabEvent::SessionFinished(summary) => self.render_summary(summary),
        }
    }

    fn render_round(&mut self, report: &RoundReport) {
        let mut lines = vec![format!(
            "{} {}/{}  mean {}  avg {:.3}  [{}]",
            "Round".bold(),
            report.round,
            report.rounds,
            colorize(report.mean),
            report.running_average,
            report.verdict.label()
        )];
        if self.verbosity.show_events() {
            lines.extend(format_grid(&report.grid).into_iter().map(|row| format!("  {}", row)));
            lines.push(format!(
                "  label agreement {:.0}%  ({}ms)",
                report.grid.label_agreement(report.target) * 100.0,
                report.duration_ms
            ));
        }
        let mut history_line = format!("  history {}", sparkline(&report.history).cyan());
        if let Some(velocity) = &report.velocity {
            history_line.push_str(&format!("  trend {}", format_velocity(velocity)));
        }
        lines.push(history_line);

        for line in lines {
            self.emit_line(line);
        }
        if let Some(pb) = &self.progress {
            pb.inc(1);
            pb.set_message(format!("mean {:.3}", report.mean));
        }
    }

    fn render_summary(&mut self, summary: &SessionSummary) {
        if let Some(pb) = self.progress.take() {
            pb.finish_and_clear();
        }
        if !self.verbosity.show_progress() {
            return;
        }
        let history = summary
            .history
            .iter()
            .map(|m| format!("{:.3}", m))
            .collect::<Vec<_>>()
            .join(" → ");
        let verdict = if summary.verdict.is_stable() {
            summary.verdict.label().green().bold()
        } else {
            summary.verdict.label().yellow().bold()
        };

        println!();
        println!("{} {}", "Session".bold(), summary.session_id);
        println!("History:       {}", history);
        println!("Sparkline:     {}", sparkline(&summary.history).cyan());
        println!("Final mean:    {}", summary.final_mean().map(colorize).unwrap_or_default());
        println!("Running avg:   {:.3} over {} samples", summary.running_average, summary.samples_seen);
        println!("Stability:     {}", verdict);
        if let Some(velocity) = &summary.velocity {
            println!("Trend:         {}", format_velocity(velocity));
        }
        println!("Stopped by:    {:?}", summary.termination);
    }

    fn emit_line(&self, line: String) {
        if !self.verbosity.show_progress() {
            return;
        }
        match &self.progress {
            Some(pb) => pb.println(line),
            None => println!("{}", line),
        }
    }
}

impl PresentationSink for TerminalDisplay {
    fn on_sample(&mut self, report: &SampleReport) {
        self.handle(&LabEvent::from(report));
    }

    fn on_round(&mut self, report: &RoundReport) {
        self.handle(&LabEvent::RoundCompleted(report.clone()));
    }

    fn on_round_failed(&mut self, round: usize, error: &LabError) {
        self.handle(&LabEvent::RoundFailed {
            round,
            error: error.to_string(),
        });
    }

    fn on_session_finished(&mut self, summary: &SessionSummary) {
        self.handle(&LabEvent::SessionFinished(summary.clone()));
    }
}

/// Confidence heat colouring: green ≥ 0.8, yellow ≥ 0.6, red below
fn colorize(confidence: f64) -> String {
    let text = format!("{:.2}", confidence);
    if confidence >= 0.8 {
        text.green().to_string()
    } else if confidence >= 0.6 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

/// Signed per-round change, e.g. `+0.020/round over 2 rounds`
pub fn format_velocity(velocity: &VelocityMetric) -> String {
    format!(
        "{:+.3}/round over {} rounds",
        velocity.velocity, velocity.delta_rounds
    )
}

/// One string per grid row
pub fn format_grid(grid: &ConfidenceGrid) -> Vec<String> {
    grid.rows()
        .map(|row| row.iter().map(|c| colorize(*c)).collect::<Vec<_>>().join(" "))
        .collect()
}

/// Unicode sparkline of values in [0, 1]
pub fn sparkline(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| {
            let idx = (v.clamp(0.0, 1.0) * (SPARK_LEVELS.len() - 1) as f64).round() as usize;
            SPARK_LEVELS[idx]
        })
        .collect()
}
