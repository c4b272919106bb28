//! Configuration management for CaptchaLab
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.captchalab/config.toml

use crate::analysis::{StabilityConfig, StoppingRule};
use crate::cli::Verbosity;
use crate::errors::{LabError, Result};
use crate::provider::RenderSettings;
use crate::refinement::controller::{SessionConfig, DEFAULT_GRID_SIZE, DEFAULT_ROUNDS};
use crate::types::Difficulty;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration for CaptchaLab
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingConfig,
    pub stopping: StoppingConfig,
    pub render: RenderSettings,
    pub export: ExportConfig,
    pub telemetry: TelemetryConfig,
}

/// Refinement session defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub target: String,
    pub grid_size: usize,
    pub rounds: usize,
    pub seed: Option<u64>,
}

/// Session stopping rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoppingConfig {
    /// "fixed" or "variance"
    pub rule: String,
    pub window: usize,
    pub max_std_dev: f64,
}

/// Sample export location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: String,
}

/// Telemetry display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub default_verbosity: String,
    pub show_progress_bars: bool,
    pub color_output: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            target: Difficulty::Medium.to_string(),
            grid_size: DEFAULT_GRID_SIZE,
            rounds: DEFAULT_ROUNDS,
            seed: None,
        }
    }
}

impl Default for StoppingConfig {
    fn default() -> Self {
        let stability = StabilityConfig::default();
        Self {
            rule: "fixed".to_string(),
            window: stability.window,
            max_std_dev: stability.max_std_dev,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: "~/.captchalab/samples".to_string(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_verbosity: "normal".to_string(),
            show_progress_bars: true,
            color_output: true,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LabError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| LabError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the standard location, falling back to built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Standard config location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".captchalab").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.session_config()?;

        self.render
            .validate()
            .map_err(|e| LabError::ConfigError(format!("[render] {}", e)))?;

        if Verbosity::parse(&self.telemetry.default_verbosity).is_none() {
            return Err(LabError::ConfigError(format!(
                "Invalid verbosity level: {}",
                self.telemetry.default_verbosity
            )));
        }

        Ok(())
    }

    pub fn target(&self) -> Result<Difficulty> {
        self.sampling.target.parse()
    }

    pub fn stopping_rule(&self) -> Result<StoppingRule> {
        let rule = match self.stopping.rule.as_str() {
            "fixed" => StoppingRule::FixedRounds,
            "variance" => StoppingRule::Variance(StabilityConfig {
                window: self.stopping.window,
                max_std_dev: self.stopping.max_std_dev,
            }),
            other => {
                return Err(LabError::InvalidConfiguration(format!(
                    "unknown stopping rule '{}' (expected fixed or variance)",
                    other
                )));
            }
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Session parameters from the `[sampling]` and `[stopping]` sections
    pub fn session_config(&self) -> Result<SessionConfig> {
        let config = SessionConfig::new(self.target()?, self.sampling.grid_size, self.sampling.rounds)
            .with_stopping(self.stopping_rule()?);
        config.validate()?;
        Ok(config)
    }

    /// Verbosity from the config file, used when no flag is given
    pub fn default_verbosity(&self) -> Verbosity {
        Verbosity::parse(&self.telemetry.default_verbosity).unwrap_or(Verbosity::Normal)
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.export.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sample::MAX_TEXT_LENGTH;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sampling.grid_size, 4);
        assert_eq!(config.sampling.rounds, 6);
        assert_eq!(config.target().unwrap(), Difficulty::Medium);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_grid() {
        let mut config = Config::default();
        config.sampling.grid_size = 0;
        assert!(matches!(config.validate(), Err(LabError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_config_validation_zero_rounds() {
        let mut config = Config::default();
        config.sampling.rounds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_unknown_target() {
        let mut config = Config::default();
        config.sampling.target = "impossible".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_unknown_rule() {
        let mut config = Config::default();
        config.stopping.rule = "vibes".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_verbosity() {
        let mut config = Config::default();
        config.telemetry.default_verbosity = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_variance_rule() {
        let mut config = Config::default();
        config.stopping.rule = "variance".to_string();
        config.stopping.window = 4;
        let rule = config.stopping_rule().unwrap();
        assert!(matches!(rule, StoppingRule::Variance(StabilityConfig { window: 4, .. })));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[sampling]\ntarget = \"hard\"\n").unwrap();
        assert_eq!(config.target().unwrap(), Difficulty::Hard);
        assert_eq!(config.sampling.rounds, 6);
        assert_eq!(config.render.width, 160);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sampling]\ngrid_size = 5\n").unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.sampling.grid_size, 5);
    }

    #[test]
    fn test_config_validation_render_text_too_long() {
        let mut config = Config::default();
        config.render.width = 4000;
        config.render.text_length = MAX_TEXT_LENGTH + 1;
        assert!(matches!(config.validate(), Err(LabError::ConfigError(_))));
    }

    #[test]
    fn test_config_validation_render_canvas_too_small() {
        let mut config = Config::default();
        config.render.width = 30;
        assert!(matches!(config.validate(), Err(LabError::ConfigError(_))));
    }

    #[test]
    fn test_unrenderable_file_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[render]\nwidth = 40\nheight = 20\ntext_length = 12\n").unwrap();

        assert!(matches!(Config::load(Some(&path)), Err(LabError::ConfigError(_))));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path("~/.captchalab");
        assert!(!expanded.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = "/absolute/path";
        assert_eq!(Config::expand_path(path).to_string_lossy(), path);
    }
}
