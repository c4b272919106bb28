//! Difficulty classes

use crate::errors::{LabError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty class a sample is generated toward or classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Every difficulty, easiest first
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Half-open score band `[low, high)` this class occupies on the unit scale
    ///
    /// The hard band is closed at 1.0.
    pub fn band(&self) -> (f64, f64) {
        match self {
            Difficulty::Easy => (0.0, 1.0 / 3.0),
            Difficulty::Medium => (1.0 / 3.0, 2.0 / 3.0),
            Difficulty::Hard => (2.0 / 3.0, 1.0),
        }
    }

    /// Map a unit-scale difficulty score onto its class
    pub fn from_score(score: f64) -> Self {
        let score = score.clamp(0.0, 1.0);
        if score < 1.0 / 3.0 {
            Difficulty::Easy
        } else if score < 2.0 / 3.0 {
            Difficulty::Medium
        } else {
            Difficulty::Hard
        }
    }

    /// Lowercase name used in file names and config
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(LabError::InvalidConfiguration(format!(
                "unrecognized target difficulty '{}' (expected easy, medium or hard)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
    }

    #[test]
    fn test_parse_unknown_is_invalid_configuration() {
        let err = "extreme".parse::<Difficulty>().unwrap_err();
        assert!(matches!(err, LabError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_from_score_matches_bands() {
        for level in Difficulty::ALL {
            let (low, high) = level.band();
            assert_eq!(Difficulty::from_score((low + high) / 2.0), level);
        }
        assert_eq!(Difficulty::from_score(1.0), Difficulty::Hard);
        assert_eq!(Difficulty::from_score(-3.0), Difficulty::Easy);
    }
}
