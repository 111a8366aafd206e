use std::path::PathBuf;

use thiserror::Error;

use crate::models::Alliance;

/// Coarse classification of [`PredictionError`] for callers that only need
/// to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong alliance size, bad trial count, a profile or rule set that does
    /// not satisfy its invariants.
    InputValidation,
    /// A requested team has no historical rows.
    DataAbsent,
    /// A rule file or settings value could not be read or decoded.
    Configuration,
}

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("{side} alliance must contain exactly {expected} teams, found {found}")]
    AllianceSize {
        side: Alliance,
        expected: usize,
        found: usize,
    },

    #[error("trial count must be at least 1, got {0}")]
    InvalidTrialCount(usize),

    #[error("invalid profile for team {team}: {reason}")]
    InvalidProfile { team: String, reason: String },

    #[error("invalid scoring rule: {0}")]
    InvalidRule(String),

    #[error("team {team}: scoring rule has no point value for category '{category}'")]
    UnmappedCategory { team: String, category: String },

    #[error("team {team}: scoring rule has no event '{event}'")]
    UnmappedEvent { team: String, event: String },

    #[error("team {team}: scoring rule has no endgame tier '{tier}'")]
    UnmappedTier { team: String, tier: String },

    #[error("no historical match rows for team {team}")]
    DataAbsent { team: String },

    #[error("failed to read rule file {path}: {source}")]
    RuleFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode rule definition: {0}")]
    RuleFormat(String),

    #[error("invalid simulation setting {name}='{value}'")]
    InvalidSetting { name: &'static str, value: String },
}

impl PredictionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictionError::AllianceSize { .. }
            | PredictionError::InvalidTrialCount(_)
            | PredictionError::InvalidProfile { .. }
            | PredictionError::InvalidRule(_)
            | PredictionError::UnmappedCategory { .. }
            | PredictionError::UnmappedEvent { .. }
            | PredictionError::UnmappedTier { .. } => ErrorKind::InputValidation,
            PredictionError::DataAbsent { .. } => ErrorKind::DataAbsent,
            PredictionError::RuleFile { .. }
            | PredictionError::RuleFormat(_)
            | PredictionError::InvalidSetting { .. } => ErrorKind::Configuration,
        }
    }

    /// Every failure is a caller or configuration mistake; the computation is
    /// deterministic given a seed, so retrying never helps.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<serde_yaml::Error> for PredictionError {
    fn from(err: serde_yaml::Error) -> Self {
        PredictionError::RuleFormat(err.to_string())
    }
}

impl From<serde_json::Error> for PredictionError {
    fn from(err: serde_json::Error) -> Self {
        PredictionError::RuleFormat(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PredictionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = PredictionError::AllianceSize {
            side: Alliance::Blue,
            expected: 3,
            found: 2,
        };
        assert_eq!(err.kind(), ErrorKind::InputValidation);
        assert_eq!(err.to_string(), "blue alliance must contain exactly 3 teams, found 2");

        let err = PredictionError::DataAbsent { team: "7421".to_string() };
        assert_eq!(err.kind(), ErrorKind::DataAbsent);
        assert!(!err.is_retryable());

        let err = PredictionError::RuleFormat("bad yaml".to_string());
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_yaml_error_converts_to_rule_format() {
        let err: PredictionError = serde_yaml::from_str::<u32>("[not a number")
            .map_err(PredictionError::from)
            .unwrap_err();
        assert!(matches!(err, PredictionError::RuleFormat(_)));
    }
}
