//! Foreshadow CLI Library
//!
//! Scouting export (CSV / JSON) → HistoryStore → profiles → prediction report

pub mod history_loader;
pub mod report;

use anyhow::{Context, Result};
use foreshadow_core::{GameScoringRule, Season};
use std::path::Path;

pub use history_loader::{load_history, read_csv_history, read_json_history, HistoryFormat};
pub use report::{render_prediction, render_profile, PredictionReport, ProfileReport};

/// Environment variable naming a rule file to use instead of a preset.
pub const ENV_RULES_PATH: &str = "FORESHADOW_RULES_PATH";

/// Rule file when one is given, otherwise the season preset.
pub fn resolve_rules(rules_path: Option<&Path>, season: Season) -> Result<GameScoringRule> {
    match rules_path {
        Some(path) => GameScoringRule::from_path(path)
            .with_context(|| format!("Failed to load rules: {}", path.display())),
        None => Ok(season.rules().clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_resolve_preset() -> Result<()> {
        let rules = resolve_rules(None, Season::Reefscape2025)?;
        assert_eq!(rules.season, "reefscape-2025");
        Ok(())
    }

    #[test]
    fn test_resolve_rule_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        let yaml = Season::Decode2026.rules().to_yaml_string()?.replace("decode-2026", "decode-custom");
        file.write_all(yaml.as_bytes())?;

        let rules = resolve_rules(Some(file.path()), Season::Reefscape2025)?;
        assert_eq!(rules.season, "decode-custom");
        Ok(())
    }

    #[test]
    fn test_resolve_missing_rule_file() {
        let err = resolve_rules(Some(Path::new("/nonexistent/rules.yaml")), Season::Decode2026)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to load rules"));
    }
}
