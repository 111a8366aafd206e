//! Season presets embedded at compile time.
//!
//! ```rust
//! use foreshadow_core::rules::Season;
//!
//! let rules = Season::Decode2026.rules();
//! assert_eq!(rules.season, "decode-2026");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::GameScoringRule;
use crate::error::PredictionError;

/// FTC DECODE (2026) rule set.
pub const DECODE_2026_YAML: &str = include_str!("../../../../data/rules/decode_2026.yaml");

/// FRC REEFSCAPE (2025) rule set.
pub const REEFSCAPE_2025_YAML: &str = include_str!("../../../../data/rules/reefscape_2025.yaml");

static DECODE_2026: OnceLock<GameScoringRule> = OnceLock::new();
static REEFSCAPE_2025: OnceLock<GameScoringRule> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Season {
    #[default]
    Decode2026,
    Reefscape2025,
}

impl Season {
    pub fn all() -> &'static [Season] {
        &[Season::Decode2026, Season::Reefscape2025]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Decode2026 => "decode-2026",
            Season::Reefscape2025 => "reefscape-2025",
        }
    }

    pub fn yaml(&self) -> &'static str {
        match self {
            Season::Decode2026 => DECODE_2026_YAML,
            Season::Reefscape2025 => REEFSCAPE_2025_YAML,
        }
    }

    /// Parsed and validated preset, cached after the first call.
    ///
    /// # Panics
    ///
    /// Panics if the embedded YAML fails to parse or validate. The files are
    /// checked by this module's tests, so a released build never hits this.
    pub fn rules(&self) -> &'static GameScoringRule {
        let cell = match self {
            Season::Decode2026 => &DECODE_2026,
            Season::Reefscape2025 => &REEFSCAPE_2025,
        };
        cell.get_or_init(|| {
            GameScoringRule::from_yaml_str(self.yaml())
                .unwrap_or_else(|e| panic!("embedded {} rules are corrupted: {e}", self.as_str()))
        })
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = PredictionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "decode-2026" | "decode" | "2026" => Ok(Season::Decode2026),
            "reefscape-2025" | "reefscape" | "2025" => Ok(Season::Reefscape2025),
            _ => Err(PredictionError::InvalidSetting {
                name: "season",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_parse_and_validate() {
        for season in Season::all() {
            let rules = season.rules();
            assert_eq!(rules.season, season.as_str());
            assert!(rules.validate().is_ok());
            assert!(!rules.categories.is_empty());
        }
    }

    #[test]
    fn test_presets_are_cached() {
        let a = Season::Reefscape2025.rules() as *const GameScoringRule;
        let b = Season::Reefscape2025.rules() as *const GameScoringRule;
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_values() {
        let rules = Season::Decode2026.rules();
        let classified = &rules.categories[rules.category_index("auto_classified").unwrap()];
        assert_eq!(classified.points, 3);
        assert_eq!(rules.endgame.classify("Fully Returned"), "full");
        assert_eq!(rules.endgame.classify("Partially Returned"), "partial");
        assert_eq!(rules.endgame.classify("No"), "none");
        assert_eq!(rules.endgame.alliance_bonuses[0].points, 10);
        assert_eq!(rules.ranking_points.win, 2);
        assert!(rules.cooperation.is_none());
    }

    #[test]
    fn test_reefscape_values() {
        let rules = Season::Reefscape2025.rules();
        let coop = rules.cooperation.as_ref().unwrap();
        assert_eq!(coop.threshold, 4);
        assert_eq!(rules.endgame.tiers[rules.tier_index("deep").unwrap()].points, 12);
        assert_eq!(rules.ranking_points.criteria.len(), 3);
        assert_eq!(
            rules.categories[rules.category_index("auto_l1").unwrap()].combined_column.as_deref(),
            Some("Coral L1")
        );
    }

    #[test]
    fn test_season_from_str() {
        assert_eq!("DECODE-2026".parse::<Season>().unwrap(), Season::Decode2026);
        assert_eq!("reefscape".parse::<Season>().unwrap(), Season::Reefscape2025);
        assert!("crescendo".parse::<Season>().is_err());
    }

    #[test]
    fn test_preset_yaml_round_trip() {
        let rules = Season::Reefscape2025.rules();
        let yaml = rules.to_yaml_string().unwrap();
        assert_eq!(&GameScoringRule::from_yaml_str(&yaml).unwrap(), rules);
    }
}
