//! GameScoringRule - season-specific scoring configuration.
//!
//! Point values, endgame tiers, the cooperation bonus and every ranking-point
//! criterion live here as data. A rule set is loaded once (YAML or JSON),
//! validated, and then only read; the simulator never mutates it.

pub mod predicate;
pub mod presets;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PredictionError, Result};

pub use predicate::{PointSource, Predicate};
pub use presets::Season;

// ============================================================================
// Rule components
// ============================================================================

/// Match phase a category or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[serde(alias = "auto", alias = "autonomous")]
    Early,
    #[serde(alias = "teleop")]
    Main,
}

/// Fixed early/main split used only when a category has no per-phase history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSplit {
    pub early_ratio: f64,
}

impl PhaseSplit {
    pub fn ratio(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Early => self.early_ratio,
            Phase::Main => 1.0 - self.early_ratio,
        }
    }
}

impl Default for PhaseSplit {
    fn default() -> Self {
        Self { early_ratio: 0.3 }
    }
}

/// A count-valued scoring category, e.g. pieces scored in one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub id: String,
    pub phase: Phase,
    pub points: u32,
    /// Historical column holding this category's per-match count.
    pub column: String,
    /// Phase-agnostic column split by [`PhaseSplit`] when `column` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_column: Option<String>,
}

/// A per-team boolean event, scored once for every team that achieves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRule {
    pub id: String,
    pub phase: Phase,
    pub points: u32,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRule {
    pub id: String,
    pub points: u32,
    /// Case-insensitive substrings that identify this tier in history labels.
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Extra points when at least `at_least` teams of an alliance reach `tier`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBonus {
    pub tier: String,
    pub at_least: u32,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndgameRule {
    pub column: String,
    pub default_tier: String,
    pub tiers: Vec<TierRule>,
    #[serde(default)]
    pub alliance_bonuses: Vec<TierBonus>,
}

impl EndgameRule {
    /// Tier whose labels match a history value; unmatched values map to the
    /// default tier.
    pub fn classify(&self, label: &str) -> &str {
        let lowered = label.trim().to_lowercase();
        self.tiers
            .iter()
            .find(|tier| {
                tier.labels
                    .iter()
                    .any(|l| !l.is_empty() && lowered.contains(&l.to_lowercase()))
            })
            .map(|tier| tier.id.as_str())
            .unwrap_or(self.default_tier.as_str())
    }
}

/// Alliance-level bonus earned when the combined count of `categories`
/// reaches `threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CooperationRule {
    pub categories: Vec<String>,
    pub threshold: u32,
    #[serde(default)]
    pub bonus_points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingCriterion {
    pub id: String,
    pub points: u32,
    pub when: Predicate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRule {
    pub win: u32,
    pub tie: u32,
    #[serde(default)]
    pub loss: u32,
    #[serde(default)]
    pub criteria: Vec<RankingCriterion>,
}

// ============================================================================
// GameScoringRule
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameScoringRule {
    pub season: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub phase_split: PhaseSplit,
    pub categories: Vec<CategoryRule>,
    #[serde(default)]
    pub events: Vec<EventRule>,
    pub endgame: EndgameRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooperation: Option<CooperationRule>,
    pub ranking_points: RankingRule,
}

fn default_version() -> u32 {
    1
}

impl GameScoringRule {
    /// Parse and validate a YAML rule definition.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let rules: GameScoringRule = serde_yaml::from_str(yaml)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Parse and validate a JSON rule definition.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rules: GameScoringRule = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load a rule file; `.json` files are read as JSON, anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PredictionError::RuleFile {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn category_index(&self, id: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.id == id)
    }

    pub fn event_index(&self, id: &str) -> Option<usize> {
        self.events.iter().position(|e| e.id == id)
    }

    pub fn tier_index(&self, id: &str) -> Option<usize> {
        self.endgame.tiers.iter().position(|t| t.id == id)
    }

    /// Check internal consistency. Every id referenced anywhere must resolve.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(PredictionError::InvalidRule(format!("{}: {msg}", self.season)));

        if self.season.trim().is_empty() {
            return Err(PredictionError::InvalidRule("season name is empty".to_string()));
        }
        let split = self.phase_split.early_ratio;
        if !split.is_finite() || !(0.0..=1.0).contains(&split) {
            return fail(format!("phase_split.early_ratio must be within [0, 1], got {split}"));
        }

        unique_ids("category", self.categories.iter().map(|c| c.id.as_str()))
            .or_else(fail)?;
        unique_ids("event", self.events.iter().map(|e| e.id.as_str())).or_else(fail)?;
        unique_ids("endgame tier", self.endgame.tiers.iter().map(|t| t.id.as_str()))
            .or_else(fail)?;
        unique_ids(
            "ranking criterion",
            self.ranking_points.criteria.iter().map(|c| c.id.as_str()),
        )
        .or_else(fail)?;

        if self.tier_index(&self.endgame.default_tier).is_none() {
            return fail(format!(
                "default endgame tier '{}' is not a declared tier",
                self.endgame.default_tier
            ));
        }
        for bonus in &self.endgame.alliance_bonuses {
            if self.tier_index(&bonus.tier).is_none() {
                return fail(format!("alliance bonus references unknown tier '{}'", bonus.tier));
            }
        }
        if let Some(coop) = &self.cooperation {
            if coop.categories.is_empty() {
                return fail("cooperation rule names no categories".to_string());
            }
            for category in &coop.categories {
                if self.category_index(category).is_none() {
                    return fail(format!("cooperation references unknown category '{category}'"));
                }
            }
        }
        for criterion in &self.ranking_points.criteria {
            criterion
                .when
                .validate(self)
                .or_else(|m| fail(format!("criterion '{}': {m}", criterion.id)))?;
        }
        Ok(())
    }
}

fn unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> std::result::Result<(), String> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(format!("{kind} with empty id"));
        }
        if !seen.insert(id) {
            return Err(format!("duplicate {kind} id '{id}'"));
        }
    }
    Ok(())
}
