//! PerformanceProfile - canonical per-team expected performance.
//!
//! Built once per team per analysis session and never mutated afterwards. All
//! invariants are checked at construction, so the simulator can trust every
//! profile it receives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PredictionError, Result};
use crate::rules::GameScoringRule;

/// Tolerance accepted on the endgame simplex before renormalizing.
pub const SIMPLEX_TOLERANCE: f64 = 1e-6;

// ============================================================================
// Endgame distribution
// ============================================================================

/// Probability simplex over mutually exclusive endgame tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct EndgameDistribution {
    probabilities: BTreeMap<String, f64>,
}

impl EndgameDistribution {
    /// All mass on one tier.
    pub fn certain(tier: impl Into<String>) -> Self {
        let mut probabilities = BTreeMap::new();
        probabilities.insert(tier.into(), 1.0);
        Self { probabilities }
    }

    /// Validate and, if the sum is within tolerance of 1, renormalize exactly.
    pub fn from_probabilities(
        probabilities: BTreeMap<String, f64>,
    ) -> std::result::Result<Self, String> {
        if probabilities.is_empty() {
            return Err("endgame distribution has no tiers".to_string());
        }
        for (tier, p) in &probabilities {
            if !p.is_finite() || *p < 0.0 || *p > 1.0 + SIMPLEX_TOLERANCE {
                return Err(format!("endgame probability for '{tier}' out of range: {p}"));
            }
        }
        let sum: f64 = probabilities.values().sum();
        if (sum - 1.0).abs() > SIMPLEX_TOLERANCE {
            return Err(format!("endgame probabilities sum to {sum}, expected 1.0"));
        }
        let probabilities = probabilities
            .into_iter()
            .map(|(tier, p)| (tier, (p / sum).min(1.0)))
            .collect();
        Ok(Self { probabilities })
    }

    /// Relative frequencies of observed tier labels. Falls back to
    /// `default_tier` with certainty when nothing was observed.
    pub fn from_counts(counts: &BTreeMap<String, usize>, default_tier: &str) -> Self {
        let total: usize = counts.values().sum();
        if total == 0 {
            return Self::certain(default_tier);
        }
        let probabilities = counts
            .iter()
            .map(|(tier, &n)| (tier.clone(), n as f64 / total as f64))
            .collect();
        Self { probabilities }
    }

    pub fn probability(&self, tier: &str) -> f64 {
        self.probabilities.get(tier).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.probabilities.iter().map(|(t, &p)| (t.as_str(), p))
    }
}

impl TryFrom<BTreeMap<String, f64>> for EndgameDistribution {
    type Error = String;

    fn try_from(map: BTreeMap<String, f64>) -> std::result::Result<Self, Self::Error> {
        Self::from_probabilities(map)
    }
}

impl From<EndgameDistribution> for BTreeMap<String, f64> {
    fn from(dist: EndgameDistribution) -> Self {
        dist.probabilities
    }
}

// ============================================================================
// Performance profile
// ============================================================================

/// Expected per-match performance of one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileData")]
pub struct PerformanceProfile {
    team_id: String,
    matches_played: usize,
    expected_counts: BTreeMap<String, f64>,
    event_rates: BTreeMap<String, f64>,
    endgame: EndgameDistribution,
}

impl PerformanceProfile {
    pub fn builder(team_id: impl Into<String>) -> ProfileBuilder {
        ProfileBuilder::new(team_id)
    }

    /// Profile with every count and rate at zero and the rule set's default
    /// endgame tier certain. Used when a team has no history and the caller
    /// chose to continue anyway.
    pub fn zeroed(team_id: impl Into<String>, rules: &GameScoringRule) -> Self {
        Self {
            team_id: team_id.into(),
            matches_played: 0,
            expected_counts: rules.categories.iter().map(|c| (c.id.clone(), 0.0)).collect(),
            event_rates: rules.events.iter().map(|e| (e.id.clone(), 0.0)).collect(),
            endgame: EndgameDistribution::certain(rules.endgame.default_tier.clone()),
        }
    }

    pub fn team_id(&self) -> &str {
        &self.team_id
    }

    /// Number of historical rows the profile was built from.
    pub fn matches_played(&self) -> usize {
        self.matches_played
    }

    /// Expected count for a category; categories the profile never saw are 0.
    pub fn expected_count(&self, category: &str) -> f64 {
        self.expected_counts.get(category).copied().unwrap_or(0.0)
    }

    pub fn expected_counts(&self) -> &BTreeMap<String, f64> {
        &self.expected_counts
    }

    pub fn event_rate(&self, event: &str) -> f64 {
        self.event_rates.get(event).copied().unwrap_or(0.0)
    }

    pub fn event_rates(&self) -> &BTreeMap<String, f64> {
        &self.event_rates
    }

    pub fn endgame(&self) -> &EndgameDistribution {
        &self.endgame
    }

    /// Expected scoring pieces per match across every category.
    pub fn expected_pieces(&self) -> f64 {
        self.expected_counts.values().sum()
    }

    /// Analytic expected points this team contributes on its own, before any
    /// alliance-level bonus.
    pub fn expected_points(&self, rules: &GameScoringRule) -> f64 {
        let categories: f64 = rules
            .categories
            .iter()
            .map(|c| self.expected_count(&c.id) * c.points as f64)
            .sum();
        let events: f64 = rules
            .events
            .iter()
            .map(|e| self.event_rate(&e.id) * e.points as f64)
            .sum();
        let endgame: f64 = rules
            .endgame
            .tiers
            .iter()
            .map(|t| self.endgame.probability(&t.id) * t.points as f64)
            .sum();
        categories + events + endgame
    }
}

/// Wire shape of a profile; converted through [`ProfileBuilder`] so that
/// deserialized profiles obey the same invariants as built ones.
#[derive(Debug, Deserialize)]
struct ProfileData {
    team_id: String,
    #[serde(default)]
    matches_played: usize,
    #[serde(default)]
    expected_counts: BTreeMap<String, f64>,
    #[serde(default)]
    event_rates: BTreeMap<String, f64>,
    endgame: BTreeMap<String, f64>,
}

impl TryFrom<ProfileData> for PerformanceProfile {
    type Error = PredictionError;

    fn try_from(data: ProfileData) -> Result<Self> {
        let mut builder = ProfileBuilder::new(data.team_id).matches_played(data.matches_played);
        builder.expected_counts = data.expected_counts;
        builder.event_rates = data.event_rates;
        builder.endgame = Some(data.endgame);
        builder.build()
    }
}

// ============================================================================
// Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    team_id: String,
    matches_played: usize,
    expected_counts: BTreeMap<String, f64>,
    event_rates: BTreeMap<String, f64>,
    endgame: Option<BTreeMap<String, f64>>,
}

impl ProfileBuilder {
    pub fn new(team_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            matches_played: 0,
            expected_counts: BTreeMap::new(),
            event_rates: BTreeMap::new(),
            endgame: None,
        }
    }

    pub fn matches_played(mut self, n: usize) -> Self {
        self.matches_played = n;
        self
    }

    pub fn count(mut self, category: impl Into<String>, mean: f64) -> Self {
        self.expected_counts.insert(category.into(), mean);
        self
    }

    pub fn event(mut self, event: impl Into<String>, rate: f64) -> Self {
        self.event_rates.insert(event.into(), rate);
        self
    }

    pub fn endgame_tier(mut self, tier: impl Into<String>, probability: f64) -> Self {
        self.endgame.get_or_insert_with(BTreeMap::new).insert(tier.into(), probability);
        self
    }

    pub fn endgame(mut self, distribution: EndgameDistribution) -> Self {
        self.endgame = Some(distribution.into());
        self
    }

    pub fn build(self) -> Result<PerformanceProfile> {
        let team = self.team_id.trim().to_string();
        let invalid = |reason: String| PredictionError::InvalidProfile {
            team: team.clone(),
            reason,
        };

        if team.is_empty() {
            return Err(invalid("team identifier is empty".to_string()));
        }
        for (category, mean) in &self.expected_counts {
            if !mean.is_finite() || *mean < 0.0 {
                return Err(invalid(format!("expected count for '{category}' is {mean}")));
            }
        }
        for (event, rate) in &self.event_rates {
            if !rate.is_finite() || !(0.0..=1.0).contains(rate) {
                return Err(invalid(format!("rate for event '{event}' is {rate}")));
            }
        }
        let endgame = match self.endgame {
            Some(map) => EndgameDistribution::from_probabilities(map).map_err(invalid)?,
            None => return Err(invalid("endgame distribution missing".to_string())),
        };

        Ok(PerformanceProfile {
            team_id: team,
            matches_played: self.matches_played,
            expected_counts: self.expected_counts,
            event_rates: self.event_rates,
            endgame,
        })
    }
}
