//! MatchPrediction - the immutable result of one `simulate_match` call.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Alliance;

/// Mean composition of one alliance's score over all trials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Mean summed count per category.
    pub category_counts: BTreeMap<String, f64>,
    pub category_points: BTreeMap<String, f64>,
    /// Mean number of teams achieving each event.
    pub event_counts: BTreeMap<String, f64>,
    pub event_points: BTreeMap<String, f64>,
    /// Mean number of teams finishing in each endgame tier.
    pub endgame_tiers: BTreeMap<String, f64>,
    pub endgame_points: f64,
    /// Endgame alliance bonuses plus the cooperation bonus.
    pub bonus_points: f64,
    pub early_points: f64,
    pub main_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlliancePrediction {
    pub teams: Vec<String>,
    pub average_score: f64,
    pub score_std_dev: f64,
    pub min_score: u32,
    pub max_score: u32,
    pub win_probability: f64,
    pub loss_probability: f64,
    /// Rounded mean of per-trial ranking points.
    pub expected_ranking_points: u32,
    pub mean_ranking_points: f64,
    /// Fraction of trials in which each ranking-point criterion held.
    pub criterion_rates: BTreeMap<String, f64>,
    pub cooperation_rate: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPrediction {
    pub season: String,
    pub trial_count: usize,
    /// Seed the run used; passing it back reproduces the prediction exactly.
    pub seed: u64,
    pub red: AlliancePrediction,
    pub blue: AlliancePrediction,
    pub tie_probability: f64,
}

impl MatchPrediction {
    pub fn alliance(&self, side: Alliance) -> &AlliancePrediction {
        match side {
            Alliance::Red => &self.red,
            Alliance::Blue => &self.blue,
        }
    }

    /// Alliance with the higher win probability, `None` when they are equal.
    pub fn favorite(&self) -> Option<Alliance> {
        let (red, blue) = (self.red.win_probability, self.blue.win_probability);
        if red > blue {
            Some(Alliance::Red)
        } else if blue > red {
            Some(Alliance::Blue)
        } else {
            None
        }
    }

    pub fn expected_margin(&self) -> f64 {
        self.red.average_score - self.blue.average_score
    }

    /// How decisive the prediction is, from the gap between the two win
    /// probabilities.
    pub fn confidence(&self) -> Confidence {
        Confidence::from_gap((self.red.win_probability - self.blue.win_probability).abs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// High above a 0.3 gap, medium above 0.1.
    pub fn from_gap(gap: f64) -> Self {
        if gap > 0.3 {
            Confidence::High
        } else if gap > 0.1 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}
