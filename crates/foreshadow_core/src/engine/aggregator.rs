use std::collections::BTreeMap;

use super::trial::{AllianceTrial, TrialOutcome, TrialResult};
use crate::models::{Alliance, AlliancePrediction, MatchPrediction, ScoreBreakdown};
use crate::rules::GameScoringRule;

/// Pure fold of trial results into a [`MatchPrediction`].
///
/// Trials are folded in slice order, so the same trials always produce a
/// bit-identical prediction.
pub struct PredictionAggregator<'a> {
    rules: &'a GameScoringRule,
}

impl<'a> PredictionAggregator<'a> {
    pub fn new(rules: &'a GameScoringRule) -> Self {
        Self { rules }
    }

    /// `trials` is expected to be non-empty; an empty slice yields an all-zero
    /// prediction.
    pub fn aggregate(
        &self,
        red_teams: Vec<String>,
        blue_teams: Vec<String>,
        seed: u64,
        trials: &[TrialResult],
    ) -> MatchPrediction {
        let n = trials.len().max(1) as f64;
        let (mut red_wins, mut blue_wins, mut ties) = (0usize, 0usize, 0usize);
        for trial in trials {
            match trial.outcome {
                TrialOutcome::RedWin => red_wins += 1,
                TrialOutcome::BlueWin => blue_wins += 1,
                TrialOutcome::Tie => ties += 1,
            }
        }
        let red_win = red_wins as f64 / n;
        let blue_win = blue_wins as f64 / n;

        MatchPrediction {
            season: self.rules.season.clone(),
            trial_count: trials.len(),
            seed,
            red: self.alliance(Alliance::Red, red_teams, trials, red_win, blue_win),
            blue: self.alliance(Alliance::Blue, blue_teams, trials, blue_win, red_win),
            tie_probability: ties as f64 / n,
        }
    }

    fn alliance(
        &self,
        side: Alliance,
        teams: Vec<String>,
        trials: &[TrialResult],
        win_probability: f64,
        loss_probability: f64,
    ) -> AlliancePrediction {
        let rules = self.rules;
        let results: Vec<&AllianceTrial> = trials.iter().map(|t| t.alliance(side)).collect();

        let average_score = mean(&results, |t| t.total_score as f64);
        let variance = mean(&results, |t| (t.total_score as f64 - average_score).powi(2));
        let min_score = results.iter().map(|t| t.total_score).min().unwrap_or(0);
        let max_score = results.iter().map(|t| t.total_score).max().unwrap_or(0);
        let mean_ranking_points = mean(&results, |t| t.ranking_points as f64);

        let criterion_rates = rules
            .ranking_points
            .criteria
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let rate = mean(&results, |t| {
                    rate_of(t.criteria_met.get(i).copied().unwrap_or(false))
                });
                (c.id.clone(), rate)
            })
            .collect();

        let category_ids: Vec<&str> = rules.categories.iter().map(|c| c.id.as_str()).collect();
        let event_ids: Vec<&str> = rules.events.iter().map(|e| e.id.as_str()).collect();
        let tier_ids: Vec<&str> = rules.endgame.tiers.iter().map(|t| t.id.as_str()).collect();

        let breakdown = ScoreBreakdown {
            category_counts: mean_per_id(&results, &category_ids, |t, i| t.category_counts[i]),
            category_points: mean_per_id(&results, &category_ids, |t, i| t.category_points[i]),
            event_counts: mean_per_id(&results, &event_ids, |t, i| t.event_counts[i]),
            event_points: mean_per_id(&results, &event_ids, |t, i| t.event_points[i]),
            endgame_tiers: mean_per_id(&results, &tier_ids, |t, i| t.tier_counts[i]),
            endgame_points: mean(&results, |t| t.endgame_points as f64),
            bonus_points: mean(&results, |t| t.bonus_points() as f64),
            early_points: mean(&results, |t| t.early_points as f64),
            main_points: mean(&results, |t| t.main_points as f64),
        };

        AlliancePrediction {
            teams,
            average_score,
            score_std_dev: variance.sqrt(),
            min_score,
            max_score,
            win_probability,
            loss_probability,
            expected_ranking_points: mean_ranking_points.round() as u32,
            mean_ranking_points,
            criterion_rates,
            cooperation_rate: mean(&results, |t| rate_of(t.cooperation)),
            breakdown,
        }
    }
}

fn rate_of(hit: bool) -> f64 {
    if hit {
        1.0
    } else {
        0.0
    }
}

/// Sequential mean; 0 for no trials.
fn mean(results: &[&AllianceTrial], f: impl Fn(&AllianceTrial) -> f64) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    results.iter().map(|t| f(*t)).sum::<f64>() / results.len() as f64
}

fn mean_per_id(
    results: &[&AllianceTrial],
    ids: &[&str],
    field: impl Fn(&AllianceTrial, usize) -> u32,
) -> BTreeMap<String, f64> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| (id.to_string(), mean(results, |t| field(t, i) as f64)))
        .collect()
}
