//! Per-trial scoring.
//!
//! [`Scorer`] is the rule set compiled into index form. It turns the six
//! [`TeamSample`]s of one trial into a [`TrialResult`]; nothing here is
//! shared between trials.

use serde::Serialize;

use super::sampler::TeamSample;
use crate::error::{PredictionError, Result};
use crate::models::Alliance;
use crate::rules::predicate::CompiledPredicate;
use crate::rules::{GameScoringRule, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialOutcome {
    RedWin,
    Tie,
    BlueWin,
}

impl TrialOutcome {
    /// Strict comparison of totals; equal totals tie.
    pub fn from_scores(red: u32, blue: u32) -> Self {
        match red.cmp(&blue) {
            std::cmp::Ordering::Greater => TrialOutcome::RedWin,
            std::cmp::Ordering::Less => TrialOutcome::BlueWin,
            std::cmp::Ordering::Equal => TrialOutcome::Tie,
        }
    }

    pub fn winner(&self) -> Option<Alliance> {
        match self {
            TrialOutcome::RedWin => Some(Alliance::Red),
            TrialOutcome::BlueWin => Some(Alliance::Blue),
            TrialOutcome::Tie => None,
        }
    }
}

/// One alliance's result in one trial. Vectors follow the rule set's
/// category, event, tier and criterion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllianceTrial {
    pub category_counts: Vec<u32>,
    pub category_points: Vec<u32>,
    /// Teams that achieved each event.
    pub event_counts: Vec<u32>,
    pub event_points: Vec<u32>,
    /// Teams finishing in each endgame tier.
    pub tier_counts: Vec<u32>,
    /// Sum of per-team tier points.
    pub endgame_points: u32,
    pub tier_bonus_points: u32,
    pub cooperation: bool,
    pub cooperation_bonus_points: u32,
    pub early_points: u32,
    pub main_points: u32,
    pub total_score: u32,
    pub criteria_met: Vec<bool>,
    pub ranking_points: u32,
}

impl AllianceTrial {
    fn with_shape(categories: usize, events: usize, tiers: usize) -> Self {
        Self {
            category_counts: vec![0; categories],
            category_points: vec![0; categories],
            event_counts: vec![0; events],
            event_points: vec![0; events],
            tier_counts: vec![0; tiers],
            endgame_points: 0,
            tier_bonus_points: 0,
            cooperation: false,
            cooperation_bonus_points: 0,
            early_points: 0,
            main_points: 0,
            total_score: 0,
            criteria_met: Vec::new(),
            ranking_points: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn empty(rules: &GameScoringRule) -> Self {
        Self::with_shape(
            rules.categories.len(),
            rules.events.len(),
            rules.endgame.tiers.len(),
        )
    }

    /// Alliance-level bonuses: endgame tier bonuses and the cooperation bonus.
    pub fn bonus_points(&self) -> u32 {
        self.tier_bonus_points.saturating_add(self.cooperation_bonus_points)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialResult {
    pub red: AllianceTrial,
    pub blue: AllianceTrial,
    pub outcome: TrialOutcome,
}

impl TrialResult {
    pub fn alliance(&self, side: Alliance) -> &AllianceTrial {
        match side {
            Alliance::Red => &self.red,
            Alliance::Blue => &self.blue,
        }
    }
}

// ============================================================================
// Scorer
// ============================================================================

#[derive(Debug, Clone)]
struct CompiledBonus {
    tier: usize,
    at_least: u32,
    points: u32,
}

#[derive(Debug, Clone)]
struct CompiledCooperation {
    categories: Vec<usize>,
    threshold: u32,
    bonus_points: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct Scorer {
    category_points: Vec<u32>,
    category_phase: Vec<Phase>,
    event_points: Vec<u32>,
    event_phase: Vec<Phase>,
    tier_points: Vec<u32>,
    tier_bonuses: Vec<CompiledBonus>,
    cooperation: Option<CompiledCooperation>,
    criteria: Vec<(u32, CompiledPredicate)>,
    win: u32,
    tie: u32,
    loss: u32,
}

impl Scorer {
    pub(crate) fn compile(rules: &GameScoringRule) -> Result<Self> {
        let missing = |what: &str, id: &str| {
            PredictionError::InvalidRule(format!("{}: unknown {what} '{id}'", rules.season))
        };

        let tier_bonuses = rules
            .endgame
            .alliance_bonuses
            .iter()
            .map(|b| -> Result<CompiledBonus> {
                Ok(CompiledBonus {
                    tier: rules.tier_index(&b.tier).ok_or_else(|| missing("tier", &b.tier))?,
                    at_least: b.at_least,
                    points: b.points,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let cooperation = match &rules.cooperation {
            Some(coop) => Some(CompiledCooperation {
                categories: coop
                    .categories
                    .iter()
                    .map(|c| rules.category_index(c).ok_or_else(|| missing("category", c)))
                    .collect::<Result<Vec<_>>>()?,
                threshold: coop.threshold,
                bonus_points: coop.bonus_points,
            }),
            None => None,
        };

        let criteria = rules
            .ranking_points
            .criteria
            .iter()
            .map(|c| {
                c.when
                    .compile(rules)
                    .map(|predicate| (c.points, predicate))
                    .map_err(|m| {
                        PredictionError::InvalidRule(format!(
                            "{}: criterion '{}': {m}",
                            rules.season, c.id
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            category_points: rules.categories.iter().map(|c| c.points).collect(),
            category_phase: rules.categories.iter().map(|c| c.phase).collect(),
            event_points: rules.events.iter().map(|e| e.points).collect(),
            event_phase: rules.events.iter().map(|e| e.phase).collect(),
            tier_points: rules.endgame.tiers.iter().map(|t| t.points).collect(),
            tier_bonuses,
            cooperation,
            criteria,
            win: rules.ranking_points.win,
            tie: rules.ranking_points.tie,
            loss: rules.ranking_points.loss,
        })
    }

    /// Score one alliance: sum the team samples, convert to points, apply
    /// alliance bonuses and evaluate every ranking-point criterion. All
    /// arithmetic saturates at `u32::MAX`.
    pub(crate) fn score_alliance(&self, samples: &[TeamSample]) -> AllianceTrial {
        let mut trial = AllianceTrial::with_shape(
            self.category_points.len(),
            self.event_points.len(),
            self.tier_points.len(),
        );

        for sample in samples {
            for (total, count) in trial.category_counts.iter_mut().zip(&sample.counts) {
                *total = total.saturating_add(*count);
            }
            for (total, &achieved) in trial.event_counts.iter_mut().zip(&sample.events) {
                *total = total.saturating_add(achieved as u32);
            }
            if let Some(slot) = trial.tier_counts.get_mut(sample.tier) {
                *slot = slot.saturating_add(1);
                trial.endgame_points = trial.endgame_points.saturating_add(self.tier_points[sample.tier]);
            }
        }

        for i in 0..trial.category_counts.len() {
            let count = trial.category_counts[i];
            let points = count.saturating_mul(self.category_points[i]);
            trial.category_points[i] = points;
            add_to_phase(&mut trial, self.category_phase[i], points);
        }
        for i in 0..trial.event_counts.len() {
            let teams = trial.event_counts[i];
            let points = teams.saturating_mul(self.event_points[i]);
            trial.event_points[i] = points;
            add_to_phase(&mut trial, self.event_phase[i], points);
        }

        trial.tier_bonus_points = saturating_sum(
            self.tier_bonuses
                .iter()
                .filter(|b| trial.tier_counts[b.tier] >= b.at_least)
                .map(|b| b.points),
        );

        if let Some(coop) = &self.cooperation {
            let combined = saturating_sum(coop.categories.iter().map(|&i| trial.category_counts[i]));
            trial.cooperation = combined >= coop.threshold;
            if trial.cooperation {
                trial.cooperation_bonus_points = coop.bonus_points;
            }
        }

        trial.total_score = saturating_sum(
            [trial.early_points, trial.main_points, trial.endgame_points, trial.bonus_points()]
                .into_iter(),
        );

        let met: Vec<bool> = self.criteria.iter().map(|(_, p)| p.holds(&trial)).collect();
        trial.criteria_met = met;
        trial
    }

    /// Classify the trial and award ranking points to both alliances.
    pub(crate) fn finish(&self, mut red: AllianceTrial, mut blue: AllianceTrial) -> TrialResult {
        let outcome = TrialOutcome::from_scores(red.total_score, blue.total_score);
        let (red_base, blue_base) = match outcome {
            TrialOutcome::RedWin => (self.win, self.loss),
            TrialOutcome::BlueWin => (self.loss, self.win),
            TrialOutcome::Tie => (self.tie, self.tie),
        };
        red.ranking_points = red_base.saturating_add(self.criteria_points(&red));
        blue.ranking_points = blue_base.saturating_add(self.criteria_points(&blue));
        TrialResult { red, blue, outcome }
    }

    fn criteria_points(&self, trial: &AllianceTrial) -> u32 {
        saturating_sum(
            self.criteria
                .iter()
                .zip(&trial.criteria_met)
                .filter(|(_, met)| **met)
                .map(|((points, _), _)| *points),
        )
    }
}

fn add_to_phase(trial: &mut AllianceTrial, phase: Phase, points: u32) {
    let slot = match phase {
        Phase::Early => &mut trial.early_points,
        Phase::Main => &mut trial.main_points,
    };
    *slot = slot.saturating_add(points);
}

pub(crate) fn saturating_sum(values: impl Iterator<Item = u32>) -> u32 {
    values.fold(0, u32::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Season;

    fn sample(rules: &GameScoringRule, counts: &[(&str, u32)], leave: bool, tier: &str) -> TeamSample {
        let mut sample = TeamSample {
            counts: vec![0; rules.categories.len()],
            events: vec![false; rules.events.len()],
            tier: rules.tier_index(tier).unwrap(),
        };
        for (category, n) in counts {
            sample.counts[rules.category_index(category).unwrap()] = *n;
        }
        if let Some(i) = rules.event_index("leave") {
            sample.events[i] = leave;
        }
        sample
    }

    #[test]
    fn test_decode_alliance_points() {
        let rules = Season::Decode2026.rules();
        let scorer = Scorer::compile(rules).unwrap();
        let samples = [
            sample(rules, &[("auto_classified", 2), ("teleop_classified", 10)], true, "full"),
            sample(rules, &[("teleop_overflow", 4)], true, "full"),
            sample(rules, &[("teleop_pattern", 3)], false, "full"),
        ];
        let trial = scorer.score_alliance(&samples);

        // auto: 2*3 + 2 teams leave * 3
        assert_eq!(trial.early_points, 12);
        // teleop: 10*3 + 4*1 + 3*2
        assert_eq!(trial.main_points, 40);
        assert_eq!(trial.endgame_points, 30);
        // every robot fully returned
        assert_eq!(trial.tier_bonus_points, 10);
        assert_eq!(trial.total_score, 92);
        assert_eq!(trial.event_counts, vec![2]);

        let movement = rules.ranking_points.criteria.iter().position(|c| c.id == "movement");
        assert!(trial.criteria_met[movement.unwrap()]);
    }

    #[test]
    fn test_cooperation_threshold_is_inclusive() {
        let rules = Season::Reefscape2025.rules();
        let scorer = Scorer::compile(rules).unwrap();
        // two algae in each processor
        assert_eq!(rules.cooperation.as_ref().unwrap().threshold, 4);

        let below = [
            sample(rules, &[("teleop_processor", 2)], false, "none"),
            sample(rules, &[("auto_processor", 1)], false, "none"),
            sample(rules, &[], false, "none"),
        ];
        assert!(!scorer.score_alliance(&below).cooperation);

        let at = [
            sample(rules, &[("teleop_processor", 2)], false, "none"),
            sample(rules, &[("auto_processor", 1), ("teleop_processor", 1)], false, "none"),
            sample(rules, &[], false, "none"),
        ];
        assert!(scorer.score_alliance(&at).cooperation);
    }

    #[test]
    fn test_ranking_points_use_configured_awards() {
        let rules = Season::Reefscape2025.rules();
        let scorer = Scorer::compile(rules).unwrap();
        let strong = [
            sample(rules, &[("auto_l4", 1), ("teleop_l4", 1)], true, "deep"),
            sample(rules, &[], true, "deep"),
            sample(rules, &[], true, "none"),
        ];
        let weak = [
            sample(rules, &[], false, "none"),
            sample(rules, &[], false, "none"),
            sample(rules, &[], false, "park"),
        ];
        let result = scorer.finish(scorer.score_alliance(&strong), scorer.score_alliance(&weak));

        assert_eq!(result.outcome, TrialOutcome::RedWin);
        // win 3 + auto RP (3 leave, 1 auto coral) + barge RP (24 endgame points)
        assert_eq!(result.red.ranking_points, 5);
        assert_eq!(result.blue.ranking_points, 0);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let rules = Season::Decode2026.rules();
        let scorer = Scorer::compile(rules).unwrap();
        let flood = || sample(rules, &[("teleop_classified", u32::MAX / 2)], true, "full");
        let trial = scorer.score_alliance(&[flood(), flood(), flood()]);

        assert_eq!(trial.category_counts[rules.category_index("teleop_classified").unwrap()], u32::MAX);
        assert_eq!(trial.main_points, u32::MAX);
        assert_eq!(trial.total_score, u32::MAX);
        let goal = rules.ranking_points.criteria.iter().position(|c| c.id == "goal").unwrap();
        assert!(trial.criteria_met[goal]);
    }

    #[test]
    fn test_tie_awards_both() {
        let rules = Season::Decode2026.rules();
        let scorer = Scorer::compile(rules).unwrap();
        let empty = [
            sample(rules, &[], false, "none"),
            sample(rules, &[], false, "none"),
            sample(rules, &[], false, "none"),
        ];
        let result = scorer.finish(scorer.score_alliance(&empty), scorer.score_alliance(&empty));
        assert_eq!(result.outcome, TrialOutcome::Tie);
        assert_eq!(result.outcome.winner(), None);
        assert_eq!(result.red.ranking_points, rules.ranking_points.tie);
        assert_eq!(result.blue.total_score, 0);
    }
}
