use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::coerce::{as_count, as_label, is_truthy};
use crate::error::{PredictionError, Result};
use crate::models::{EndgameDistribution, MatchHistory, MatchRecord, PerformanceProfile};
use crate::rules::{CategoryRule, GameScoringRule};

/// What to do when a requested team has no historical rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingDataPolicy {
    /// Return [`PredictionError::DataAbsent`].
    #[default]
    Fail,
    /// Return [`PerformanceProfile::zeroed`] and log a warning.
    ZeroProfile,
}

/// Builds [`PerformanceProfile`]s from a [`MatchHistory`] for one rule set.
///
/// Only the columns the rule set names are read. Extraction is a pure
/// function of the rows, so extracting the same team twice gives equal
/// profiles.
pub struct StatsExtractor<'a, H: MatchHistory + ?Sized> {
    history: &'a H,
    rules: &'a GameScoringRule,
    policy: MissingDataPolicy,
}

impl<'a, H: MatchHistory + ?Sized> StatsExtractor<'a, H> {
    pub fn new(history: &'a H, rules: &'a GameScoringRule) -> Self {
        Self {
            history,
            rules,
            policy: MissingDataPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MissingDataPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn extract(&self, team_id: &str) -> Result<PerformanceProfile> {
        let team_id = team_id.trim();
        let rows = self.history.team_rows(team_id);

        if rows.is_empty() {
            return match self.policy {
                MissingDataPolicy::Fail => Err(PredictionError::DataAbsent {
                    team: team_id.to_string(),
                }),
                MissingDataPolicy::ZeroProfile => {
                    warn!(team = team_id, "no historical rows; using an all-zero profile");
                    Ok(PerformanceProfile::zeroed(team_id, self.rules))
                }
            };
        }

        let mut builder = PerformanceProfile::builder(team_id).matches_played(rows.len());
        for category in &self.rules.categories {
            builder = builder.count(category.id.clone(), self.category_mean(rows, category));
        }
        for event in &self.rules.events {
            builder = builder.event(event.id.clone(), event_rate(rows, &event.column));
        }
        builder = builder.endgame(self.endgame_distribution(rows));

        let profile = builder.build()?;
        debug!(
            team = team_id,
            matches = rows.len(),
            expected_points = profile.expected_points(self.rules),
            "extracted profile"
        );
        Ok(profile)
    }

    /// Extract several teams, stopping at the first failure.
    pub fn extract_all<I, S>(&self, team_ids: I) -> Result<Vec<PerformanceProfile>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        team_ids
            .into_iter()
            .map(|team| self.extract(team.as_ref()))
            .collect()
    }

    /// Per-phase average when the team's rows carry the category's own
    /// column; otherwise the combined column scaled by the fixed phase split.
    fn category_mean(&self, rows: &[MatchRecord], category: &CategoryRule) -> f64 {
        if let Some(mean) = column_mean(rows, &category.column) {
            return mean;
        }
        category
            .combined_column
            .as_deref()
            .and_then(|column| column_mean(rows, column))
            .map(|mean| mean * self.rules.phase_split.ratio(category.phase))
            .unwrap_or(0.0)
    }

    /// Tier frequencies over the rows carrying the endgame column. A blank
    /// label counts toward the default tier.
    fn endgame_distribution(&self, rows: &[MatchRecord]) -> EndgameDistribution {
        let endgame = &self.rules.endgame;
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for value in rows.iter().filter_map(|row| row.get(&endgame.column)) {
            let tier = match as_label(value) {
                Some(label) => endgame.classify(&label),
                None => endgame.default_tier.as_str(),
            };
            *counts.entry(tier.to_string()).or_default() += 1;
        }
        EndgameDistribution::from_counts(&counts, &endgame.default_tier)
    }
}

fn column_mean(rows: &[MatchRecord], column: &str) -> Option<f64> {
    let (sum, n) = rows
        .iter()
        .filter_map(|row| row.get(column))
        .filter_map(as_count)
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Share of the rows carrying `column` whose cell is truthy.
fn event_rate(rows: &[MatchRecord], column: &str) -> f64 {
    let (hits, n) = rows
        .iter()
        .filter_map(|row| row.get(column))
        .map(is_truthy)
        .fold((0usize, 0usize), |(hits, n), t| (hits + t as usize, n + 1));
    if n == 0 {
        0.0
    } else {
        hits as f64 / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HistoryStore, RowValue};
    use crate::rules::Season;

    const CLASSIFIED_TELEOP: &str = "Artifacts Scored (CLASSIFIED) (Teleop)";
    const LEAVE: &str = "Left Launch Line (LEAVE)";
    const RETURNED: &str = "Returned to Base";

    fn decode_history() -> HistoryStore {
        vec![
            (
                "7421",
                MatchRecord::new()
                    .with(CLASSIFIED_TELEOP, 8)
                    .with(LEAVE, "Yes")
                    .with(RETURNED, "Fully Returned"),
            ),
            (
                "7421",
                MatchRecord::new()
                    .with(CLASSIFIED_TELEOP, "12")
                    .with(LEAVE, false)
                    .with(RETURNED, "Partially Returned"),
            ),
            (
                "7421",
                MatchRecord::new()
                    .with(CLASSIFIED_TELEOP, -3)
                    .with(LEAVE, "x")
                    .with(RETURNED, "Fully Returned"),
            ),
            (
                "7421",
                MatchRecord::new()
                    .with(CLASSIFIED_TELEOP, 4)
                    .with(LEAVE, 1)
                    .with(RETURNED, "No"),
            ),
            ("254", MatchRecord::new().with(CLASSIFIED_TELEOP, 20)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_means_rates_and_endgame() {
        let history = decode_history();
        let rules = Season::Decode2026.rules();
        let profile = StatsExtractor::new(&history, rules).extract("7421").unwrap();

        assert_eq!(profile.matches_played(), 4);
        // (8 + 12 + 0 + 4) / 4, the negative value reads as 0
        assert_eq!(profile.expected_count("teleop_classified"), 6.0);
        assert_eq!(profile.expected_count("auto_classified"), 0.0);
        assert_eq!(profile.event_rate("leave"), 0.75);
        assert_eq!(profile.endgame().probability("full"), 0.5);
        assert_eq!(profile.endgame().probability("partial"), 0.25);
        assert_eq!(profile.endgame().probability("none"), 0.25);
    }

    #[test]
    fn test_no_endgame_labels_defaults_to_none() {
        let history = decode_history();
        let rules = Season::Decode2026.rules();
        let profile = StatsExtractor::new(&history, rules).extract("254").unwrap();
        assert_eq!(profile.endgame().probability("none"), 1.0);
        assert_eq!(profile.event_rate("leave"), 0.0);
        assert_eq!(profile.expected_count("teleop_classified"), 20.0);
    }

    #[test]
    fn test_missing_team_policies() {
        let history = decode_history();
        let rules = Season::Decode2026.rules();

        let err = StatsExtractor::new(&history, rules).extract("9999").unwrap_err();
        assert!(matches!(err, PredictionError::DataAbsent { ref team } if team == "9999"));

        let profile = StatsExtractor::new(&history, rules)
            .with_policy(MissingDataPolicy::ZeroProfile)
            .extract("9999")
            .unwrap();
        assert_eq!(profile, PerformanceProfile::zeroed("9999", rules));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let history = decode_history();
        let extractor = StatsExtractor::new(&history, Season::Decode2026.rules());
        assert_eq!(extractor.extract("7421").unwrap(), extractor.extract(" 7421 ").unwrap());
    }

    #[test]
    fn test_single_row_is_a_point_estimate() {
        let history: HistoryStore = vec![(
            "1",
            MatchRecord::new().with(CLASSIFIED_TELEOP, 5).with(RETURNED, "Fully"),
        )]
        .into_iter()
        .collect();
        let profile = StatsExtractor::new(&history, Season::Decode2026.rules())
            .extract("1")
            .unwrap();
        assert_eq!(profile.expected_count("teleop_classified"), 5.0);
        assert_eq!(profile.endgame().probability("full"), 1.0);
    }

    #[test]
    fn test_combined_column_falls_back_to_phase_split() {
        let rules = Season::Reefscape2025.rules();
        let history: HistoryStore = vec![
            ("118", MatchRecord::new().with("Coral L4", 10).with("Coral L2 (Auto)", 1)),
            ("118", MatchRecord::new().with("Coral L4", 20).with("Coral L2 (Auto)", 3)),
        ]
        .into_iter()
        .collect();
        let profile = StatsExtractor::new(&history, rules).extract("118").unwrap();

        // Only combined L4 history: 15 per match, 30 % early / 70 % main.
        assert!((profile.expected_count("auto_l4") - 4.5).abs() < 1e-9);
        assert!((profile.expected_count("teleop_l4") - 10.5).abs() < 1e-9);
        // Per-phase history wins where it exists.
        assert_eq!(profile.expected_count("auto_l2"), 2.0);
        assert_eq!(profile.expected_count("teleop_l2"), 0.0);
    }

    #[test]
    fn test_empty_cells_read_as_not_achieved() {
        let blank = || {
            MatchRecord::new()
                .with(CLASSIFIED_TELEOP, RowValue::Empty)
                .with(LEAVE, RowValue::Empty)
                .with(RETURNED, RowValue::Empty)
        };
        let history: HistoryStore = vec![
            (
                "5",
                MatchRecord::new()
                    .with(CLASSIFIED_TELEOP, 6)
                    .with(LEAVE, true)
                    .with(RETURNED, "Fully Returned"),
            ),
            ("5", blank()),
            ("5", blank()),
            ("5", blank()),
        ]
        .into_iter()
        .collect();
        let profile = StatsExtractor::new(&history, Season::Decode2026.rules())
            .extract("5")
            .unwrap();

        // Blank counts are unreported; blank events and labels are misses.
        assert_eq!(profile.expected_count("teleop_classified"), 6.0);
        assert_eq!(profile.event_rate("leave"), 0.25);
        assert_eq!(profile.endgame().probability("full"), 0.25);
        assert_eq!(profile.endgame().probability("none"), 0.75);
    }

    #[test]
    fn test_rows_without_the_column_are_skipped() {
        let history: HistoryStore = vec![
            (
                "6",
                MatchRecord::new().with(LEAVE, "Yes").with(RETURNED, "Partially Returned"),
            ),
            (
                "6",
                MatchRecord::new()
                    .with(LEAVE, RowValue::Empty)
                    .with(RETURNED, RowValue::Empty),
            ),
            // Older export without either column.
            ("6", MatchRecord::new().with(CLASSIFIED_TELEOP, 4)),
            (
                "6",
                MatchRecord::new().with(LEAVE, "no").with(RETURNED, "Fully Returned"),
            ),
        ]
        .into_iter()
        .collect();
        let profile = StatsExtractor::new(&history, Season::Decode2026.rules())
            .extract("6")
            .unwrap();

        let third = 1.0 / 3.0;
        assert_eq!(profile.matches_played(), 4);
        assert!((profile.event_rate("leave") - third).abs() < 1e-12);
        for tier in ["none", "partial", "full"] {
            assert!((profile.endgame().probability(tier) - third).abs() < 1e-12, "{tier}");
        }
        assert_eq!(profile.expected_count("teleop_classified"), 4.0);
    }

    #[test]
    fn test_extract_all_stops_on_missing_team() {
        let history = decode_history();
        let extractor = StatsExtractor::new(&history, Season::Decode2026.rules());
        assert_eq!(extractor.extract_all(["7421", "254"]).unwrap().len(), 2);
        assert!(extractor.extract_all(vec!["7421", "404"]).is_err());
    }
}
