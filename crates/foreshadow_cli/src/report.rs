//! Plain-text and JSON reports.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use foreshadow_core::{AlliancePrediction, GameScoringRule, MatchPrediction, PerformanceProfile};
use serde::Serialize;

/// JSON envelope for `foreshadow predict`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub generated_at: DateTime<Utc>,
    pub rules_version: u32,
    pub prediction: MatchPrediction,
}

impl PredictionReport {
    pub fn new(prediction: MatchPrediction, rules: &GameScoringRule) -> Self {
        Self {
            generated_at: Utc::now(),
            rules_version: rules.version,
            prediction,
        }
    }
}

/// JSON envelope for `foreshadow profile`.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub generated_at: DateTime<Utc>,
    pub season: String,
    pub expected_points: f64,
    pub expected_pieces: f64,
    pub profile: PerformanceProfile,
}

impl ProfileReport {
    pub fn new(profile: PerformanceProfile, rules: &GameScoringRule) -> Self {
        Self {
            generated_at: Utc::now(),
            season: rules.season.clone(),
            expected_points: profile.expected_points(rules),
            expected_pieces: profile.expected_pieces(),
            profile,
        }
    }
}

fn percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

pub fn render_prediction(prediction: &MatchPrediction) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} prediction ({} trials, seed {})",
        prediction.season, prediction.trial_count, prediction.seed
    );
    let _ = writeln!(out, "{}", "=".repeat(60));
    render_alliance(&mut out, "RED", &prediction.red);
    render_alliance(&mut out, "BLUE", &prediction.blue);
    let _ = writeln!(out, "Tie: {}", percent(prediction.tie_probability));
    let verdict = match prediction.favorite() {
        Some(side) => format!("{side} favored by {:.1} points", prediction.expected_margin().abs()),
        None => "even match".to_string(),
    };
    let _ = writeln!(out, "Verdict: {verdict} (confidence: {})", prediction.confidence());
    out
}

fn render_alliance(out: &mut String, label: &str, alliance: &AlliancePrediction) {
    let b = &alliance.breakdown;
    let _ = writeln!(out, "{label} [{}]", alliance.teams.join(", "));
    let _ = writeln!(
        out,
        "  Score:   {:.1} ± {:.1} (min {}, max {})",
        alliance.average_score, alliance.score_std_dev, alliance.min_score, alliance.max_score
    );
    let _ = writeln!(out, "  Win:     {}", percent(alliance.win_probability));
    let _ = writeln!(
        out,
        "  RP:      {} (mean {:.2})",
        alliance.expected_ranking_points, alliance.mean_ranking_points
    );
    let _ = writeln!(
        out,
        "  Phases:  early {:.1} | main {:.1} | endgame {:.1} | bonus {:.1}",
        b.early_points, b.main_points, b.endgame_points, b.bonus_points
    );
    for (category, points) in &b.category_points {
        let count = b.category_counts.get(category).copied().unwrap_or(0.0);
        let _ = writeln!(out, "    {category:<20} {count:>6.2} → {points:>6.1} pts");
    }
    for (event, points) in &b.event_points {
        let teams = b.event_counts.get(event).copied().unwrap_or(0.0);
        let _ = writeln!(out, "    {event:<20} {teams:>6.2} teams → {points:>6.1} pts");
    }
    if !alliance.criterion_rates.is_empty() {
        let rates: Vec<String> = alliance
            .criterion_rates
            .iter()
            .map(|(id, rate)| format!("{id} {}", percent(*rate)))
            .collect();
        let _ = writeln!(out, "  RP criteria: {}", rates.join(", "));
    }
}

pub fn render_profile(profile: &PerformanceProfile, rules: &GameScoringRule) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Team {} ({} matches, {})",
        profile.team_id(),
        profile.matches_played(),
        rules.season
    );
    let _ = writeln!(out, "  Expected points: {:.1}", profile.expected_points(rules));
    for category in &rules.categories {
        let _ = writeln!(
            out,
            "    {:<20} {:>6.2}",
            category.id,
            profile.expected_count(&category.id)
        );
    }
    for event in &rules.events {
        let _ = writeln!(out, "    {:<20} {:>7}", event.id, percent(profile.event_rate(&event.id)));
    }
    let endgame: Vec<String> = rules
        .endgame
        .tiers
        .iter()
        .map(|t| format!("{} {}", t.id, percent(profile.endgame().probability(&t.id))))
        .collect();
    let _ = writeln!(out, "  Endgame: {}", endgame.join(", "));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use foreshadow_core::{MatchSimulator, Season};

    fn prediction() -> MatchPrediction {
        let rules = Season::Decode2026.rules();
        let team = |id: &str, classified: f64| {
            PerformanceProfile::builder(id)
                .count("teleop_classified", classified)
                .event("leave", 0.5)
                .endgame_tier("full", 1.0)
                .build()
                .unwrap()
        };
        MatchSimulator::new(rules.clone())
            .unwrap()
            .with_seed(1)
            .simulate_match(
                &[team("1", 8.0), team("2", 8.0), team("3", 8.0)],
                &[team("4", 1.0), team("5", 1.0), team("6", 1.0)],
                200,
            )
            .unwrap()
    }

    #[test]
    fn test_render_prediction() {
        let text = render_prediction(&prediction());
        assert!(text.starts_with("decode-2026 prediction (200 trials, seed 1)"));
        assert!(text.contains("RED [1, 2, 3]"));
        assert!(text.contains("Verdict: red favored"));
        assert!(text.contains("teleop_classified"));
        assert!(text.contains("RP criteria:"));
        assert!(text.contains(&format!("(confidence: {})", prediction().confidence())));
    }

    #[test]
    fn test_verdict_confidence_levels() {
        let mut p = prediction();
        for (red, blue, level) in [(0.48, 0.45, "low"), (0.6, 0.35, "medium"), (0.85, 0.1, "high")] {
            p.red.win_probability = red;
            p.blue.win_probability = blue;
            p.tie_probability = 1.0 - red - blue;
            let text = render_prediction(&p);
            assert!(text.contains(&format!("(confidence: {level})")), "{text}");
        }
    }

    #[test]
    fn test_prediction_report_json() {
        let rules = Season::Decode2026.rules();
        let report = PredictionReport::new(prediction(), rules);
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["generated_at"].is_string());
        assert_eq!(value["prediction"]["trial_count"], 200);
        assert_eq!(value["prediction"]["red"]["teams"][0], "1");
    }

    #[test]
    fn test_render_profile() {
        let rules = Season::Decode2026.rules();
        let profile = PerformanceProfile::zeroed("9999", rules);
        let text = render_profile(&profile, rules);
        assert!(text.contains("Team 9999 (0 matches, decode-2026)"));
        assert!(text.contains("none 100.0%"));

        let report = ProfileReport::new(profile, rules);
        assert_eq!(report.expected_points, 0.0);
    }
}
