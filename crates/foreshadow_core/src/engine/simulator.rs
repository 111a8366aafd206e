use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info, info_span};

use super::aggregator::PredictionAggregator;
use super::sampler::{OutcomeSampler, TeamSample};
use super::settings::{Execution, SimulationSettings};
use super::trial::{Scorer, TrialResult};
use crate::error::{PredictionError, Result};
use crate::models::{Alliance, MatchPrediction, PerformanceProfile, ALLIANCE_SIZE};
use crate::rules::GameScoringRule;

/// Runs independent Monte Carlo trials of one match between two alliances.
///
/// The rule set is validated and compiled once at construction and only read
/// afterwards.
///
/// ```rust
/// use foreshadow_core::engine::MatchSimulator;
/// use foreshadow_core::models::PerformanceProfile;
/// use foreshadow_core::rules::Season;
///
/// let rules = Season::Decode2026.rules();
/// let team = |id: &str| PerformanceProfile::zeroed(id, rules);
/// let red = [team("1"), team("2"), team("3")];
/// let blue = [team("4"), team("5"), team("6")];
///
/// let simulator = MatchSimulator::new(rules.clone()).unwrap().with_seed(42);
/// let prediction = simulator.simulate_match(&red, &blue, 100).unwrap();
/// assert_eq!(prediction.tie_probability, 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct MatchSimulator {
    rules: GameScoringRule,
    scorer: Scorer,
    settings: SimulationSettings,
}

impl MatchSimulator {
    pub fn new(rules: GameScoringRule) -> Result<Self> {
        rules.validate()?;
        let scorer = Scorer::compile(&rules)?;
        Ok(Self {
            rules,
            scorer,
            settings: SimulationSettings::default(),
        })
    }

    /// Fix the entropy seed; runs become reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.settings.seed = Some(seed);
        self
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.settings.execution = execution;
        self
    }

    pub fn with_settings(mut self, settings: SimulationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Simulate with the configured trial count.
    pub fn simulate(
        &self,
        red: &[PerformanceProfile],
        blue: &[PerformanceProfile],
    ) -> Result<MatchPrediction> {
        self.simulate_match(red, blue, self.settings.trial_count)
    }

    /// Run `trial_count` trials and fold them into a prediction.
    ///
    /// Fails with `AllianceSize` unless both alliances have exactly three
    /// profiles, with `InvalidTrialCount` for zero trials, and with an
    /// `Unmapped*` error when a profile names something the rule set cannot
    /// score. Nothing can fail once the trials start.
    pub fn simulate_match(
        &self,
        red: &[PerformanceProfile],
        blue: &[PerformanceProfile],
        trial_count: usize,
    ) -> Result<MatchPrediction> {
        check_alliance(Alliance::Red, red)?;
        check_alliance(Alliance::Blue, blue)?;
        if trial_count < 1 {
            return Err(PredictionError::InvalidTrialCount(trial_count));
        }

        let red_samplers = self.samplers(red)?;
        let blue_samplers = self.samplers(blue)?;
        let seed = self.settings.seed.unwrap_or_else(|| rand::thread_rng().gen());
        let execution = self.settings.execution;

        let span = info_span!(
            "simulate_match",
            season = %self.rules.season,
            trials = trial_count,
            seed,
            %execution
        );
        let _guard = span.enter();

        let run = |index: usize| self.run_trial(seed, index, &red_samplers, &blue_samplers);
        let trials: Vec<TrialResult> = match execution {
            Execution::Sequential => (0..trial_count).map(run).collect(),
            Execution::Parallel => (0..trial_count).into_par_iter().map(run).collect(),
        };

        let prediction = PredictionAggregator::new(&self.rules).aggregate(
            team_ids(red),
            team_ids(blue),
            seed,
            &trials,
        );
        info!(
            red_win = prediction.red.win_probability,
            blue_win = prediction.blue.win_probability,
            tie = prediction.tie_probability,
            red_avg = prediction.red.average_score,
            blue_avg = prediction.blue.average_score,
            "simulation complete"
        );
        Ok(prediction)
    }

    fn samplers(&self, profiles: &[PerformanceProfile]) -> Result<Vec<OutcomeSampler>> {
        profiles
            .iter()
            .map(|profile| {
                debug!(
                    team = profile.team_id(),
                    expected_points = profile.expected_points(&self.rules),
                    "resolving profile"
                );
                OutcomeSampler::new(profile, &self.rules)
            })
            .collect()
    }

    /// One trial on its own ChaCha8 stream: stream `index` of `seed`.
    fn run_trial(
        &self,
        seed: u64,
        index: usize,
        red: &[OutcomeSampler],
        blue: &[OutcomeSampler],
    ) -> TrialResult {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(index as u64);

        let red_samples: Vec<TeamSample> = red.iter().map(|s| s.sample(&mut rng)).collect();
        let blue_samples: Vec<TeamSample> = blue.iter().map(|s| s.sample(&mut rng)).collect();

        self.scorer.finish(
            self.scorer.score_alliance(&red_samples),
            self.scorer.score_alliance(&blue_samples),
        )
    }
}

fn check_alliance(side: Alliance, profiles: &[PerformanceProfile]) -> Result<()> {
    if profiles.len() == ALLIANCE_SIZE {
        Ok(())
    } else {
        Err(PredictionError::AllianceSize {
            side,
            expected: ALLIANCE_SIZE,
            found: profiles.len(),
        })
    }
}

fn team_ids(profiles: &[PerformanceProfile]) -> Vec<String> {
    profiles.iter().map(|p| p.team_id().to_string()).collect()
}
