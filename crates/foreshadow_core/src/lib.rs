//! # foreshadow_core - Monte Carlo Alliance Match Prediction
//!
//! Turns historical per-team scouting statistics into a probabilistic model of
//! a 3v3 alliance match.
//!
//! ## Features
//! - Season scoring rules as validated YAML/JSON data, no hardcoded points
//! - Per-team performance profiles from heterogeneous match rows
//! - Poisson / Bernoulli / categorical sampling per team and trial
//! - Reproducible runs: same seed = same prediction, sequential or parallel
//!
//! ## Flow
//! [`StatsExtractor`] → [`PerformanceProfile`] ×6 → [`MatchSimulator`] →
//! N × [`TrialResult`] → [`PredictionAggregator`] → [`MatchPrediction`]

pub mod engine;
pub mod error;
pub mod extract;
pub mod models;
pub mod rules;

pub use engine::{
    Execution, MatchSimulator, OutcomeSampler, PredictionAggregator, SimulationSettings,
    TeamSample, TrialOutcome, TrialResult,
};
pub use error::{ErrorKind, PredictionError, Result};
pub use extract::{MissingDataPolicy, StatsExtractor};
pub use models::{
    Alliance, AlliancePrediction, Confidence, EndgameDistribution, HistoryStore, MatchHistory,
    MatchPrediction, MatchRecord, PerformanceProfile, RowValue, ScoreBreakdown,
};
pub use rules::{GameScoringRule, Season};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
