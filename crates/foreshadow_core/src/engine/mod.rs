//! Monte Carlo match engine.
//!
//! ```text
//! PerformanceProfile ──► OutcomeSampler ──► TeamSample (x6 per trial)
//!                                              │
//!                               Scorer ◄───────┘
//!                                 │
//!                            TrialResult (x N) ──► PredictionAggregator ──► MatchPrediction
//! ```
//!
//! Every trial owns its own ChaCha8 stream derived from the run seed and the
//! trial index, so a run is reproducible and parallel execution returns the
//! same prediction as sequential execution.

mod aggregator;
mod sampler;
mod settings;
mod simulator;
pub(crate) mod trial;


pub use aggregator::PredictionAggregator;
pub use sampler::{OutcomeSampler, TeamSample};
pub use settings::{Execution, SimulationSettings, DEFAULT_TRIAL_COUNT};
pub use simulator::MatchSimulator;
pub use trial::{AllianceTrial, TrialOutcome, TrialResult};
