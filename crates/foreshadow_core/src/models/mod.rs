//! Data model shared by the extractor, the simulator and callers.

pub mod alliance;
pub mod history;
pub mod prediction;
pub mod profile;

pub use alliance::{Alliance, ALLIANCE_SIZE};
pub use history::{HistoryStore, MatchHistory, MatchRecord, RowValue};
pub use prediction::{AlliancePrediction, Confidence, MatchPrediction, ScoreBreakdown};
pub use profile::{EndgameDistribution, PerformanceProfile, ProfileBuilder};
