//! StatsExtractor - historical rows to [`PerformanceProfile`](crate::models::PerformanceProfile).

mod coerce;
mod extractor;

pub use coerce::{as_count, as_label, is_truthy};
pub use extractor::{MissingDataPolicy, StatsExtractor};
