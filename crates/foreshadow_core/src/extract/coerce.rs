//! Lenient reading of scouting cells.
//!
//! An empty count cell means "this row does not report the value" and keeps
//! the row out of that column's average. An empty event cell is an event that
//! did not happen, and an empty label has no tier.

use crate::models::RowValue;

const TRUTHY: [&str; 8] = ["1", "true", "t", "yes", "y", "si", "sí", "x"];

/// Count value of a cell. Negative, non-finite and non-numeric values read as 0.
pub fn as_count(value: &RowValue) -> Option<f64> {
    let n = match value {
        RowValue::Empty => return None,
        RowValue::Number(n) => *n,
        RowValue::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        RowValue::Flag(_) => 0.0,
    };
    Some(if n.is_finite() && n > 0.0 { n } else { 0.0 })
}

/// Whether a cell marks an event as achieved. Empty cells are not achieved.
pub fn is_truthy(value: &RowValue) -> bool {
    match value {
        RowValue::Empty => false,
        RowValue::Flag(b) => *b,
        RowValue::Number(n) => *n != 0.0 && !n.is_nan(),
        RowValue::Text(s) => {
            let lowered = s.trim().to_lowercase();
            TRUTHY.contains(&lowered.as_str())
        }
    }
}

/// Outcome label of a cell, e.g. an endgame position.
pub fn as_label(value: &RowValue) -> Option<String> {
    match value {
        RowValue::Empty => None,
        RowValue::Text(s) if s.trim().is_empty() => None,
        RowValue::Text(s) => Some(s.trim().to_string()),
        RowValue::Number(n) => Some(n.to_string()),
        RowValue::Flag(b) => Some(b.to_string()),
    }
}
