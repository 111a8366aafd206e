//! Historical match rows as supplied by the upstream analytics collaborator.
//!
//! Rows arrive already normalized to the canonical column set; this module only
//! holds them. Nothing here knows which columns matter, that is decided by the
//! scoring rule the extractor is given.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One cell of a scouting export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Empty,
}

impl RowValue {
    /// Interpret a raw export cell: blank → `Empty`, `true`/`false` → `Flag`,
    /// anything parseable as a number → `Number`, otherwise `Text`.
    pub fn parse_cell(raw: &str) -> RowValue {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return RowValue::Empty;
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return RowValue::Flag(true),
            "false" => return RowValue::Flag(false),
            _ => {}
        }
        match trimmed.parse::<f64>() {
            Ok(n) => RowValue::Number(n),
            Err(_) => RowValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, RowValue::Empty)
    }
}

impl From<f64> for RowValue {
    fn from(v: f64) -> Self {
        RowValue::Number(v)
    }
}

impl From<i32> for RowValue {
    fn from(v: i32) -> Self {
        RowValue::Number(v as f64)
    }
}

impl From<u32> for RowValue {
    fn from(v: u32) -> Self {
        RowValue::Number(v as f64)
    }
}

impl From<bool> for RowValue {
    fn from(v: bool) -> Self {
        RowValue::Flag(v)
    }
}

impl From<&str> for RowValue {
    fn from(v: &str) -> Self {
        RowValue::Text(v.to_string())
    }
}

impl From<String> for RowValue {
    fn from(v: String) -> Self {
        RowValue::Text(v)
    }
}

/// One team's record of one match: column name → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchRecord {
    values: BTreeMap<String, RowValue>,
}

impl MatchRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RowValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<RowValue>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&RowValue> {
        self.values.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<RowValue>> FromIterator<(K, V)> for MatchRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = MatchRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// Source of per-team historical rows.
pub trait MatchHistory {
    /// Rows for one team in match order; empty when the team is unknown.
    fn team_rows(&self, team_id: &str) -> &[MatchRecord];

    /// Every team with at least one row.
    fn team_ids(&self) -> Vec<String>;
}

/// In-memory [`MatchHistory`] keyed by team identifier.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    rows: BTreeMap<String, Vec<MatchRecord>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, team_id: impl Into<String>, record: MatchRecord) {
        self.rows.entry(team_id.into()).or_default().push(record);
    }

    /// Total number of rows across all teams.
    pub fn row_count(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn team_count(&self) -> usize {
        self.rows.len()
    }
}

impl MatchHistory for HistoryStore {
    fn team_rows(&self, team_id: &str) -> &[MatchRecord] {
        self.rows.get(team_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn team_ids(&self) -> Vec<String> {
        self.rows.keys().cloned().collect()
    }
}

impl<T: Into<String>> FromIterator<(T, MatchRecord)> for HistoryStore {
    fn from_iter<I: IntoIterator<Item = (T, MatchRecord)>>(iter: I) -> Self {
        let mut store = HistoryStore::new();
        for (team, record) in iter {
            store.push(team, record);
        }
        store
    }
}
