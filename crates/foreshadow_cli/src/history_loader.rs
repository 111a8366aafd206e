//! Scouting export → [`HistoryStore`].
//!
//! CSV: one header row, one row per team-match, the team identified by a
//! configurable column. JSON: an array of `{ "team": ..., "values": { ... } }`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use foreshadow_core::{HistoryStore, MatchRecord, RowValue};
use serde::Deserialize;
use tracing::{info, warn};

/// Default CSV column holding the team identifier.
pub const DEFAULT_TEAM_COLUMN: &str = "Team Number";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFormat {
    Csv,
    Json,
}

impl HistoryFormat {
    /// `.json` files are JSON; everything else is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => HistoryFormat::Json,
            _ => HistoryFormat::Csv,
        }
    }
}

pub fn load_history(path: &Path, team_column: &str) -> Result<HistoryStore> {
    let store = match HistoryFormat::from_path(path) {
        HistoryFormat::Csv => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
            read_csv_history(file, team_column)
                .with_context(|| format!("Failed to parse CSV history: {}", path.display()))?
        }
        HistoryFormat::Json => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read JSON file: {}", path.display()))?;
            read_json_history(&json)
                .with_context(|| format!("Failed to parse JSON history: {}", path.display()))?
        }
    };
    info!(
        path = %path.display(),
        teams = store.team_count(),
        rows = store.row_count(),
        "loaded match history"
    );
    Ok(store)
}

pub fn read_csv_history<R: Read>(reader: R, team_column: &str) -> Result<HistoryStore> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let team_idx = headers
        .iter()
        .position(|h| h == team_column)
        .with_context(|| format!("CSV header has no '{team_column}' column"))?;

    let mut store = HistoryStore::new();
    for (line, record) in reader.records().enumerate() {
        // header is line 1
        let line = line + 2;
        let record = record.with_context(|| format!("Malformed CSV record at line {line}"))?;
        let team = record.get(team_idx).unwrap_or("").trim();
        if team.is_empty() {
            warn!(line, "skipping row without a team identifier");
            continue;
        }

        let row: MatchRecord = headers
            .iter()
            .zip(record.iter())
            .enumerate()
            .filter(|(i, _)| *i != team_idx)
            .map(|(_, (column, cell))| (column, RowValue::parse_cell(cell)))
            .collect();
        store.push(team, row);
    }
    Ok(store)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TeamKey {
    Number(u64),
    Text(String),
}

impl TeamKey {
    fn into_id(self) -> String {
        match self {
            TeamKey::Number(n) => n.to_string(),
            TeamKey::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    team: TeamKey,
    values: MatchRecord,
}

pub fn read_json_history(json: &str) -> Result<HistoryStore> {
    let entries: Vec<HistoryEntry> =
        serde_json::from_str(json).context("Expected an array of {team, values} entries")?;

    let mut store = HistoryStore::new();
    for entry in entries {
        let team = entry.team.into_id();
        if team.is_empty() {
            warn!("skipping entry without a team identifier");
            continue;
        }
        store.push(team, entry.values);
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foreshadow_core::MatchHistory;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CSV: &str = "\
Match Number,Team Number,Coral L4 (Teleop),Moved (Auto),End Position
1,118,4,Yes,Deep Cage
1,254,,No,Park
2,118,6,true,
3,,9,Yes,Deep
";

    #[test]
    fn test_read_csv_history() -> Result<()> {
        let store = read_csv_history(CSV.as_bytes(), DEFAULT_TEAM_COLUMN)?;

        assert_eq!(store.team_count(), 2);
        assert_eq!(store.row_count(), 3);

        let rows = store.team_rows("118");
        assert_eq!(rows[0].get("Coral L4 (Teleop)"), Some(&RowValue::Number(4.0)));
        assert_eq!(rows[1].get("Moved (Auto)"), Some(&RowValue::Flag(true)));
        assert_eq!(rows[1].get("End Position"), Some(&RowValue::Empty));
        assert!(rows[0].get(DEFAULT_TEAM_COLUMN).is_none());

        let rows = store.team_rows("254");
        assert_eq!(rows[0].get("Coral L4 (Teleop)"), Some(&RowValue::Empty));
        Ok(())
    }

    #[test]
    fn test_csv_missing_team_column() {
        let err = read_csv_history(CSV.as_bytes(), "Team").unwrap_err();
        assert!(err.to_string().contains("'Team'"));
    }

    #[test]
    fn test_read_json_history() -> Result<()> {
        let json = r#"[
            {"team": 7421, "values": {"Returned to Base": "Fully Returned", "Left Launch Line (LEAVE)": true}},
            {"team": "7421", "values": {"Artifacts Scored (CLASSIFIED) (Teleop)": 9}},
            {"team": " ", "values": {}}
        ]"#;
        let store = read_json_history(json)?;
        assert_eq!(store.team_ids(), vec!["7421".to_string()]);
        assert_eq!(store.row_count(), 2);
        Ok(())
    }

    #[test]
    fn test_load_history_by_extension() -> Result<()> {
        let mut csv_file = NamedTempFile::with_suffix(".csv")?;
        csv_file.write_all(CSV.as_bytes())?;
        let store = load_history(csv_file.path(), DEFAULT_TEAM_COLUMN)?;
        assert_eq!(store.team_count(), 2);

        let mut json_file = NamedTempFile::with_suffix(".json")?;
        json_file.write_all(br#"[{"team": 1, "values": {"x": 1}}]"#)?;
        let store = load_history(json_file.path(), DEFAULT_TEAM_COLUMN)?;
        assert_eq!(store.team_rows("1").len(), 1);
        Ok(())
    }

    #[test]
    fn test_load_history_missing_file() {
        let err = load_history(Path::new("/nonexistent/history.csv"), DEFAULT_TEAM_COLUMN)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to open CSV file"));
    }
}
