use crate::error::StoreError;
use crate::result::QuizResult;
use crate::store::{KeyValueStore, HIGH_SCORES_KEY};
use chrono::{DateTime, Local, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighScore {
    pub id: Uuid,
    pub score: u32,
    pub percentage: u32,
    pub total_questions: usize,
    pub category: String,
    pub difficulty: String,
    pub timestamp: DateTime<Utc>,
}

impl HighScore {
    pub fn from_result(result: &QuizResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            score: result.score,
            percentage: result.percentage(),
            total_questions: result.total_questions,
            category: result.settings.category_name().to_string(),
            difficulty: result.settings.difficulty.to_string(),
            timestamp,
        }
    }

    /// e.g. "Mar 4, 2026 18:02" in local time.
    pub fn formatted_date(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%b %-d, %Y %H:%M")
            .to_string()
    }
}

/// High scores kept as one JSON array in the key-value store.
pub struct Leaderboard<'a, S: KeyValueStore> {
    store: &'a S,
}

impl<'a, S: KeyValueStore> Leaderboard<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All entries, best score first.
    pub fn entries(&self) -> Result<Vec<HighScore>, StoreError> {
        let scores: Vec<HighScore> = self.store.get_json(HIGH_SCORES_KEY)?.unwrap_or_default();
        Ok(scores
            .into_iter()
            .sorted_by(|a, b| b.score.cmp(&a.score).then(b.timestamp.cmp(&a.timestamp)))
            .collect())
    }

    pub fn record(&self, entry: HighScore) -> Result<(), StoreError> {
        let mut scores = self.entries()?;
        scores.push(entry);
        self.store.set_json(HIGH_SCORES_KEY, &scores)
    }

    pub fn record_result(&self, result: &QuizResult) -> Result<HighScore, StoreError> {
        let entry = HighScore::from_result(result, Utc::now());
        self.record(entry.clone())?;
        Ok(entry)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear(HIGH_SCORES_KEY)
    }

    /// Writes the ranked entries as CSV, returning how many rows were written.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<usize, StoreError> {
        let entries = self.entries()?;
        let mut writer = csv::Writer::from_path(path)?;
        for entry in &entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::{Difficulty, QuizSettings};
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn entry(score: u32, minute: u32) -> HighScore {
        HighScore {
            id: Uuid::new_v4(),
            score,
            percentage: 50,
            total_questions: 10,
            category: "History".into(),
            difficulty: "easy".into(),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 4, 18, minute, 0).unwrap(),
        }
    }

    #[test]
    fn empty_store_has_no_entries() {
        let store = MemoryStore::new();
        assert!(Leaderboard::new(&store).entries().unwrap().is_empty());
    }

    #[test]
    fn entries_are_sorted_by_score() {
        let store = MemoryStore::new();
        let board = Leaderboard::new(&store);
        board.record(entry(30, 1)).unwrap();
        board.record(entry(120, 2)).unwrap();
        board.record(entry(75, 3)).unwrap();

        let scores: Vec<u32> = board.entries().unwrap().iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![120, 75, 30]);
    }

    #[test]
    fn ties_prefer_most_recent() {
        let store = MemoryStore::new();
        let board = Leaderboard::new(&store);
        let older = entry(50, 1);
        let newer = entry(50, 9);
        board.record(older.clone()).unwrap();
        board.record(newer.clone()).unwrap();
        assert_eq!(board.entries().unwrap()[0].id, newer.id);
    }

    #[test]
    fn clear_removes_everything() {
        let store = MemoryStore::new();
        let board = Leaderboard::new(&store);
        board.record(entry(10, 0)).unwrap();
        board.clear().unwrap();
        assert!(board.entries().unwrap().is_empty());
    }

    #[test]
    fn record_result_uses_category_name() {
        let store = MemoryStore::new();
        let board = Leaderboard::new(&store);
        let result = QuizResult {
            score: 33,
            total_questions: 1,
            answers: vec![None],
            questions: vec![],
            settings: QuizSettings {
                category: "22".into(),
                difficulty: Difficulty::Hard,
                ..QuizSettings::default()
            },
        };
        let recorded = board.record_result(&result).unwrap();
        assert_eq!(recorded.category, "Geography");
        assert_eq!(recorded.difficulty, "hard");
        assert_eq!(board.entries().unwrap(), vec![recorded]);
    }

    #[test]
    fn export_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        let store = MemoryStore::new();
        let board = Leaderboard::new(&store);
        board.record(entry(10, 0)).unwrap();
        board.record(entry(20, 1)).unwrap();

        assert_eq!(board.export_csv(&path).unwrap(), 2);
        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("id,score,percentage,totalQuestions,category,difficulty,timestamp")
        );
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn formatted_date_has_year() {
        assert!(entry(1, 0).formatted_date().contains("2026"));
    }
}
