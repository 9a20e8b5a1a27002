use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::Result;

/// Best results recorded for one level
#[derive(Debug, Clone, PartialEq)]
pub struct LevelProgress {
    pub level_id: u32,
    pub best_wpm: f64,
    pub best_accuracy: f64,
    pub completed: bool,
    pub attempts: u32,
    pub last_attempt: Option<DateTime<Local>>,
}

impl LevelProgress {
    pub fn new(level_id: u32) -> Self {
        Self {
            level_id,
            best_wpm: 0.0,
            best_accuracy: 0.0,
            completed: false,
            attempts: 0,
            last_attempt: None,
        }
    }

    /// Folds one finished attempt into the best-of record.
    pub fn merge(&mut self, wpm: f64, accuracy: f64, passed: bool, at: DateTime<Local>) {
        if wpm > self.best_wpm {
            self.best_wpm = wpm;
        }
        if accuracy > self.best_accuracy {
            self.best_accuracy = accuracy;
        }
        self.completed |= passed;
        self.attempts += 1;
        self.last_attempt = Some(at);
    }
}

/// Sink for finished attempts. Callers treat failures as non-fatal.
pub trait ProgressStore {
    fn record(&mut self, level_id: u32, wpm: f64, accuracy: f64, passed: bool) -> Result<()>;

    /// Zeroed progress for levels never attempted
    fn get(&self, level_id: u32) -> Result<LevelProgress>;
}

/// SQLite-backed progress under the user's state directory
#[derive(Debug)]
pub struct SqliteProgressStore {
    conn: Connection,
}

impl SqliteProgressStore {
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("keytutor_progress.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path.as_ref())?;
        Self::init(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS level_progress (
                level_id INTEGER PRIMARY KEY,
                best_wpm REAL NOT NULL,
                best_accuracy REAL NOT NULL,
                completed BOOLEAN NOT NULL,
                attempts INTEGER NOT NULL,
                last_attempt TEXT
            )
            "#,
            [],
        )?;

        Ok(Self { conn })
    }
}

impl ProgressStore for SqliteProgressStore {
    fn record(&mut self, level_id: u32, wpm: f64, accuracy: f64, passed: bool) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO level_progress
            (level_id, best_wpm, best_accuracy, completed, attempts, last_attempt)
            VALUES (?1, ?2, ?3, ?4, 1, ?5)
            ON CONFLICT(level_id) DO UPDATE SET
                best_wpm = MAX(best_wpm, excluded.best_wpm),
                best_accuracy = MAX(best_accuracy, excluded.best_accuracy),
                completed = (completed OR excluded.completed),
                attempts = attempts + 1,
                last_attempt = excluded.last_attempt
            "#,
            params![level_id, wpm, accuracy, passed, Local::now().to_rfc3339()],
        )?;

        Ok(())
    }

    fn get(&self, level_id: u32) -> Result<LevelProgress> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT best_wpm, best_accuracy, completed, attempts, last_attempt
                FROM level_progress
                WHERE level_id = ?1
                "#,
                [level_id],
                |row| {
                    let last_attempt: Option<String> = row.get(4)?;
                    let last_attempt = last_attempt
                        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                        .map(|dt| dt.with_timezone(&Local));

                    Ok(LevelProgress {
                        level_id,
                        best_wpm: row.get(0)?,
                        best_accuracy: row.get(1)?,
                        completed: row.get(2)?,
                        attempts: row.get(3)?,
                        last_attempt,
                    })
                },
            )
            .optional()?;

        Ok(row.unwrap_or_else(|| LevelProgress::new(level_id)))
    }
}

/// Non-persistent store, used when the database cannot be opened
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    levels: HashMap<u32, LevelProgress>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn record(&mut self, level_id: u32, wpm: f64, accuracy: f64, passed: bool) -> Result<()> {
        self.levels
            .entry(level_id)
            .or_insert_with(|| LevelProgress::new(level_id))
            .merge(wpm, accuracy, passed, Local::now());
        Ok(())
    }

    fn get(&self, level_id: u32) -> Result<LevelProgress> {
        Ok(self
            .levels
            .get(&level_id)
            .cloned()
            .unwrap_or_else(|| LevelProgress::new(level_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exercise_store(store: &mut dyn ProgressStore) {
        let fresh = store.get(2).unwrap();
        assert_eq!(fresh, LevelProgress::new(2));

        store.record(2, 42.0, 91.0, false).unwrap();
        store.record(2, 38.0, 97.5, true).unwrap();
        store.record(2, 55.0, 80.0, false).unwrap();

        let progress = store.get(2).unwrap();
        assert_eq!(progress.best_wpm, 55.0);
        assert_eq!(progress.best_accuracy, 97.5);
        assert!(progress.completed, "a pass is never forgotten");
        assert_eq!(progress.attempts, 3);
        assert!(progress.last_attempt.is_some());

        // other levels untouched
        assert_eq!(store.get(3).unwrap().attempts, 0);
    }

    #[test]
    fn test_memory_store_keeps_best() {
        exercise_store(&mut MemoryProgressStore::new());
    }

    #[test]
    fn test_sqlite_store_keeps_best() {
        exercise_store(&mut SqliteProgressStore::in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_store_persists_across_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("progress.db");

        {
            let mut store = SqliteProgressStore::open(&path).unwrap();
            store.record(1, 61.5, 98.0, true).unwrap();
        }

        let store = SqliteProgressStore::open(&path).unwrap();
        let progress = store.get(1).unwrap();
        assert_eq!(progress.best_wpm, 61.5);
        assert!(progress.completed);
        assert_eq!(progress.attempts, 1);
    }

    #[test]
    fn test_merge_never_lowers_best() {
        let mut progress = LevelProgress::new(4);
        progress.merge(70.0, 99.0, true, Local::now());
        progress.merge(10.0, 50.0, false, Local::now());

        assert_eq!(progress.best_wpm, 70.0);
        assert_eq!(progress.best_accuracy, 99.0);
        assert!(progress.completed);
        assert_eq!(progress.attempts, 2);
    }
}
