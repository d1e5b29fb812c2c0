//! Local persistence for trip reports, chats, survey responses and
//! achievements.
//!
//! Everything lives in one `SQLite` file under the storage root:
//!
//! ```text
//! <root>/juka.sqlite
//!   report            # one row per trip report, JSON body
//!   chat_message      # transcript lines, keyed by report
//!   survey_response   # latest answer per user and question
//!   achievement       # unlocks per user
//! ```

mod achievement;
mod report;
mod survey;

use std::{fs, io, path::PathBuf};

use jiff::Timestamp;
use rusqlite::Connection;
use uuid::Uuid;

use crate::model::{ChatMessage, TripError, TripReport, UnlockedAchievement};

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("report not found: {0}")]
    ReportNotFound(Uuid),

    #[error("report already exists: {0}")]
    ReportAlreadyExists(Uuid),

    #[error("refusing to store an invalid report: {0}")]
    InvalidReport(#[from] TripError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt data: {0}")]
    Corrupt(String),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Where finished reports and their chats are kept.
pub trait ReportStore {
    /// Stores a report together with the conversation that produced it.
    fn save_report(&self, report: &TripReport, chat: &[ChatMessage]) -> Result<()>;

    /// A user's reports, newest first. `None` lists them all.
    fn list_reports(&self, user_id: &str, limit: Option<usize>) -> Result<Vec<TripReport>>;

    /// The chat attached to a report, in the order it was written.
    fn list_chat_for(&self, report_id: Uuid) -> Result<Vec<ChatMessage>>;
}

/// What achievement evaluation reads and writes.
pub trait AchievementStore {
    fn has_completed_survey(&self, user_id: &str) -> Result<bool>;

    /// Records unlocks, ignoring ones already held. Returns the new ids.
    fn unlock_achievements(&self, user_id: &str, ids: &[&str], at: Timestamp)
    -> Result<Vec<String>>;

    fn load_achievements(&self, user_id: &str) -> Result<Vec<UnlockedAchievement>>;
}

/// Everything a conversation persists through.
pub trait Store: ReportStore + AchievementStore {}

impl<T: ReportStore + AchievementStore + ?Sized> Store for T {}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS report (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    date        TEXT NOT NULL,
    created_ms  INTEGER NOT NULL,
    body        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS report_by_user ON report (user_id, created_ms);

CREATE TABLE IF NOT EXISTS chat_message (
    id          TEXT PRIMARY KEY,
    report_id   TEXT NOT NULL REFERENCES report (id),
    seq         INTEGER NOT NULL,
    sender      TEXT NOT NULL,
    text        TEXT NOT NULL,
    sent_at     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS chat_by_report ON chat_message (report_id, seq);

CREATE TABLE IF NOT EXISTS survey_response (
    user_id      TEXT NOT NULL,
    question_id  INTEGER NOT NULL,
    answer       TEXT NOT NULL,
    submitted_at TEXT NOT NULL,
    PRIMARY KEY (user_id, question_id)
);

CREATE TABLE IF NOT EXISTS achievement (
    user_id        TEXT NOT NULL,
    achievement_id TEXT NOT NULL,
    unlocked_at    TEXT NOT NULL,
    unlocked_ms    INTEGER NOT NULL,
    PRIMARY KEY (user_id, achievement_id)
);
";

/// Local `SQLite`-backed storage.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a storage instance rooted at the given directory.
    ///
    /// The directory and the database schema are created if missing.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let storage = Self { root };
        storage.connect()?.execute_batch(SCHEMA)?;
        Ok(storage)
    }

    /// Returns the default storage root: `~/.juka/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".juka"))
    }

    /// Path of the database file.
    pub fn db_path(&self) -> PathBuf {
        self.root.join("juka.sqlite")
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(self.db_path())?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }
}

/// Parses a timestamp column, reporting which column was bad.
fn parse_timestamp(value: &str, column: &str) -> Result<Timestamp> {
    value
        .parse::<Timestamp>()
        .map_err(|e| StorageError::Corrupt(format!("invalid {column}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn new_creates_root_and_schema() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("nested").join("juka")).unwrap();

        assert!(storage.db_path().is_file());
        let conn = storage.connect().unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn reopening_keeps_existing_data() {
        let dir = TempDir::new().unwrap();
        let first = Storage::new(dir.path()).unwrap();
        first
            .unlock_achievements("marina", &["first-trip"], Timestamp::now())
            .unwrap();

        let second = Storage::new(dir.path()).unwrap();
        assert_eq!(second.load_achievements("marina").unwrap().len(), 1);
    }

    #[test]
    fn bad_timestamp_is_corrupt() {
        let err = parse_timestamp("yesterday", "sent_at").unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(msg) if msg.contains("sent_at")));
    }
}
