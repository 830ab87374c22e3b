//! Note store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Define the fetch/import boundary the notes service talks to.
//! - Provide a local SQLite-backed store for the CLI and tests.
//!
//! # Invariants
//! - `fetch_corpus` never fails because of one malformed value; such values
//!   come back as `NoteContent::Malformed`.
//! - `import_files` is all-or-nothing: one transaction per import.
//! - Import upserts: keys not in the payload are left untouched.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::corpus::{Corpus, NoteContent};
use log::{info, warn};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from note store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Remote or otherwise unreachable backend.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "note store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "note store requires table `{table}`")
            }
            Self::Unavailable(message) => write!(f, "note store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of one import request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Success { imported: usize },
    /// Rejected payload; nothing was written.
    Failure { reason: String },
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Wire status string: `success` or `failure`.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
        }
    }
}

/// One recorded import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBatch {
    pub id: i64,
    pub note_count: usize,
    /// Epoch ms.
    pub imported_at: i64,
}

/// Backend that owns the notes.
pub trait NoteStore {
    /// Returns the full corpus.
    fn fetch_corpus(&self) -> StoreResult<Corpus>;
    /// Stores a full or partial replacement set of notes.
    fn import_files(&self, files: &BTreeMap<String, String>) -> StoreResult<ImportOutcome>;
}

/// SQLite-backed note store.
pub struct SqliteNoteStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteStore<'conn> {
    /// Creates store from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Returns the most recent successful import.
    pub fn last_import(&self) -> StoreResult<Option<ImportBatch>> {
        let batch = self
            .conn
            .query_row(
                "SELECT id, note_count, imported_at
                 FROM import_batches
                 ORDER BY id DESC
                 LIMIT 1;",
                [],
                |row| {
                    Ok(ImportBatch {
                        id: row.get(0)?,
                        note_count: row.get::<_, i64>(1)?.max(0) as usize,
                        imported_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(batch)
    }
}

impl NoteStore for SqliteNoteStore<'_> {
    fn fetch_corpus(&self) -> StoreResult<Corpus> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, content FROM notes ORDER BY key ASC;")?;
        let mut rows = stmt.query([])?;
        let mut corpus = Corpus::new();

        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let content = content_from_sql(row.get_ref(1)?);
            if let NoteContent::Malformed { kind } = &content {
                warn!(
                    "event=notes_fetch module=repo status=malformed kind={} key={}",
                    kind, key
                );
            }
            corpus.insert(key, content);
        }

        Ok(corpus)
    }

    fn import_files(&self, files: &BTreeMap<String, String>) -> StoreResult<ImportOutcome> {
        if files.is_empty() {
            return Ok(ImportOutcome::Failure {
                reason: "no files to import".to_string(),
            });
        }
        if let Some(key) = files.keys().find(|key| key.trim().is_empty()) {
            return Ok(ImportOutcome::Failure {
                reason: format!("invalid note key `{key}`"),
            });
        }

        let now = now_epoch_ms();
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut upsert = tx.prepare(
                "INSERT INTO notes (key, content, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                    content = excluded.content,
                    updated_at = excluded.updated_at;",
            )?;
            for (key, content) in files {
                upsert.execute(params![key, content, now])?;
            }
        }
        tx.execute(
            "INSERT INTO import_batches (note_count, imported_at) VALUES (?1, ?2);",
            params![files.len() as i64, now],
        )?;
        tx.commit()?;

        info!(
            "event=notes_import module=repo status=ok count={}",
            files.len()
        );
        Ok(ImportOutcome::Success {
            imported: files.len(),
        })
    }
}

fn content_from_sql(value: ValueRef<'_>) -> NoteContent {
    match value {
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => NoteContent::Text(text.to_string()),
            Err(_) => NoteContent::Malformed {
                kind: "invalid_utf8",
            },
        },
        ValueRef::Null => NoteContent::Malformed { kind: "null" },
        ValueRef::Integer(_) => NoteContent::Malformed { kind: "integer" },
        ValueRef::Real(_) => NoteContent::Malformed { kind: "real" },
        ValueRef::Blob(_) => NoteContent::Malformed { kind: "blob" },
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

fn ensure_store_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["notes", "import_batches"] {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
