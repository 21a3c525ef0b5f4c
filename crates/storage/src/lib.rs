#![forbid(unsafe_code)]

use bubbles_core::model::{Bubble, BubbleId, DESCRIPTION_MAX_CHARS, DueBucket};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = "bubbles.db";
const SCHEMA_VERSION: &str = "v1";

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    UnknownId,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::UnknownId => write!(f, "unknown id"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sql(err) => Some(err),
            Self::InvalidInput(_) | Self::UnknownId => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}

#[derive(Debug)]
pub struct SqliteStore {
    storage_dir: Option<PathBuf>,
    conn: Connection,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;
        let conn = Connection::open(storage_dir.join(DB_FILE_NAME))?;
        let store = Self {
            storage_dir: Some(storage_dir),
            conn,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            storage_dir: None,
            conn,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// `None` for in-memory stores.
    pub fn storage_dir(&self) -> Option<&Path> {
        self.storage_dir.as_deref()
    }

    /// Creates the `bubble` table if it is missing. Safe to call repeatedly.
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        if self.storage_dir.is_some() {
            self.conn.execute_batch(
                r#"
                PRAGMA journal_mode=WAL;
                PRAGMA synchronous=NORMAL;
                "#,
            )?;
        }
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS meta (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS bubble (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              description VARCHAR(250) NOT NULL,
              "when" VARCHAR(50) NOT NULL
                CHECK ("when" IN ('Due today', 'Due this week', 'Due later(ish)')),
              is_complete BOOLEAN NOT NULL DEFAULT 0
                CHECK (is_complete IN (0, 1))
            );
            "#,
        )?;
        self.conn.execute(
            "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
            params!["schema_version", SCHEMA_VERSION],
        )?;
        Ok(())
    }

    pub fn create(&mut self, description: &str, due: DueBucket) -> Result<BubbleId, StoreError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(StoreError::InvalidInput("description required"));
        }
        if description.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(StoreError::InvalidInput("description too long"));
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO bubble(description, "when", is_complete)
            VALUES (?1, ?2, 0)
            "#,
            params![description, due.label()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(BubbleId::new(id))
    }

    pub fn list_all(&self) -> Result<Vec<Bubble>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, description, "when", is_complete
            FROM bubble
            ORDER BY id ASC
            "#,
        )?;
        let rows = stmt.query_map([], bubble_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get(&self, id: BubbleId) -> Result<Bubble, StoreError> {
        self.conn
            .query_row(
                r#"
                SELECT id, description, "when", is_complete
                FROM bubble
                WHERE id = ?1
                "#,
                params![id.get()],
                bubble_from_row,
            )
            .optional()?
            .ok_or(StoreError::UnknownId)
    }

    /// Flips `is_complete` to true. Popping an already popped bubble is a no-op.
    pub fn mark_complete(&mut self, id: BubbleId) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE bubble SET is_complete = 1 WHERE id = ?1",
            params![id.get()],
        )?;
        if updated == 0 {
            return Err(StoreError::UnknownId);
        }
        tx.commit()?;
        Ok(())
    }

    pub fn count(&self) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM bubble", [], |row| row.get(0))?)
    }
}

fn bubble_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bubble> {
    let when: String = row.get(2)?;
    let Some(due) = DueBucket::from_label(&when) else {
        return Err(rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown due bucket: {when}").into(),
        ));
    };
    Ok(Bubble {
        id: BubbleId::new(row.get(0)?),
        description: row.get(1)?,
        due,
        is_complete: row.get(3)?,
    })
}
