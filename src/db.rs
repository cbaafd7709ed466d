//! SQLite-backed store for intake records.
//!
//! This is the storage collaborator for the pipeline: simple CRUD with a
//! commit boundary. The two writes that carry invariants are expressed as
//! guarded single-statement updates so the commit point is atomic:
//! - `set_link_token_if_absent` never overwrites an existing token;
//! - `mark_sent` is a compare-and-set on `sent_at IS NULL`, so at most one
//!   send is ever recorded per intake.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use thiserror::Error;

use crate::types::LinkState;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("intake {0} not found")]
    RowNotFound(i64),
}

/// A row from the `intakes` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbIntake {
    pub id: i64,
    /// Raw questionnaire JSON, stored verbatim. Immutable after creation.
    pub payload: String,
    pub overview_text: Option<String>,
    pub detail_text: Option<String>,
    pub link_token: Option<String>,
    pub linked_user_id: Option<String>,
    /// RFC 3339. Presence is the authoritative "already notified" marker.
    pub sent_at: Option<String>,
    pub created_at: String,
}

impl DbIntake {
    pub fn link_state(&self) -> LinkState {
        if self.sent_at.is_some() {
            LinkState::LinkedAndSent
        } else if self.link_token.is_some() {
            LinkState::TokenIssued
        } else {
            LinkState::Unlinked
        }
    }
}

/// SQLite connection wrapper for intake state.
///
/// Intentionally not `Clone` or `Sync`; held behind a `parking_lot::Mutex`
/// in `AppState`. Callers take the lock for single statements only and
/// never hold it across an await point.
pub struct IntakeDb {
    conn: Connection,
}

impl IntakeDb {
    /// Open (or create) the database at `path` and apply the schema.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, DbError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS intakes (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                payload         TEXT NOT NULL,
                overview_text   TEXT,
                detail_text     TEXT,
                link_token      TEXT UNIQUE,
                linked_user_id  TEXT,
                sent_at         TEXT,
                created_at      TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_intakes_link_token
                ON intakes(link_token);",
        )?;
        Ok(Self { conn })
    }

    /// Store a raw payload and return the new intake id.
    pub fn insert_intake(&self, payload_json: &str) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO intakes (payload, created_at) VALUES (?1, ?2)",
            params![payload_json, Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_intake(&self, id: i64) -> Result<Option<DbIntake>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, payload, overview_text, detail_text, link_token,
                        linked_user_id, sent_at, created_at
                 FROM intakes WHERE id = ?1",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Look up an intake by its link token. Unknown tokens are `None`, not
    /// an error — inbound webhook text is untrusted.
    pub fn find_by_token(&self, token: &str) -> Result<Option<DbIntake>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, payload, overview_text, detail_text, link_token,
                        linked_user_id, sent_at, created_at
                 FROM intakes WHERE link_token = ?1",
                params![token],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Overwrite the generated narratives (regeneration is allowed).
    pub fn set_narratives(
        &self,
        id: i64,
        overview: &str,
        detail: &str,
    ) -> Result<(), DbError> {
        let changed = self.conn.execute(
            "UPDATE intakes SET overview_text = ?1, detail_text = ?2 WHERE id = ?3",
            params![overview, detail, id],
        )?;
        if changed == 0 {
            return Err(DbError::RowNotFound(id));
        }
        Ok(())
    }

    /// Set the link token only if none exists, then return the effective
    /// token. Concurrent issuance converges on whichever write landed first.
    pub fn set_link_token_if_absent(
        &self,
        id: i64,
        token: &str,
    ) -> Result<String, DbError> {
        self.conn.execute(
            "UPDATE intakes SET link_token = ?1
             WHERE id = ?2 AND link_token IS NULL",
            params![token, id],
        )?;
        let current: Option<String> = self
            .conn
            .query_row(
                "SELECT link_token FROM intakes WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(DbError::RowNotFound(id))?;
        // The guarded UPDATE either wrote our token or left an earlier one.
        current.ok_or(DbError::RowNotFound(id))
    }

    /// Compare-and-set commit of a successful send. Returns `true` iff this
    /// call recorded the send; `false` means another path already did.
    pub fn mark_sent(
        &self,
        id: i64,
        line_user_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let changed = self.conn.execute(
            "UPDATE intakes SET linked_user_id = ?1, sent_at = ?2
             WHERE id = ?3 AND sent_at IS NULL",
            params![line_user_id, sent_at.to_rfc3339(), id],
        )?;
        Ok(changed == 1)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbIntake> {
        Ok(DbIntake {
            id: row.get(0)?,
            payload: row.get(1)?,
            overview_text: row.get(2)?,
            detail_text: row.get(3)?,
            link_token: row.get(4)?,
            linked_user_id: row.get(5)?,
            sent_at: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}
