// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! SQLite-based session storage.

use std::path::{Path, PathBuf};
#[cfg(feature = "telemetry")]
use std::time::Instant;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::SessionError;
use crate::types::Role;

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use super::types::{Message, Session, SessionStats};

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Session columns plus statistics aggregated over the session's messages.
const SESSION_SELECT: &str = r#"
    SELECT s.id, s.title, s.project_path, s.created_at, s.updated_at,
           COUNT(m.seq),
           COALESCE(SUM(CASE WHEN m.role = 'user' THEN 1 ELSE 0 END), 0),
           COALESCE(SUM(m.prompt_tokens), 0),
           COALESCE(SUM(m.completion_tokens), 0),
           COALESCE(SUM(m.cost), 0.0)
    FROM sessions s
    LEFT JOIN messages m ON m.session_id = s.id
"#;

const MESSAGE_SELECT: &str = r#"
    SELECT id, session_id, role, content, prompt_tokens, completion_tokens, cost, created_at
    FROM messages
"#;

/// Session storage using SQLite.
pub struct SessionStorage {
    conn: Connection,
    path: PathBuf,
}

impl SessionStorage {
    /// Open or create a session database at a specific path.
    pub fn open_at(db_path: &Path) -> Result<Self, SessionError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| SessionError::storage("Failed to open sessions database", e))?;

        // WAL for concurrent readers; foreign keys for the message cascade.
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )
        .map_err(|e| SessionError::storage("Failed to set pragmas", e))?;

        let storage = Self {
            conn,
            path: db_path.to_path_buf(),
        };
        storage.init_schema()?;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("session.storage.open", start.elapsed());

        Ok(storage)
    }

    /// Open a throwaway in-memory database.
    pub fn open_in_memory() -> Result<Self, SessionError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| SessionError::storage("Failed to open in-memory database", e))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| SessionError::storage("Failed to set pragmas", e))?;

        let storage = Self {
            conn,
            path: PathBuf::from(":memory:"),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), SessionError> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                project_path TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                session_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                prompt_tokens INTEGER NOT NULL DEFAULT 0,
                completion_tokens INTEGER NOT NULL DEFAULT 0,
                cost REAL NOT NULL DEFAULT 0.0,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON sessions(updated_at DESC);
            CREATE INDEX IF NOT EXISTS idx_messages_order ON messages(session_id, created_at, seq);
            "#,
            )
            .map_err(|e| SessionError::storage("Failed to create schema", e))?;

        let current_version: Option<u32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| SessionError::storage("Failed to get schema version", e))?;

        if current_version.is_none() {
            self.conn
                .execute(
                    "INSERT INTO schema_version (version) VALUES (?)",
                    params![SCHEMA_VERSION],
                )
                .map_err(|e| SessionError::storage("Failed to set schema version", e))?;
        }

        Ok(())
    }

    /// Create a new session.
    pub fn create_session(&self, session: &Session) -> Result<(), SessionError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        self.conn
            .execute(
                "INSERT INTO sessions (id, title, project_path, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
                params![
                    session.id,
                    session.title,
                    session.project_path,
                    session.created_at,
                    session.updated_at,
                ],
            )
            .map_err(|e| SessionError::storage("Failed to create session", e))?;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("session.storage.create", start.elapsed());

        Ok(())
    }

    /// Get a session by ID, with statistics computed from its current messages.
    pub fn get_session(&self, id: &str) -> Result<Option<Session>, SessionError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        let sql = format!("{} WHERE s.id = ? GROUP BY s.id", SESSION_SELECT);
        let result = self
            .conn
            .query_row(&sql, params![id], session_from_row)
            .optional()
            .map_err(|e| SessionError::storage("Failed to get session", e))?;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("session.storage.get", start.elapsed());

        Ok(result)
    }

    /// List all sessions, most recently updated first.
    pub fn list_sessions(&self) -> Result<Vec<Session>, SessionError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        let sql = format!("{} GROUP BY s.id ORDER BY s.updated_at DESC", SESSION_SELECT);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| SessionError::storage("Failed to prepare query", e))?;

        let sessions = stmt
            .query_map([], session_from_row)
            .map_err(|e| SessionError::storage("Failed to query sessions", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SessionError::storage("Failed to collect sessions", e))?;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("session.storage.list", start.elapsed());

        Ok(sessions)
    }

    /// Rename a session.
    pub fn set_title(&self, id: &str, title: &str) -> Result<(), SessionError> {
        let rows = self
            .conn
            .execute(
                "UPDATE sessions SET title = ?, updated_at = ? WHERE id = ?",
                params![title, now_millis(), id],
            )
            .map_err(|e| SessionError::storage("Failed to update session", e))?;

        if rows == 0 {
            return Err(SessionError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete a session and its messages.
    pub fn delete_session(&self, id: &str) -> Result<bool, SessionError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        // Messages are deleted via CASCADE
        let rows = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?", params![id])
            .map_err(|e| SessionError::storage("Failed to delete session", e))?;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("session.storage.delete", start.elapsed());

        Ok(rows > 0)
    }

    /// Append a message to its session.
    pub fn add_message(&self, message: &Message) -> Result<(), SessionError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| SessionError::storage("Failed to begin transaction", e))?;

        let touched = tx
            .execute(
                "UPDATE sessions SET updated_at = ? WHERE id = ?",
                params![now_millis(), message.session_id],
            )
            .map_err(|e| SessionError::storage("Failed to touch session", e))?;
        if touched == 0 {
            return Err(SessionError::NotFound(message.session_id.clone()));
        }

        tx.execute(
            r#"
            INSERT INTO messages (
                id, session_id, role, content, prompt_tokens, completion_tokens, cost, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                message.id,
                message.session_id,
                message.role.as_str(),
                message.content,
                message.prompt_tokens as i64,
                message.completion_tokens as i64,
                message.cost,
                message.created_at,
            ],
        )
        .map_err(|e| SessionError::storage("Failed to add message", e))?;

        tx.commit()
            .map_err(|e| SessionError::storage("Failed to commit message", e))?;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("session.storage.add_message", start.elapsed());

        Ok(())
    }

    /// Get all messages for a session in chronological order.
    pub fn list_messages(&self, session_id: &str) -> Result<Vec<Message>, SessionError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        let sql = format!(
            "{} WHERE session_id = ? ORDER BY created_at ASC, seq ASC",
            MESSAGE_SELECT
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| SessionError::storage("Failed to prepare query", e))?;

        let messages = stmt
            .query_map(params![session_id], message_from_row)
            .map_err(|e| SessionError::storage("Failed to get messages", e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SessionError::storage("Failed to collect messages", e))?;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("session.storage.list_messages", start.elapsed());

        Ok(messages)
    }

    /// Get message count for a session.
    pub fn message_count(&self, session_id: &str) -> Result<u32, SessionError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM messages WHERE session_id = ?",
                params![session_id],
                |row| row.get(0),
            )
            .map_err(|e| SessionError::storage("Failed to get message count", e))?;

        Ok(count as u32)
    }

    /// Delete a message and every message created after it, in one transaction.
    ///
    /// Returns the number of deleted messages.
    pub fn delete_from_id(&self, session_id: &str, message_id: &str) -> Result<u32, SessionError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| SessionError::storage("Failed to begin transaction", e))?;

        let anchor: Option<(i64, i64)> = tx
            .query_row(
                "SELECT created_at, seq FROM messages WHERE session_id = ? AND id = ?",
                params![session_id, message_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| SessionError::storage("Failed to locate message", e))?;

        let Some((created_at, seq)) = anchor else {
            return Err(SessionError::MessageNotFound {
                session_id: session_id.to_string(),
                message_id: message_id.to_string(),
            });
        };

        let deleted = tx
            .execute(
                r#"
            DELETE FROM messages
            WHERE session_id = ?1
              AND (created_at > ?2 OR (created_at = ?2 AND seq >= ?3))
            "#,
                params![session_id, created_at, seq],
            )
            .map_err(|e| SessionError::storage("Failed to delete messages", e))?;

        tx.execute(
            "UPDATE sessions SET updated_at = ? WHERE id = ?",
            params![now_millis(), session_id],
        )
        .map_err(|e| SessionError::storage("Failed to touch session", e))?;

        tx.commit()
            .map_err(|e| SessionError::storage("Failed to commit deletion", e))?;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("session.storage.delete_from_id", start.elapsed());

        Ok(deleted as u32)
    }

    /// Get the database path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        title: row.get(1)?,
        project_path: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        stats: SessionStats {
            message_count: row.get::<_, i64>(5)? as u32,
            user_message_count: row.get::<_, i64>(6)? as u32,
            prompt_tokens: row.get::<_, i64>(7)? as u64,
            completion_tokens: row.get::<_, i64>(8)? as u64,
            cost: row.get(9)?,
        },
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    let role_str: String = row.get(2)?;
    let role = Role::parse(&role_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown role '{}'", role_str).into(),
        )
    })?;

    Ok(Message {
        id: row.get(0)?,
        session_id: row.get(1)?,
        role,
        content: row.get(3)?,
        prompt_tokens: row.get::<_, i64>(4)? as u64,
        completion_tokens: row.get::<_, i64>(5)? as u64,
        cost: row.get(6)?,
        created_at: row.get(7)?,
    })
}
