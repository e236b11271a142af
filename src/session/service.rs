// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session service for managing conversation sessions.

use std::path::Path;
use std::sync::Arc;
#[cfg(feature = "telemetry")]
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::SessionError;

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use super::storage::SessionStorage;
use super::store::{MessageStore, SessionStore};
use super::types::{Message, Session};

/// Async facade over [`SessionStorage`].
///
/// All calls serialize on one connection, so a rewind's delete never
/// interleaves with a message append.
#[derive(Clone)]
pub struct SessionService {
    storage: Arc<Mutex<SessionStorage>>,
}

impl SessionService {
    /// Open the database at `db_path`, creating it if needed.
    pub fn open(db_path: &Path) -> Result<Self, SessionError> {
        let storage = SessionStorage::open_at(db_path)?;
        Ok(Self::with_storage(storage))
    }

    /// Create with a pre-configured storage (useful for testing).
    pub fn with_storage(storage: SessionStorage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    /// Create a new session.
    pub async fn create(&self, title: String, project_path: String) -> Result<Session, SessionError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        let session = Session::new(Session::generate_id(), title, project_path);

        let storage = self.storage.lock().await;
        storage.create_session(&session)?;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("session.service.create", start.elapsed());

        tracing::debug!(session_id = %session.id, "session created");
        Ok(session)
    }

    /// Get a session by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Session>, SessionError> {
        let storage = self.storage.lock().await;
        storage.get_session(id)
    }

    /// List all sessions.
    pub async fn list(&self) -> Result<Vec<Session>, SessionError> {
        let storage = self.storage.lock().await;
        storage.list_sessions()
    }

    /// Delete a session.
    pub async fn delete(&self, id: &str) -> Result<bool, SessionError> {
        let storage = self.storage.lock().await;
        storage.delete_session(id)
    }

    /// Set session title.
    pub async fn set_title(&self, session_id: &str, title: &str) -> Result<(), SessionError> {
        let storage = self.storage.lock().await;
        storage.set_title(session_id, title)
    }

    /// Append a message to a session.
    pub async fn add_message(&self, message: &Message) -> Result<(), SessionError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        let storage = self.storage.lock().await;
        storage.add_message(message)?;

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("session.service.add_message", start.elapsed());

        Ok(())
    }

    /// Get all messages for a session.
    pub async fn messages(&self, session_id: &str) -> Result<Vec<Message>, SessionError> {
        let storage = self.storage.lock().await;
        storage.list_messages(session_id)
    }
}

#[async_trait]
impl MessageStore for SessionService {
    async fn list(&self, session_id: &str) -> Result<Vec<Message>, SessionError> {
        self.messages(session_id).await
    }

    async fn delete_from_id(&self, session_id: &str, message_id: &str) -> Result<u32, SessionError> {
        let storage = self.storage.lock().await;
        storage.delete_from_id(session_id, message_id)
    }
}

#[async_trait]
impl SessionStore for SessionService {
    async fn get(&self, session_id: &str) -> Result<Session, SessionError> {
        SessionService::get(self, session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }
}
