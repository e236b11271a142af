// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Store contracts the rewind flow depends on.

use async_trait::async_trait;

use crate::error::SessionError;

use super::types::{Message, Session};

/// Message persistence for a session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// All messages of the session in chronological order.
    async fn list(&self, session_id: &str) -> Result<Vec<Message>, SessionError>;

    /// Delete `message_id` and every later message of the session atomically.
    ///
    /// Returns the number of deleted messages, or `MessageNotFound` when the
    /// id does not belong to the session.
    async fn delete_from_id(&self, session_id: &str, message_id: &str) -> Result<u32, SessionError>;
}

/// Session lookup from the store of record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session with freshly computed statistics.
    async fn get(&self, session_id: &str) -> Result<Session, SessionError>;
}
