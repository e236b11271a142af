// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session types for conversation persistence.

use serde::{Deserialize, Serialize};

use crate::types::Role;

/// Session identifier.
pub type SessionId = String;

/// Message identifier.
pub type MessageId = String;

/// Aggregate statistics derived from a session's messages.
///
/// Always computed by the store from the messages that currently exist;
/// never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Number of messages in the session.
    pub message_count: u32,
    /// Number of user-authored messages.
    pub user_message_count: u32,
    /// Total prompt tokens used.
    pub prompt_tokens: u64,
    /// Total completion tokens used.
    pub completion_tokens: u64,
    /// Total cost in USD.
    pub cost: f64,
}

impl SessionStats {
    /// Get total tokens used.
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A saved conversation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// Session title.
    pub title: String,
    /// Project path where the session was created.
    pub project_path: String,
    /// Statistics over the session's messages.
    pub stats: SessionStats,
    /// Creation timestamp (Unix epoch milliseconds).
    pub created_at: i64,
    /// Last update timestamp (Unix epoch milliseconds).
    pub updated_at: i64,
}

impl Session {
    /// Create a new, empty session.
    pub fn new(id: SessionId, title: String, project_path: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id,
            title,
            project_path,
            stats: SessionStats::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Generate a unique session ID based on timestamp and UUID.
    pub fn generate_id() -> SessionId {
        let now = chrono::Utc::now();
        let short_uuid = &uuid::Uuid::new_v4().to_string()[..8];
        format!("session-{}-{}", now.format("%Y-%m-%d-%H-%M-%S"), short_uuid)
    }

    /// Format the session for a one-line listing.
    pub fn format(&self) -> String {
        let date = chrono::DateTime::from_timestamp_millis(self.updated_at)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let mut display = format!("{} ({} msgs", self.title, self.stats.message_count);
        if self.stats.total_tokens() > 0 {
            display.push_str(&format!(", {} tokens", self.stats.total_tokens()));
        }
        display.push(')');
        display.push_str(&format!(" - {}", date));
        display
    }
}

/// A message stored in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID.
    pub id: MessageId,
    /// Session this message belongs to.
    pub session_id: SessionId,
    /// Message role.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
    /// Prompt tokens billed for producing this message.
    pub prompt_tokens: u64,
    /// Completion tokens billed for producing this message.
    pub completion_tokens: u64,
    /// Cost in USD of producing this message.
    pub cost: f64,
    /// Creation timestamp (Unix epoch milliseconds).
    pub created_at: i64,
}

impl Message {
    /// Create a new message without usage.
    pub fn new(session_id: impl Into<SessionId>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            role,
            content: content.into(),
            prompt_tokens: 0,
            completion_tokens: 0,
            cost: 0.0,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn user(session_id: impl Into<SessionId>, content: impl Into<String>) -> Self {
        Self::new(session_id, Role::User, content)
    }

    pub fn assistant(session_id: impl Into<SessionId>, content: impl Into<String>) -> Self {
        Self::new(session_id, Role::Assistant, content)
    }

    /// Attach token usage and cost.
    pub fn with_usage(mut self, prompt_tokens: u64, completion_tokens: u64, cost: f64) -> Self {
        self.prompt_tokens = prompt_tokens;
        self.completion_tokens = completion_tokens;
        self.cost = cost;
        self
    }

    /// Whether a user may rewind the conversation to this message.
    pub fn is_rewind_candidate(&self) -> bool {
        self.role == Role::User && !self.content.trim().is_empty()
    }

    /// First line of the content, truncated to `max_chars` characters.
    pub fn preview(&self, max_chars: usize) -> String {
        let first_line = self.content.trim().lines().next().unwrap_or("");
        if first_line.chars().count() <= max_chars {
            return first_line.to_string();
        }
        let truncated: String = first_line.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}
