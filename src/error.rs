// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for hindsight.
//!
//! This module provides strongly-typed errors for each subsystem,
//! using `thiserror` for ergonomic error definitions and `anyhow` for error propagation
//! at the binary edge.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while loading microagent definitions.
///
/// Loading is fail-fast: the first error aborts construction of the whole registry.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to scan microagent directory {}: {message}", .path.display())]
    Walk { path: PathBuf, message: String },

    #[error("Failed to read microagent {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("Invalid microagent metadata in {}: {message}", .path.display())]
    Metadata { path: PathBuf, message: String },
}

impl LoadError {
    /// Path of the file or directory that caused the failure.
    pub fn path(&self) -> &Path {
        match self {
            Self::Walk { path, .. } | Self::Read { path, .. } | Self::Metadata { path, .. } => path,
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid config format: {0}")]
    InvalidFormat(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Errors raised by the session and message stores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Message {message_id} not found in session {session_id}")]
    MessageNotFound {
        session_id: String,
        message_id: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl SessionError {
    /// Wrap a storage failure with a short description of the attempted operation.
    pub fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{}: {}", context, err))
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

/// The step of a rewind that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewindStage {
    /// Listing the session's messages to locate the target.
    Locate,
    /// Deleting the message suffix.
    Delete,
    /// Re-fetching the session from the store of record.
    Refresh,
}

impl std::fmt::Display for RewindStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Locate => write!(f, "locate"),
            Self::Delete => write!(f, "delete"),
            Self::Refresh => write!(f, "refresh"),
        }
    }
}

/// Errors that can occur while rewinding a session.
///
/// None of these are retried, and partial store state is not rolled back here.
#[derive(Error, Debug)]
pub enum RewindError {
    #[error("Message {message_id} not found in session {session_id}")]
    MessageNotFound {
        session_id: String,
        message_id: String,
    },

    #[error("Message {0} was not written by the user; only user messages can be rewound to")]
    NotUserMessage(String),

    #[error("Agent is busy in session {0}; wait or cancel before rewinding")]
    AgentBusy(String),

    #[error("A rewind is already in progress for session {0}")]
    InProgress(String),

    #[error("No active session to rewind")]
    NoActiveSession,

    #[error("Rewind cancelled during {stage}")]
    Cancelled { stage: RewindStage },

    #[error("Rewind timed out during {stage} after {timeout_ms}ms")]
    TimedOut { stage: RewindStage, timeout_ms: u64 },

    #[error("Rewind failed during {stage}: {source}")]
    Store {
        stage: RewindStage,
        #[source]
        source: SessionError,
    },
}

impl RewindError {
    /// Whether the suffix deletion had already been committed when the rewind failed.
    ///
    /// The caller's in-memory session is stale in that case and should be reloaded.
    pub fn history_truncated(&self) -> bool {
        matches!(
            self,
            Self::Store {
                stage: RewindStage::Refresh,
                ..
            } | Self::Cancelled {
                stage: RewindStage::Refresh
            } | Self::TimedOut {
                stage: RewindStage::Refresh,
                ..
            }
        )
    }
}

/// Errors that can occur when driving the agent.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Agent is busy in session {0}")]
    Busy(String),

    #[error("Agent run failed: {0}")]
    Failed(String),

    #[error("No active session")]
    NoActiveSession,

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;

/// Convert any error type that implements std::error::Error to an anyhow::Error.
pub fn to_anyhow<E: std::error::Error + Send + Sync + 'static>(err: E) -> anyhow::Error {
    anyhow::Error::new(err)
}
