// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! Defines the structure of workspace and resolved configuration,
//! supporting JSON and YAML formats.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default bound on the store calls made by a rewind.
pub const DEFAULT_REWIND_TIMEOUT_MS: u64 = 10_000;

/// Workspace configuration for hindsight.
/// Can be defined in .hindsight.json or .hindsight/config.json in the project root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceConfig {
    /// Path to the SQLite session database
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_db: Option<String>,

    /// Upper bound in milliseconds for the store calls of a rewind (0 disables the bound)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewind_timeout_ms: Option<u64>,

    /// Whether matched microagents are injected into prompts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub microagents: Option<bool>,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Fully resolved configuration after merging all sources.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Explicit session database path; `None` means the default location.
    pub sessions_db: Option<PathBuf>,
    /// Rewind bound in milliseconds; `None` means unbounded.
    pub rewind_timeout_ms: Option<u64>,
    pub microagents_enabled: bool,
    pub log_level: Option<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            sessions_db: None,
            rewind_timeout_ms: Some(DEFAULT_REWIND_TIMEOUT_MS),
            microagents_enabled: true,
            log_level: None,
        }
    }
}

impl ResolvedConfig {
    /// Rewind timeout as a duration, if bounded.
    pub fn rewind_timeout(&self) -> Option<Duration> {
        self.rewind_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_config_camel_case() {
        let config: WorkspaceConfig = serde_json::from_str(
            r#"{"sessionsDb": "/tmp/s.db", "rewindTimeoutMs": 250, "microagents": false}"#,
        )
        .unwrap();
        assert_eq!(config.sessions_db.as_deref(), Some("/tmp/s.db"));
        assert_eq!(config.rewind_timeout_ms, Some(250));
        assert_eq!(config.microagents, Some(false));
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_workspace_config_skips_unset_fields() {
        let json = serde_json::to_string(&WorkspaceConfig::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_resolved_defaults() {
        let config = ResolvedConfig::default();
        assert!(config.microagents_enabled);
        assert_eq!(config.rewind_timeout(), Some(Duration::from_millis(DEFAULT_REWIND_TIMEOUT_MS)));
    }
}
