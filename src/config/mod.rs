// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for hindsight.
//!
//! Handles loading, merging, and validation of configuration from multiple sources:
//! - Global config: ~/.hindsight/config.json
//! - Workspace config: .hindsight.json, .hindsight/config.json, or hindsight.config.yaml
//! - Local config: .hindsight.local.json (gitignored, for personal overrides)
//! - CLI options: command-line arguments
//!
//! Configuration is merged with precedence (CLI > local > workspace > global > defaults).

mod loader;
mod merger;
mod types;

// Re-export public types
pub use loader::{
    default_sessions_db_path, find_workspace_root, get_global_config_dir, get_global_config_path,
    load_config_file, load_global_config, load_local_config, load_workspace_config, CONFIG_FILES,
    GLOBAL_CONFIG_DIR, GLOBAL_CONFIG_FILE, LOCAL_CONFIG_FILE, SESSIONS_DB_FILE,
};

pub use merger::{default_config, merge_config, CliOptions};

pub use types::{ResolvedConfig, WorkspaceConfig, DEFAULT_REWIND_TIMEOUT_MS};

use crate::error::ConfigError;
use std::path::Path;

/// Load and merge all configuration sources for a workspace.
///
/// This is the main entry point for configuration loading.
pub fn load_config(
    workspace_root: &Path,
    cli_options: CliOptions,
) -> Result<ResolvedConfig, ConfigError> {
    let global = load_global_config()?;
    let workspace = load_workspace_config(workspace_root)?;
    let local = load_local_config(workspace_root)?;

    Ok(merge_config(global, workspace, local, cli_options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_with_workspace_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".hindsight.json"),
            r#"{"sessionsDb": "/tmp/hindsight-test.db"}"#,
        )
        .unwrap();

        let config = load_config(temp.path(), CliOptions::default()).unwrap();
        assert_eq!(
            config.sessions_db,
            Some(std::path::PathBuf::from("/tmp/hindsight-test.db"))
        );
    }

    #[test]
    fn test_load_config_local_overrides_workspace() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".hindsight.json"), r#"{"microagents": true}"#).unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_FILE), r#"{"microagents": false}"#).unwrap();

        let config = load_config(temp.path(), CliOptions::default()).unwrap();
        assert!(!config.microagents_enabled);
    }

    #[test]
    fn test_load_config_cli_override() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".hindsight.json"), r#"{"rewindTimeoutMs": 500}"#).unwrap();

        let cli = CliOptions {
            rewind_timeout_ms: Some(50),
            ..Default::default()
        };

        let config = load_config(temp.path(), cli).unwrap();
        assert_eq!(config.rewind_timeout_ms, Some(50));
    }
}
