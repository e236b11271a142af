// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration loading from files.
//!
//! Handles loading configuration from JSON and YAML files in various locations.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::types::WorkspaceConfig;

/// Config file names to search for (in order).
pub const CONFIG_FILES: &[&str] = &[
    ".hindsight.json",
    ".hindsight/config.json",
    "hindsight.config.yaml",
];

/// Local config file name (for per-directory overrides).
pub const LOCAL_CONFIG_FILE: &str = ".hindsight.local.json";

/// Global config directory name.
pub const GLOBAL_CONFIG_DIR: &str = ".hindsight";

/// Global config file name.
pub const GLOBAL_CONFIG_FILE: &str = "config.json";

/// Default session database file name inside the global config directory.
pub const SESSIONS_DB_FILE: &str = "sessions.db";

/// Get the global config directory path.
pub fn get_global_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(GLOBAL_CONFIG_DIR))
}

/// Get the global config file path.
pub fn get_global_config_path() -> Option<PathBuf> {
    get_global_config_dir().map(|dir| dir.join(GLOBAL_CONFIG_FILE))
}

/// Default location of the session database (~/.hindsight/sessions.db).
pub fn default_sessions_db_path() -> Option<PathBuf> {
    get_global_config_dir().map(|dir| dir.join(SESSIONS_DB_FILE))
}

/// Load global configuration from ~/.hindsight/config.json.
pub fn load_global_config() -> Result<Option<WorkspaceConfig>, ConfigError> {
    let path = match get_global_config_path() {
        Some(p) => p,
        None => return Ok(None),
    };

    if !path.exists() {
        return Ok(None);
    }

    load_config_file(&path).map(Some)
}

/// Load workspace configuration from the workspace root.
///
/// The first file of [`CONFIG_FILES`] that exists wins.
pub fn load_workspace_config(workspace_root: &Path) -> Result<Option<WorkspaceConfig>, ConfigError> {
    for filename in CONFIG_FILES {
        let path = workspace_root.join(filename);
        if path.is_file() {
            return load_config_file(&path).map(Some);
        }
    }
    Ok(None)
}

/// Load local configuration from .hindsight.local.json.
pub fn load_local_config(workspace_root: &Path) -> Result<Option<WorkspaceConfig>, ConfigError> {
    let path = workspace_root.join(LOCAL_CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}

/// Load a configuration file (JSON or YAML, chosen by extension).
pub fn load_config_file(path: &Path) -> Result<WorkspaceConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content).map_err(ConfigError::from),
        _ => serde_json::from_str(&content).map_err(ConfigError::from),
    }
}

/// Find the workspace root by searching for config files or a microagent directory.
///
/// Walks up the directory tree from `start`; returns `None` at the filesystem root.
pub fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let has_config = CONFIG_FILES.iter().any(|f| current.join(f).is_file());
        if has_config || current.join(crate::microagent::MICROAGENT_DIR).is_dir() {
            return Some(current);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_json_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".hindsight.json");
        std::fs::write(&path, r#"{"rewindTimeoutMs": 100}"#).unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.rewind_timeout_ms, Some(100));
    }

    #[test]
    fn test_load_yaml_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("hindsight.config.yaml"),
            "microagents: false\nlogLevel: debug\n",
        )
        .unwrap();

        let config = load_workspace_config(temp.path()).unwrap().unwrap();
        assert_eq!(config.microagents, Some(false));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_workspace_config_precedence_of_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".hindsight.json"), r#"{"logLevel": "info"}"#).unwrap();
        std::fs::write(temp.path().join("hindsight.config.yaml"), "logLevel: trace\n").unwrap();

        let config = load_workspace_config(temp.path()).unwrap().unwrap();
        assert_eq!(config.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn test_missing_configs_are_none() {
        let temp = TempDir::new().unwrap();
        assert!(load_workspace_config(temp.path()).unwrap().is_none());
        assert!(load_local_config(temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_json_is_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(LOCAL_CONFIG_FILE), "{not json").unwrap();

        let err = load_local_config(temp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_find_workspace_root_by_microagent_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join(crate::microagent::MICROAGENT_DIR)).unwrap();
        let nested = temp.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();

        let root = find_workspace_root(&nested).unwrap();
        assert_eq!(root, temp.path());
    }
}
