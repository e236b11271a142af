// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging.
//!
//! Handles merging configurations from different sources with proper precedence.

use std::path::PathBuf;

use super::types::{ResolvedConfig, WorkspaceConfig};

/// CLI options that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub sessions_db: Option<PathBuf>,
    pub rewind_timeout_ms: Option<u64>,
    pub no_microagents: bool,
}

/// Default configuration values.
pub fn default_config() -> ResolvedConfig {
    ResolvedConfig::default()
}

/// Merge multiple configurations with precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI options
/// 2. Local config (.hindsight.local.json)
/// 3. Workspace config (.hindsight.json)
/// 4. Global config (~/.hindsight/config.json)
/// 5. Default values
pub fn merge_config(
    global: Option<WorkspaceConfig>,
    workspace: Option<WorkspaceConfig>,
    local: Option<WorkspaceConfig>,
    cli: CliOptions,
) -> ResolvedConfig {
    let mut result = default_config();

    for config in [global, workspace, local].into_iter().flatten() {
        apply_workspace_config(&mut result, &config);
    }

    apply_cli_options(&mut result, &cli);

    result
}

fn apply_workspace_config(result: &mut ResolvedConfig, config: &WorkspaceConfig) {
    if let Some(ref db) = config.sessions_db {
        result.sessions_db = Some(expand_home(db));
    }

    if let Some(timeout) = config.rewind_timeout_ms {
        result.rewind_timeout_ms = timeout_or_unbounded(timeout);
    }

    if let Some(enabled) = config.microagents {
        result.microagents_enabled = enabled;
    }

    if config.log_level.is_some() {
        result.log_level = config.log_level.clone();
    }
}

fn apply_cli_options(result: &mut ResolvedConfig, cli: &CliOptions) {
    if cli.sessions_db.is_some() {
        result.sessions_db = cli.sessions_db.clone();
    }

    if let Some(timeout) = cli.rewind_timeout_ms {
        result.rewind_timeout_ms = timeout_or_unbounded(timeout);
    }

    if cli.no_microagents {
        result.microagents_enabled = false;
    }
}

fn timeout_or_unbounded(ms: u64) -> Option<u64> {
    (ms > 0).then_some(ms)
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
