// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Microagent registry: an immutable snapshot of the microagents found on disk.

use std::path::{Path, PathBuf};
#[cfg(feature = "telemetry")]
use std::time::Instant;

use walkdir::WalkDir;

use crate::error::LoadError;

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use super::parser::parse_microagent;
use super::types::Microagent;
use super::MICROAGENT_DIR;

const MARKDOWN_EXTENSION: &str = "md";

/// Ordered, read-only collection of microagents.
///
/// Built once and shared by `Arc`; picking up changed files means building a
/// new registry.
#[derive(Debug, Clone, Default)]
pub struct MicroagentRegistry {
    agents: Vec<Microagent>,
    root: Option<PathBuf>,
}

impl MicroagentRegistry {
    /// Create a registry from already-parsed microagents.
    pub fn new(agents: Vec<Microagent>) -> Self {
        Self { agents, root: None }
    }

    /// Load the microagents of a project from `<project_root>/.hindsight/microagents`.
    pub fn load(project_root: &Path) -> Result<Self, LoadError> {
        Self::from_dir(&project_root.join(MICROAGENT_DIR))
    }

    /// Load every `.md` file under `dir`, recursively, in file-name order.
    ///
    /// A missing directory yields an empty registry. Any unreadable file or
    /// invalid metadata block aborts the whole load.
    #[cfg_attr(feature = "telemetry", tracing::instrument(skip_all, fields(dir = %dir.display())))]
    pub fn from_dir(dir: &Path) -> Result<Self, LoadError> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        match std::fs::metadata(dir) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %dir.display(), "microagent directory not found; registry is empty");
                return Ok(Self {
                    agents: Vec::new(),
                    root: Some(dir.to_path_buf()),
                });
            }
            Err(e) => {
                return Err(LoadError::Walk {
                    path: dir.to_path_buf(),
                    message: e.to_string(),
                })
            }
        }

        let mut agents = Vec::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| LoadError::Walk {
                path: e.path().unwrap_or(dir).to_path_buf(),
                message: e.to_string(),
            })?;

            if entry.file_type().is_dir() || !is_markdown(entry.path()) {
                continue;
            }

            let path = entry.path();
            let content = std::fs::read_to_string(path).map_err(|e| LoadError::Read {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

            let agent = parse_microagent(path, &content)?;
            tracing::debug!(
                path = %path.display(),
                name = %agent.name(),
                triggers = %agent.triggers(),
                "loaded microagent"
            );
            agents.push(agent);
        }

        tracing::info!(dir = %dir.display(), count = agents.len(), "microagents loaded");

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("microagent.load", start.elapsed());

        Ok(Self {
            agents,
            root: Some(dir.to_path_buf()),
        })
    }

    /// Every microagent whose trigger matches the prompt, in load order.
    pub fn find(&self, prompt: &str) -> Vec<&Microagent> {
        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        let matched: Vec<&Microagent> = self.agents.iter().filter(|a| a.matches(prompt)).collect();

        tracing::trace!(
            prompt_len = prompt.len(),
            matched = matched.len(),
            "microagent lookup"
        );

        #[cfg(feature = "telemetry")]
        {
            GLOBAL_METRICS.record_operation("microagent.find", start.elapsed());
            GLOBAL_METRICS.record_matches(matched.len());
        }

        matched
    }

    /// Directory this registry was loaded from, if any.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Microagent> {
        self.agents.iter()
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MARKDOWN_EXTENSION)
}
