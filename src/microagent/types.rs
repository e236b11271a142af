// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Microagent types.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::trigger::TriggerExpression;

/// Metadata block at the top of a microagent file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Frontmatter {
    /// Condition deciding when the microagent applies.
    #[serde(default)]
    pub triggers: TriggerExpression,
    /// Optional display name; the file stem is used otherwise.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional one-line description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A context snippet loaded from a markdown file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Microagent {
    pub frontmatter: Frontmatter,
    /// Markdown body injected as context when triggered.
    pub content: String,
    /// File the microagent was loaded from.
    pub source_path: PathBuf,
}

impl Microagent {
    pub fn new(frontmatter: Frontmatter, content: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            frontmatter,
            content: content.into(),
            source_path: source_path.into(),
        }
    }

    /// Display name: the declared name, else the file stem.
    pub fn name(&self) -> String {
        if let Some(ref name) = self.frontmatter.name {
            return name.clone();
        }
        self.source_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }

    pub fn triggers(&self) -> &TriggerExpression {
        &self.frontmatter.triggers
    }

    /// Whether this microagent applies to the prompt.
    pub fn matches(&self, prompt: &str) -> bool {
        self.frontmatter.triggers.matches(prompt)
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }
}
