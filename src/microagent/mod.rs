// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Microagents: markdown snippets injected as context when a prompt triggers them.
//!
//! - **Trigger**: boolean expression tree over substring tests
//! - **Parser**: splits a file into YAML metadata and markdown body
//! - **Registry**: loads a project's microagents once and answers `find(prompt)`
//! - **Context**: renders matched microagents into the outgoing prompt
//!
//! # Example
//!
//! ```rust,ignore
//! use hindsight::microagent::{compose_prompt, MicroagentRegistry};
//!
//! let registry = MicroagentRegistry::load(project_root)?;
//! let matched = registry.find("please deploy now");
//! let prompt = compose_prompt("please deploy now", &matched);
//! ```

pub mod context;
pub mod parser;
pub mod registry;
pub mod trigger;
pub mod types;

pub use context::compose_prompt;
pub use parser::{parse_microagent, split_frontmatter};
pub use registry::MicroagentRegistry;
pub use trigger::{evaluate, TriggerExpression, TriggerNode};
pub use types::{Frontmatter, Microagent};

/// Project-relative directory scanned for microagent files.
pub const MICROAGENT_DIR: &str = ".hindsight/microagents";
