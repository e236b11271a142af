// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Hindsight - conditional context injection and conversation rewind.
//!
//! Two features of a coding assistant's chat loop, usable on their own:
//! microagents, markdown snippets appended to a prompt when a trigger
//! expression matches it, and rewind, which truncates a persisted session
//! back to one of the user's earlier messages.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`types`] - Core type definitions (Role, Attachment)
//! - [`error`] - Error types and result aliases
//! - [`config`] - Configuration loading and merging
//! - [`telemetry`] - Tracing and metrics infrastructure
//! - [`microagent`] - Trigger expressions, microagent parsing and the registry
//! - [`session`] - SQLite session persistence and the store contracts
//! - [`rewind`] - The rewind coordinator and its candidate filter
//! - [`agent`] - The agent runner seam
//! - [`chat`] - The chat controller tying the pieces to an active session
//!
//! # Example
//!
//! ```rust,ignore
//! use hindsight::microagent::{compose_prompt, MicroagentRegistry};
//!
//! let registry = MicroagentRegistry::load(project_root)?;
//! let prompt = compose_prompt(text, &registry.find(text));
//! ```

pub mod agent;
pub mod chat;
pub mod config;
pub mod error;
pub mod microagent;
pub mod rewind;
pub mod session;
pub mod telemetry;
pub mod types;

// Re-export commonly used types at crate root
pub use chat::{ActiveSession, ChatController};
pub use error::{AgentError, ConfigError, LoadError, Result, RewindError, SessionError};
pub use microagent::{evaluate, Microagent, MicroagentRegistry, TriggerExpression};
pub use rewind::{rewind_candidates, RewindCoordinator, SessionSink};
pub use session::{Message, MessageStore, Session, SessionService, SessionStore};
pub use types::{Attachment, Role};

/// Hindsight version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
