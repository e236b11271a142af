// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session persistence: sessions, their messages, and the store contracts.
//!
//! - **Types**: Session, SessionStats, Message
//! - **Storage**: SQLite persistence; statistics are aggregated in SQL on read
//! - **Store**: `MessageStore` / `SessionStore` traits consumed by the rewind flow
//! - **Service**: async facade that implements both traits
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                 SessionService                    │
//! │   (impl MessageStore + SessionStore, async API)   │
//! └───────────────────────────────────────────────────┘
//!                          │ tokio::sync::Mutex
//!                          ▼
//!               ┌─────────────────────┐
//!               │   SessionStorage    │
//!               │     (SQLite DB)     │
//!               └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use hindsight::session::{Message, SessionService};
//!
//! let service = SessionService::open(&db_path)?;
//! let session = service.create("My Session".to_string(), "/project".to_string()).await?;
//! service.add_message(&Message::user(session.id.clone(), "Hello!")).await?;
//! let messages = service.messages(&session.id).await?;
//! ```

pub mod service;
pub mod storage;
pub mod store;
pub mod types;

pub use service::SessionService;
pub use storage::{SessionStorage, SCHEMA_VERSION};
pub use store::{MessageStore, SessionStore};
pub use types::{Message, MessageId, Session, SessionId, SessionStats};
