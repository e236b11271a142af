// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session rewind: drop a user message and everything after it.
//!
//! ```text
//!   rewind_to(session, message)
//!        │
//!        ├─ 1. MessageStore::list            locate target, must be a user message
//!        ├─ 2. MessageStore::delete_from_id  one transaction in the store
//!        ├─ 3. SessionStore::get             stats from the store of record
//!        └─ 4. SessionSink::publish          dependent view sees the new session
//! ```
//!
//! Steps 1-3 race a `CancellationToken` and an optional timeout. Nothing is
//! published unless all three succeed.

mod candidates;
mod coordinator;

pub use candidates::rewind_candidates;
pub use coordinator::RewindCoordinator;

use crate::session::Session;

/// Receives the refreshed session after a successful rewind.
pub trait SessionSink: Send + Sync {
    fn publish(&self, session: &Session);
}
