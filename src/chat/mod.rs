// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Chat orchestration around the active session.
//!
//! [`ChatController`] owns the active session, routes user turns to the
//! [`AgentRunner`](crate::agent::AgentRunner) with triggered microagents
//! appended, and gates rewinds on the agent being idle. Views follow the
//! active session through [`ActiveSession::subscribe`].

mod controller;
mod state;

pub use controller::{ChatController, DEFAULT_SESSION_TITLE};
pub use state::ActiveSession;
