// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Agent runner seam.
//!
//! The chat controller drives an [`AgentRunner`] to process a user turn and
//! consults it before rewinding: a session with a turn in flight must not be
//! truncated underneath the agent.
//!
//! [`ActiveRuns`] is the bookkeeping shared by runner implementations, and
//! [`RecordingAgent`] is a runner that only records the user turn in the
//! session transcript.

mod recording;
mod runs;

pub use recording::RecordingAgent;
pub use runs::{ActiveRuns, RunHandle};

use async_trait::async_trait;

use crate::error::AgentError;
use crate::types::Attachment;

/// Something that can process a user turn for a session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Process one user turn. Returns once the turn has finished.
    async fn run(
        &self,
        session_id: &str,
        text: &str,
        attachments: Vec<Attachment>,
    ) -> Result<(), AgentError>;

    /// Whether a turn is currently in flight for the session.
    fn is_busy(&self, session_id: &str) -> bool;

    /// Request cancellation of the session's in-flight turn, if any.
    fn cancel(&self, session_id: &str);
}
