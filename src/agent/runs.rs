// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-session bookkeeping of in-flight agent turns.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::error::AgentError;

/// Tracks which sessions have a turn in flight, with a cancellation token each.
#[derive(Debug, Default)]
pub struct ActiveRuns {
    runs: Mutex<HashMap<String, CancellationToken>>,
}

impl ActiveRuns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a turn for the session. Fails with `Busy` if one is already running.
    ///
    /// The turn stays registered until the returned handle is dropped.
    pub fn begin(&self, session_id: &str) -> Result<RunHandle<'_>, AgentError> {
        let mut runs = self.lock();
        if runs.contains_key(session_id) {
            return Err(AgentError::Busy(session_id.to_string()));
        }

        let token = CancellationToken::new();
        runs.insert(session_id.to_string(), token.clone());
        Ok(RunHandle {
            runs: self,
            session_id: session_id.to_string(),
            token,
        })
    }

    pub fn is_busy(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    /// Cancel the session's turn. Returns false when nothing was running.
    pub fn cancel(&self, session_id: &str) -> bool {
        match self.lock().get(session_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registration of one in-flight turn.
pub struct RunHandle<'a> {
    runs: &'a ActiveRuns,
    session_id: String,
    token: CancellationToken,
}

impl RunHandle<'_> {
    /// Token cancelled by [`ActiveRuns::cancel`].
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for RunHandle<'_> {
    fn drop(&mut self) {
        self.runs.lock().remove(&self.session_id);
    }
}
