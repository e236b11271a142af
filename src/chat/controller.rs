// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Chat controller: sending turns, cancelling them, and rewinding history.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::agent::AgentRunner;
use crate::config::ResolvedConfig;
use crate::error::{AgentError, RewindError, SessionError};
use crate::microagent::{compose_prompt, MicroagentRegistry};
use crate::rewind::{rewind_candidates, RewindCoordinator};
use crate::session::{Message, Session, SessionService};
use crate::types::Attachment;

use super::state::ActiveSession;

/// Title given to sessions created implicitly by the first message.
pub const DEFAULT_SESSION_TITLE: &str = "New Session";

/// Coordinates the active session with the agent, the microagents and the rewind flow.
pub struct ChatController {
    sessions: SessionService,
    agent: Arc<dyn AgentRunner>,
    microagents: Arc<MicroagentRegistry>,
    rewind: RewindCoordinator,
    active: ActiveSession,
    project_path: String,
    inject_microagents: bool,
}

impl ChatController {
    pub fn new(
        sessions: SessionService,
        agent: Arc<dyn AgentRunner>,
        microagents: Arc<MicroagentRegistry>,
        config: &ResolvedConfig,
        project_path: impl Into<String>,
    ) -> Self {
        let store = Arc::new(sessions.clone());
        let rewind = RewindCoordinator::new(store.clone(), store).with_timeout(config.rewind_timeout());

        Self {
            sessions,
            agent,
            microagents,
            rewind,
            active: ActiveSession::new(),
            project_path: project_path.into(),
            inject_microagents: config.microagents_enabled,
        }
    }

    pub fn active(&self) -> &ActiveSession {
        &self.active
    }

    /// Make an existing session the active one.
    pub async fn open_session(&self, session_id: &str) -> Result<Session, AgentError> {
        let session = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        self.active.set(Some(session.clone()));
        Ok(session)
    }

    /// Clear the active session; the next message starts a new one.
    pub fn new_session(&self) {
        self.active.set(None);
    }

    /// Send a user turn, creating a session first if none is active.
    pub async fn send_message(
        &self,
        text: &str,
        attachments: Vec<Attachment>,
    ) -> Result<Session, AgentError> {
        let session = match self.active.current() {
            Some(session) => session,
            None => {
                let session = self
                    .sessions
                    .create(DEFAULT_SESSION_TITLE.to_string(), self.project_path.clone())
                    .await?;
                self.active.set(Some(session.clone()));
                session
            }
        };

        if self.agent.is_busy(&session.id) {
            return Err(AgentError::Busy(session.id));
        }

        let prompt = self.prepare_prompt(text);
        self.agent.run(&session.id, &prompt, attachments).await?;

        // Pick up whatever the turn appended.
        let refreshed = self.sessions.get(&session.id).await?.unwrap_or(session);
        self.active.set(Some(refreshed.clone()));
        Ok(refreshed)
    }

    /// The prompt the agent receives: the user's text plus any triggered microagents.
    pub fn prepare_prompt(&self, text: &str) -> String {
        if !self.inject_microagents {
            return text.to_string();
        }

        let matched = self.microagents.find(text);
        if !matched.is_empty() {
            info!(
                count = matched.len(),
                names = ?matched.iter().map(|a| a.name()).collect::<Vec<_>>(),
                "microagents triggered"
            );
        }
        compose_prompt(text, &matched)
    }

    /// Cancel the active session's in-flight turn.
    pub fn cancel(&self) -> Result<(), AgentError> {
        let session_id = self.active.id().ok_or(AgentError::NoActiveSession)?;
        debug!(session_id = %session_id, "cancelling agent turn");
        self.agent.cancel(&session_id);
        Ok(())
    }

    /// Messages of the active session the user may rewind to.
    pub async fn rewind_candidates(&self) -> Result<Vec<Message>, AgentError> {
        let Some(session_id) = self.active.id() else {
            return Ok(Vec::new());
        };
        let messages = self.sessions.messages(&session_id).await?;
        Ok(rewind_candidates(&messages).into_iter().cloned().collect())
    }

    /// Rewind the active session to `message_id`, dropping it and everything after.
    ///
    /// Refused while the agent is working on the session.
    pub async fn rewind(
        &self,
        message_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Session, RewindError> {
        let session_id = self.active.id().ok_or(RewindError::NoActiveSession)?;
        if self.agent.is_busy(&session_id) {
            return Err(RewindError::AgentBusy(session_id));
        }

        self.rewind
            .rewind_to(&session_id, message_id, cancel, &self.active)
            .await
    }
}
