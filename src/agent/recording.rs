// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Runner that records user turns without contacting a model.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::session::{Message, SessionService};
use crate::types::Attachment;

use super::{ActiveRuns, AgentRunner};

/// Appends each user turn to the session transcript and finishes immediately.
///
/// Used by the command line to build up history that can later be rewound.
pub struct RecordingAgent {
    sessions: SessionService,
    runs: ActiveRuns,
}

impl RecordingAgent {
    pub fn new(sessions: SessionService) -> Self {
        Self {
            sessions,
            runs: ActiveRuns::new(),
        }
    }
}

#[async_trait]
impl AgentRunner for RecordingAgent {
    async fn run(
        &self,
        session_id: &str,
        text: &str,
        attachments: Vec<Attachment>,
    ) -> Result<(), AgentError> {
        let handle = self.runs.begin(session_id)?;

        if !attachments.is_empty() {
            tracing::debug!(
                session_id,
                count = attachments.len(),
                "attachments are not stored in the transcript"
            );
        }

        if handle.token().is_cancelled() {
            return Err(AgentError::Failed("turn cancelled".to_string()));
        }

        self.sessions
            .add_message(&Message::user(session_id, text))
            .await?;

        tracing::info!(session_id, chars = text.len(), "user turn recorded");
        Ok(())
    }

    fn is_busy(&self, session_id: &str) -> bool {
        self.runs.is_busy(session_id)
    }

    fn cancel(&self, session_id: &str) {
        self.runs.cancel(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStorage;
    use crate::types::Role;

    #[tokio::test]
    async fn test_run_records_user_message() {
        let sessions = SessionService::with_storage(SessionStorage::open_in_memory().unwrap());
        let session = sessions
            .create("New Session".to_string(), "/p".to_string())
            .await
            .unwrap();
        let agent = RecordingAgent::new(sessions.clone());

        agent.run(&session.id, "hello", Vec::new()).await.unwrap();

        let messages = sessions.messages(&session.id).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hello");
        assert!(!agent.is_busy(&session.id));
    }

    #[tokio::test]
    async fn test_run_on_missing_session_fails() {
        let sessions = SessionService::with_storage(SessionStorage::open_in_memory().unwrap());
        let agent = RecordingAgent::new(sessions);

        let err = agent.run("ghost", "hello", Vec::new()).await.unwrap_err();
        assert!(matches!(err, AgentError::Session(_)));
    }
}
