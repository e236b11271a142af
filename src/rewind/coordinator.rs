// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Truncating a session back to one of the user's earlier messages.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
#[cfg(feature = "telemetry")]
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{RewindError, RewindStage, SessionError};
use crate::session::{MessageStore, Session, SessionStore};
use crate::types::Role;

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use super::SessionSink;

/// Runs the locate → delete → refresh → publish sequence of a rewind.
pub struct RewindCoordinator {
    messages: Arc<dyn MessageStore>,
    sessions: Arc<dyn SessionStore>,
    timeout: Option<Duration>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl RewindCoordinator {
    pub fn new(messages: Arc<dyn MessageStore>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            messages,
            sessions,
            timeout: None,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Bound each store call by `timeout`; `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether a rewind of the session is currently running.
    pub fn is_rewinding(&self, session_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(session_id)
    }

    /// Delete `message_id` and everything after it, then publish the refreshed session.
    ///
    /// The target must be a user message of the session. The store calls run
    /// under `cancel` and the configured timeout; on any failure nothing is
    /// published and no rollback is attempted.
    #[tracing::instrument(skip(self, cancel, sink))]
    pub async fn rewind_to(
        &self,
        session_id: &str,
        message_id: &str,
        cancel: &CancellationToken,
        sink: &dyn SessionSink,
    ) -> Result<Session, RewindError> {
        let _guard = RewindGuard::acquire(&self.in_flight, session_id)?;

        #[cfg(feature = "telemetry")]
        let start = Instant::now();

        info!("rewind started");
        let result = self.truncate(session_id, message_id, cancel).await;

        #[cfg(feature = "telemetry")]
        {
            GLOBAL_METRICS.record_operation("rewind.rewind_to", start.elapsed());
            GLOBAL_METRICS.record_rewind(
                result.is_ok(),
                result.as_ref().map(|(_, deleted)| *deleted).unwrap_or(0),
            );
        }

        match result {
            Ok((session, deleted)) => {
                info!(
                    deleted,
                    remaining = session.stats.message_count,
                    "rewind finished"
                );
                sink.publish(&session);
                Ok(session)
            }
            Err(e) => {
                warn!(error = %e, history_truncated = e.history_truncated(), "rewind failed");
                Err(e)
            }
        }
    }

    async fn truncate(
        &self,
        session_id: &str,
        message_id: &str,
        cancel: &CancellationToken,
    ) -> Result<(Session, u32), RewindError> {
        let messages = self
            .bounded(RewindStage::Locate, cancel, self.messages.list(session_id))
            .await?;

        let target = messages
            .iter()
            .find(|m| m.id == message_id)
            .ok_or_else(|| RewindError::MessageNotFound {
                session_id: session_id.to_string(),
                message_id: message_id.to_string(),
            })?;
        if target.role != Role::User {
            return Err(RewindError::NotUserMessage(message_id.to_string()));
        }

        let deleted = self
            .bounded(
                RewindStage::Delete,
                cancel,
                self.messages.delete_from_id(session_id, message_id),
            )
            .await
            .map_err(|e| match e {
                RewindError::Store {
                    source: SessionError::MessageNotFound { session_id, message_id },
                    ..
                } => RewindError::MessageNotFound { session_id, message_id },
                other => other,
            })?;

        let session = self
            .bounded(RewindStage::Refresh, cancel, self.sessions.get(session_id))
            .await?;

        Ok((session, deleted))
    }

    /// Run one store call under the cancellation token and the timeout.
    async fn bounded<T, F>(
        &self,
        stage: RewindStage,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<T, RewindError>
    where
        F: Future<Output = Result<T, SessionError>>,
    {
        if cancel.is_cancelled() {
            return Err(RewindError::Cancelled { stage });
        }

        let limited = async {
            let outcome = match self.timeout {
                Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                    RewindError::TimedOut {
                        stage,
                        timeout_ms: limit.as_millis() as u64,
                    }
                })?,
                None => call.await,
            };
            outcome.map_err(|source| RewindError::Store { stage, source })
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RewindError::Cancelled { stage }),
            result = limited => result,
        }
    }
}

/// Marks a session as being rewound for as long as it is alive.
struct RewindGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    session_id: String,
}

impl RewindGuard {
    fn acquire(in_flight: &Arc<Mutex<HashSet<String>>>, session_id: &str) -> Result<Self, RewindError> {
        let inserted = in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id.to_string());
        if !inserted {
            return Err(RewindError::InProgress(session_id.to_string()));
        }
        Ok(Self {
            in_flight: Arc::clone(in_flight),
            session_id: session_id.to_string(),
        })
    }
}

impl Drop for RewindGuard {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::{MockMessageStore, MockSessionStore};
    use crate::session::{Message, SessionStats};
    use async_trait::async_trait;

    #[derive(Default)]
    struct CollectingSink {
        published: Mutex<Vec<Session>>,
    }

    impl SessionSink for CollectingSink {
        fn publish(&self, session: &Session) {
            self.published.lock().unwrap().push(session.clone());
        }
    }

    impl CollectingSink {
        fn count(&self) -> usize {
            self.published.lock().unwrap().len()
        }
    }

    fn history() -> Vec<Message> {
        let mut m1 = Message::user("s1", "first");
        m1.id = "m1".to_string();
        let mut m2 = Message::user("s1", "second");
        m2.id = "m2".to_string();
        let mut m3 = Message::assistant("s1", "reply");
        m3.id = "m3".to_string();
        vec![m1, m2, m3]
    }

    fn session_with(count: u32) -> Session {
        let mut session = Session::new("s1".to_string(), "Test".to_string(), "/p".to_string());
        session.stats = SessionStats {
            message_count: count,
            user_message_count: count,
            ..Default::default()
        };
        session
    }

    fn coordinator(messages: MockMessageStore, sessions: MockSessionStore) -> RewindCoordinator {
        RewindCoordinator::new(Arc::new(messages), Arc::new(sessions))
    }

    /// Store whose every call takes `delay`.
    struct SlowStore {
        delay: Duration,
    }

    #[async_trait]
    impl MessageStore for SlowStore {
        async fn list(&self, _session_id: &str) -> Result<Vec<Message>, SessionError> {
            tokio::time::sleep(self.delay).await;
            Ok(history())
        }

        async fn delete_from_id(&self, _session_id: &str, _message_id: &str) -> Result<u32, SessionError> {
            tokio::time::sleep(self.delay).await;
            Ok(2)
        }
    }

    #[async_trait]
    impl SessionStore for SlowStore {
        async fn get(&self, _session_id: &str) -> Result<Session, SessionError> {
            tokio::time::sleep(self.delay).await;
            Ok(session_with(1))
        }
    }

    #[tokio::test]
    async fn test_rewind_publishes_refreshed_session() {
        let mut messages = MockMessageStore::new();
        messages.expect_list().times(1).returning(|_| Ok(history()));
        messages
            .expect_delete_from_id()
            .times(1)
            .returning(|session_id, message_id| {
                assert_eq!(session_id, "s1");
                assert_eq!(message_id, "m2");
                Ok(2)
            });
        let mut sessions = MockSessionStore::new();
        sessions.expect_get().times(1).returning(|_| Ok(session_with(1)));

        let sink = CollectingSink::default();
        let session = coordinator(messages, sessions)
            .rewind_to("s1", "m2", &CancellationToken::new(), &sink)
            .await
            .unwrap();

        assert_eq!(session.stats.message_count, 1);
        assert_eq!(sink.published.lock().unwrap()[0], session);
    }

    #[tokio::test]
    async fn test_unknown_message_deletes_nothing() {
        let mut messages = MockMessageStore::new();
        messages.expect_list().returning(|_| Ok(history()));
        messages.expect_delete_from_id().never();
        let mut sessions = MockSessionStore::new();
        sessions.expect_get().never();

        let sink = CollectingSink::default();
        let err = coordinator(messages, sessions)
            .rewind_to("s1", "nope", &CancellationToken::new(), &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, RewindError::MessageNotFound { .. }));
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_assistant_message_rejected() {
        let mut messages = MockMessageStore::new();
        messages.expect_list().returning(|_| Ok(history()));
        messages.expect_delete_from_id().never();

        let err = coordinator(messages, MockSessionStore::new())
            .rewind_to("s1", "m3", &CancellationToken::new(), &CollectingSink::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RewindError::NotUserMessage(id) if id == "m3"));
    }

    #[tokio::test]
    async fn test_delete_failure_is_not_published() {
        let mut messages = MockMessageStore::new();
        messages.expect_list().returning(|_| Ok(history()));
        messages
            .expect_delete_from_id()
            .returning(|_, _| Err(SessionError::Storage("disk I/O error".to_string())));
        let mut sessions = MockSessionStore::new();
        sessions.expect_get().never();

        let sink = CollectingSink::default();
        let err = coordinator(messages, sessions)
            .rewind_to("s1", "m1", &CancellationToken::new(), &sink)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RewindError::Store {
                stage: RewindStage::Delete,
                ..
            }
        ));
        assert!(!err.history_truncated());
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_failure_reports_truncated_history() {
        let mut messages = MockMessageStore::new();
        messages.expect_list().returning(|_| Ok(history()));
        messages.expect_delete_from_id().returning(|_, _| Ok(3));
        let mut sessions = MockSessionStore::new();
        sessions
            .expect_get()
            .returning(|id| Err(SessionError::NotFound(id.to_string())));

        let sink = CollectingSink::default();
        let err = coordinator(messages, sessions)
            .rewind_to("s1", "m1", &CancellationToken::new(), &sink)
            .await
            .unwrap_err();

        assert!(err.history_truncated());
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_vanished_message_maps_to_not_found() {
        let mut messages = MockMessageStore::new();
        messages.expect_list().returning(|_| Ok(history()));
        messages.expect_delete_from_id().returning(|session_id, message_id| {
            Err(SessionError::MessageNotFound {
                session_id: session_id.to_string(),
                message_id: message_id.to_string(),
            })
        });

        let err = coordinator(messages, MockSessionStore::new())
            .rewind_to("s1", "m2", &CancellationToken::new(), &CollectingSink::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RewindError::MessageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let mut messages = MockMessageStore::new();
        messages.expect_list().never();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let sink = CollectingSink::default();
        let err = coordinator(messages, MockSessionStore::new())
            .rewind_to("s1", "m2", &cancel, &sink)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RewindError::Cancelled {
                stage: RewindStage::Locate
            }
        ));
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_mid_flight() {
        let store = Arc::new(SlowStore {
            delay: Duration::from_millis(200),
        });
        let coordinator = RewindCoordinator::new(store.clone(), store);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let sink = CollectingSink::default();
        let err = coordinator
            .rewind_to("s1", "m2", &cancel, &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, RewindError::Cancelled { .. }));
        assert_eq!(sink.count(), 0);
        assert!(!coordinator.is_rewinding("s1"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let store = Arc::new(SlowStore {
            delay: Duration::from_millis(500),
        });
        let coordinator = RewindCoordinator::new(store.clone(), store)
            .with_timeout(Some(Duration::from_millis(10)));

        let err = coordinator
            .rewind_to("s1", "m2", &CancellationToken::new(), &CollectingSink::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RewindError::TimedOut {
                stage: RewindStage::Locate,
                timeout_ms: 10
            }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_rewind_of_same_session_rejected() {
        let store = Arc::new(SlowStore {
            delay: Duration::from_millis(30),
        });
        let coordinator = RewindCoordinator::new(store.clone(), store);
        let cancel = CancellationToken::new();
        let sink = CollectingSink::default();

        let (first, second) = tokio::join!(
            coordinator.rewind_to("s1", "m2", &cancel, &sink),
            coordinator.rewind_to("s1", "m1", &cancel, &sink),
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(RewindError::InProgress(id)) if id == "s1"));
        assert_eq!(sink.count(), 1);
        assert!(!coordinator.is_rewinding("s1"));
    }
}
