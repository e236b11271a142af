// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The session currently shown in the chat view.

use tokio::sync::watch;

use crate::rewind::SessionSink;
use crate::session::{Session, SessionId};

/// Holder of the active session; views subscribe to be told when it changes.
pub struct ActiveSession {
    tx: watch::Sender<Option<Session>>,
}

impl ActiveSession {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Snapshot of the active session.
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn id(&self) -> Option<SessionId> {
        self.tx.borrow().as_ref().map(|s| s.id.clone())
    }

    /// Replace the active session, or clear it with `None`.
    pub fn set(&self, session: Option<Session>) {
        self.tx.send_replace(session);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

impl Default for ActiveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSink for ActiveSession {
    fn publish(&self, session: &Session) {
        self.set(Some(session.clone()));
    }
}
