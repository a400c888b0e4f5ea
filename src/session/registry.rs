//! Creation-ordered set of live sessions with cyclic successor/predecessor lookup

use super::Session;
use crate::error::{ShellError, ShellResult};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<Vec<Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a session. Callers guarantee it is not already registered.
    pub fn insert(&self, session: Arc<Session>) {
        self.sessions.lock().push(session);
    }

    pub fn remove(&self, session: &Arc<Session>) -> ShellResult<()> {
        let mut sessions = self.sessions.lock();
        match sessions.iter().position(|s| Arc::ptr_eq(s, session)) {
            Some(index) => {
                sessions.remove(index);
                Ok(())
            }
            None => Err(ShellError::SessionNotRegistered(session.id())),
        }
    }

    pub fn contains(&self, session: &Session) -> bool {
        self.sessions
            .lock()
            .iter()
            .any(|s| std::ptr::eq(s.as_ref(), session))
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Next session in insertion order, wrapping to the first. An absent or
    /// unknown `session` yields the first session.
    pub fn successor_of(&self, session: Option<&Arc<Session>>) -> Option<Arc<Session>> {
        let sessions = self.sessions.lock();
        let index = session.and_then(|s| sessions.iter().position(|x| Arc::ptr_eq(x, s)));
        match index {
            Some(i) => sessions.get((i + 1) % sessions.len()).cloned(),
            None => sessions.first().cloned(),
        }
    }

    /// Previous session in insertion order, wrapping to the last. An absent
    /// or unknown `session` yields the last session.
    pub fn predecessor_of(&self, session: Option<&Arc<Session>>) -> Option<Arc<Session>> {
        let sessions = self.sessions.lock();
        let index = session.and_then(|s| sessions.iter().position(|x| Arc::ptr_eq(x, s)));
        match index {
            Some(0) => sessions.last().cloned(),
            Some(i) => sessions.get(i - 1).cloned(),
            None => sessions.last().cloned(),
        }
    }

    /// Snapshot of the registered sessions in insertion order
    pub fn snapshot(&self) -> Vec<Arc<Session>> {
        self.sessions.lock().clone()
    }

    /// Visit a snapshot; the visitor may mutate the registry
    pub fn for_each(&self, mut visitor: impl FnMut(&Arc<Session>)) {
        for session in self.snapshot() {
            visitor(&session);
        }
    }
}
