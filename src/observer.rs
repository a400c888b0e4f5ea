//! Observer lists that tolerate (de)registration from inside a callback
//!
//! Listeners are snapshotted before each notification so an observer that
//! removes itself, or registers another one, while being notified does not
//! invalidate the iteration in progress.

use parking_lot::Mutex;
use std::sync::Arc;

pub struct Multiplexer<O: ?Sized> {
    observers: Mutex<Vec<Arc<O>>>,
}

impl<O: ?Sized> Multiplexer<O> {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, observer: Arc<O>) {
        self.observers.lock().push(observer);
    }

    /// Remove a previously added observer (matched by identity).
    /// Returns `false` if it was not registered.
    pub fn remove(&self, observer: &Arc<O>) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|o| !Arc::ptr_eq(o, observer));
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.lock().is_empty()
    }

    /// Invoke `f` on a snapshot of the registered observers, without holding the lock
    pub fn for_each(&self, mut f: impl FnMut(&O)) {
        let snapshot: Vec<Arc<O>> = self.observers.lock().clone();
        for observer in &snapshot {
            f(observer);
        }
    }
}

impl<O: ?Sized> Default for Multiplexer<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ?Sized> std::fmt::Debug for Multiplexer<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Multiplexer")
            .field("observers", &self.len())
            .finish()
    }
}
