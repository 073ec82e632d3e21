//! Buffer change notifications.
//!
//! Listeners are registered with [`ChangeEvents::subscribe`] and stay
//! registered until the returned [`Subscription`] is disposed or dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;

/// A change to one buffer. Carries identity only; listeners read the buffer
/// itself for the new text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub uri: Url,
    pub version: i32,
}

type Listener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: AtomicU64,
    table: DashMap<u64, Listener>,
}

/// Fan-out channel for [`ChangeEvent`]s.
#[derive(Clone, Default)]
pub struct ChangeEvents {
    listeners: Arc<Listeners>,
}

impl ChangeEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.table.insert(id, Arc::new(listener));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver `event` to every listener, in the caller's thread.
    pub fn notify(&self, event: &ChangeEvent) {
        // Snapshot first so listeners may unsubscribe while being called.
        let listeners: Vec<Listener> = self
            .listeners
            .table
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.table.len()
    }
}

impl std::fmt::Debug for ChangeEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Handle to a registered listener. Unsubscribes when disposed or dropped.
#[derive(Debug)]
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.table.remove(&self.id);
        }
    }
}
