//! Event emission for façade operations
//!
//! Each operation call ends with exactly one event: `<operation>` with an
//! [`OperationResult`] or `<operation>-error` with an [`ErrorSignal`].
//! Listeners are plain closures; `once` listeners are removed before they
//! run, so repeated calls never accumulate registrations.

use crate::operation::OperationResult;
use mongomodel_common::ErrorSignal;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Success(OperationResult),
    Error(ErrorSignal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub payload: EventPayload,
}

impl Event {
    pub fn is_error(&self) -> bool {
        matches!(self.payload, EventPayload::Error(_))
    }
}

/// Handle returned by [`EventEmitter::on`], used to remove the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

struct Registration {
    id: ListenerId,
    once: bool,
    listener: Listener,
}

/// Shared listener registry. Clones share the same listeners.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<RwLock<HashMap<String, Vec<Registration>>>>,
    next_id: Arc<AtomicU64>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every emission of `name`
    pub fn on<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.register(name.into(), false, Arc::new(listener))
    }

    /// Register a listener for the next emission of `name` only
    pub fn once<F>(&self, name: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.register(name.into(), true, Arc::new(listener))
    }

    fn register(&self, name: String, once: bool, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .entry(name)
            .or_default()
            .push(Registration { id, once, listener });
        id
    }

    /// Remove a listener; returns false if it was already gone
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let mut removed = false;
        for registrations in listeners.values_mut() {
            let before = registrations.len();
            registrations.retain(|r| r.id != id);
            removed |= registrations.len() != before;
        }
        listeners.retain(|_, registrations| !registrations.is_empty());
        removed
    }

    pub fn remove_all(&self, name: &str) {
        self.listeners.write().remove(name);
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.read().get(name).map_or(0, Vec::len)
    }

    /// Deliver `event` to its listeners; returns how many were called.
    /// Listeners run outside the lock and may register further listeners.
    pub fn emit(&self, event: &Event) -> usize {
        let to_call: Vec<Listener> = {
            let mut listeners = self.listeners.write();
            let Some(registrations) = listeners.get_mut(&event.name) else {
                return 0;
            };
            let called = registrations.iter().map(|r| r.listener.clone()).collect();
            registrations.retain(|r| !r.once);
            if registrations.is_empty() {
                listeners.remove(&event.name);
            }
            called
        };

        for listener in &to_call {
            listener(event);
        }
        to_call.len()
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.read();
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(name, regs)| (name.as_str(), regs.len()))
            .collect();
        f.debug_struct("EventEmitter").field("listeners", &counts).finish()
    }
}
