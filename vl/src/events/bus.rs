//! Event Bus - synchronous named-event dispatch

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

/// Event emitted with a logical template name when its file changes
pub const UPDATE_EVENT: &str = "update";

/// Callback invoked with the event argument
pub type Listener = Arc<dyn Fn(&str) -> eyre::Result<()> + Send + Sync>;

/// Handle returned by [`EventBus::on`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered, synchronous pub/sub keyed by event name
#[derive(Default)]
pub struct EventBus {
    listeners: RwLock<HashMap<String, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `callback` to `name`; listeners run in subscription order
    pub fn on<F>(&self, name: &str, callback: F) -> ListenerId
    where
        F: Fn(&str) -> eyre::Result<()> + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(%name, id = id.0, "EventBus::on: called");
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners
            .entry(name.to_string())
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove one listener; returns false if it was not subscribed to `name`
    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        debug!(%name, id = id.0, "EventBus::off: called");
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = listeners.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.remove(name);
        }
        removed
    }

    /// Invoke every listener of `name` with `arg`
    ///
    /// The first listener error stops dispatch and is returned. Emitting a
    /// name nobody listens to does nothing.
    pub fn emit(&self, name: &str, arg: &str) -> eyre::Result<()> {
        let snapshot = self.snapshot(name);
        debug!(%name, %arg, listeners = snapshot.len(), "EventBus::emit: called");
        for listener in snapshot {
            listener(arg)?;
        }
        Ok(())
    }

    /// Invoke every listener of `name`, collecting errors instead of stopping
    pub fn emit_isolated(&self, name: &str, arg: &str) -> Vec<eyre::Report> {
        let snapshot = self.snapshot(name);
        debug!(%name, %arg, listeners = snapshot.len(), "EventBus::emit_isolated: called");
        snapshot.into_iter().filter_map(|listener| listener(arg).err()).collect()
    }

    pub fn listener_count(&self, name: &str) -> usize {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        listeners.get(name).map_or(0, Vec::len)
    }

    // Copy out so listeners can subscribe or unsubscribe while running
    fn snapshot(&self, name: &str) -> Vec<Listener> {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        listeners
            .get(name)
            .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> = listeners.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}
