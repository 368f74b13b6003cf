//! Observable execution state store

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use cyload_core::QueryCounters;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};

use super::{ExecutionState, StatePatch};

/// Callback invoked with a snapshot after every change
pub type StateCallback = Arc<dyn Fn(&ExecutionState) + Send + Sync>;

#[derive(Default)]
struct SubscriberRegistry {
    next_id: u64,
    /// Ordered by registration
    callbacks: IndexMap<u64, StateCallback>,
}

/// Single-writer, multi-observer store for the upload job state
///
/// Only the engine driving the current run may mutate the store; observers
/// read snapshots through [`get`](Self::get) or a subscription. Every
/// mutation notifies subscribers synchronously, outside of any internal
/// lock and in registration order, so callbacks may read the store again.
pub struct ExecutionStateStore {
    state: RwLock<ExecutionState>,
    subscribers: Arc<Mutex<SubscriberRegistry>>,
}

impl ExecutionStateStore {
    /// Create a store holding the default state
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ExecutionState::default()),
            subscribers: Arc::new(Mutex::new(SubscriberRegistry::default())),
        }
    }

    /// Independent copy of the current state
    pub fn get(&self) -> ExecutionState {
        self.state.read().clone()
    }

    /// Whether a run is currently active
    pub fn has_active_execution(&self) -> bool {
        self.state.read().is_running
    }

    /// Shallow-merge `patch` into the state and notify subscribers
    pub fn update(&self, patch: StatePatch) {
        let snapshot = {
            let mut state = self.state.write();
            state.apply(patch);
            state.clone()
        };
        self.notify(&snapshot);
    }

    /// Add `delta` element-wise to the current counters and notify subscribers
    pub fn add_to_counters(&self, delta: &QueryCounters) {
        let snapshot = {
            let mut state = self.state.write();
            state.counters.add(delta);
            state.clone()
        };
        self.notify(&snapshot);
    }

    /// Restore the default state and notify subscribers
    pub fn reset(&self) {
        let snapshot = {
            let mut state = self.state.write();
            *state = ExecutionState::default();
            state.clone()
        };
        tracing::debug!("execution state reset");
        self.notify(&snapshot);
    }

    /// Register a callback for every future change
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ExecutionState) + Send + Sync + 'static,
    {
        let mut registry = self.subscribers.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.callbacks.insert(id, Arc::new(callback));
        tracing::trace!(subscriber_id = id, "execution state subscriber added");

        Subscription {
            id,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().callbacks.len()
    }

    fn notify(&self, snapshot: &ExecutionState) {
        let callbacks: Vec<(u64, StateCallback)> = self
            .subscribers
            .lock()
            .callbacks
            .iter()
            .map(|(id, callback)| (*id, Arc::clone(callback)))
            .collect();

        for (id, callback) in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(snapshot))).is_err() {
                tracing::error!(subscriber_id = id, "execution state subscriber panicked");
            }
        }
    }
}

impl Default for ExecutionStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExecutionStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionStateStore")
            .field("state", &*self.state.read())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Handle to a registered state callback
///
/// Dropping the handle removes the callback.
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<SubscriberRegistry>>,
}

impl Subscription {
    /// Remove the callback now
    pub fn unsubscribe(self) {
        drop(self);
    }

    fn remove(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().callbacks.shift_remove(&self.id);
            tracing::trace!(subscriber_id = self.id, "execution state subscriber removed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
