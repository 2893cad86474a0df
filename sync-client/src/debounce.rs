//! Trailing-edge debouncing on the tokio timer.
//!
//! - [`Debouncer`] - one timing window; the last scheduled closure wins
//! - [`Debounced`] - wraps a function, the last call's arguments win
//! - [`DebouncePool`] - one independent [`Debouncer`] per key
//!
//! Two closures scheduled on the same [`Debouncer`] compete for one window,
//! even if they do different things. That is how PLAY and PAUSE collapse: a
//! rapid play → pause → play sequence publishes only the final PLAY. Actions
//! that must not suppress each other take different pool keys.
//!
//! All scheduling spawns onto the current tokio runtime.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::lock;

/// One trailing-edge debounce window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create a debouncer with the given quiescence window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    /// Schedule `f` to run once the window passes without another call.
    ///
    /// Cancels whatever was pending; only the latest closure ever runs.
    pub fn call<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let window = self.window;
        let mut pending = lock(&self.pending);
        if let Some(handle) = pending.take() {
            handle.abort();
        }
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            f();
        }));
    }

    /// Whether a call is waiting for its window to pass.
    pub fn is_pending(&self) -> bool {
        lock(&self.pending)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Drop the pending call, if any. Returns true if one was cancelled.
    pub fn cancel(&self) -> bool {
        match lock(&self.pending).take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.pending).take() {
            handle.abort();
        }
    }
}

/// A function wrapped so that bursts of calls collapse into the last one.
pub struct Debounced<A> {
    func: Arc<dyn Fn(A) + Send + Sync>,
    debouncer: Arc<Debouncer>,
}

impl<A: Send + 'static> Debounced<A> {
    /// Wrap `func` with its own window.
    pub fn new<F>(window: Duration, func: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::on(Arc::new(Debouncer::new(window)), func)
    }

    /// Wrap `func` so it shares `debouncer`'s window with other wrappers.
    pub fn on<F>(debouncer: Arc<Debouncer>, func: F) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            debouncer,
        }
    }

    /// Record a call; `func` runs with these arguments unless superseded.
    pub fn call(&self, args: A) {
        let func = Arc::clone(&self.func);
        self.debouncer.call(move || func(args));
    }

    /// Drop the pending call, if any.
    pub fn cancel(&self) -> bool {
        self.debouncer.cancel()
    }
}

impl<A> std::fmt::Debug for Debounced<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debounced")
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}

/// Keyed factory of independent debounce windows.
#[derive(Debug)]
pub struct DebouncePool<K> {
    window: Duration,
    slots: Mutex<HashMap<K, Arc<Debouncer>>>,
}

impl<K: Eq + Hash> DebouncePool<K> {
    /// Create a pool whose debouncers all use `window`.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The debouncer for `key`, created on first use.
    pub fn get(&self, key: K) -> Arc<Debouncer> {
        let mut slots = lock(&self.slots);
        Arc::clone(
            slots
                .entry(key)
                .or_insert_with(|| Arc::new(Debouncer::new(self.window))),
        )
    }

    /// Cancel every pending call. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|debouncer| debouncer.cancel())
            .count()
    }
}
