//! In-process caches: a flat TTL map for account search and a
//! single-flight map deduplicating concurrent fetches.
//!
//! Both are constructed per SDK instance and injected where needed, so
//! tests get isolation and deterministic expiry control.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::{RealizeError, Result};

// ---------------------------------------------------------------------------
// TtlCache
// ---------------------------------------------------------------------------

/// A flat key-value cache whose entries expire after a fixed TTL.
///
/// Expired entries are dropped lazily on access; there is no background
/// sweeper.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().expect("ttl cache lock poisoned");
        match entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: K, value: V) {
        let mut entries = self.entries.lock().expect("ttl cache lock poisoned");
        entries.insert(key, (Instant::now(), value));
    }

    pub fn invalidate(&self, key: &K) {
        let mut entries = self.entries.lock().expect("ttl cache lock poisoned");
        entries.remove(key);
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("ttl cache lock poisoned");
        entries.clear();
    }

    /// Force an entry to be treated as expired on its next access.
    /// Test hook for deterministic expiry without waiting out the TTL.
    pub fn expire(&self, key: &K) {
        let mut entries = self.entries.lock().expect("ttl cache lock poisoned");
        match Instant::now().checked_sub(self.ttl) {
            Some(past) => {
                if let Some((stored_at, _)) = entries.get_mut(key) {
                    *stored_at = past;
                }
            }
            // The monotonic clock is younger than the TTL; dropping the
            // entry has the same observable effect.
            None => {
                entries.remove(key);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SingleFlight
// ---------------------------------------------------------------------------

enum SlotState<V> {
    Pending,
    Ready(V),
    Failed(String),
}

type Slot<V> = Arc<(Mutex<SlotState<V>>, Condvar)>;

/// Deduplicates concurrent operations per key.
///
/// The first caller for a key runs the operation; concurrent callers for
/// the same key block on the shared slot and receive a clone of the
/// result. Successes stay memoized. A failure evicts the slot before
/// waiters are notified, so a later retry starts fresh instead of being
/// permanently poisoned.
pub struct SingleFlight<V> {
    slots: Mutex<HashMap<String, Slot<V>>>,
}

impl<V: Clone> SingleFlight<V> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn run<F>(&self, key: &str, operation: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        let (slot, leader) = {
            let mut slots = self.slots.lock().expect("single-flight lock poisoned");
            match slots.get(key) {
                Some(existing) => (Arc::clone(existing), false),
                None => {
                    let slot: Slot<V> = Arc::new((Mutex::new(SlotState::Pending), Condvar::new()));
                    slots.insert(key.to_owned(), Arc::clone(&slot));
                    (slot, true)
                }
            }
        };

        if !leader {
            return self.wait(&slot);
        }

        let outcome = operation();

        if outcome.is_err() {
            let mut slots = self.slots.lock().expect("single-flight lock poisoned");
            slots.remove(key);
        }

        let (state, condvar) = &*slot;
        let mut guard = state.lock().expect("single-flight slot poisoned");
        match &outcome {
            Ok(value) => *guard = SlotState::Ready(value.clone()),
            Err(err) => *guard = SlotState::Failed(err.to_string()),
        }
        condvar.notify_all();
        drop(guard);

        outcome
    }

    /// Drop the memoized result for a key, forcing the next caller to
    /// re-run the operation.
    pub fn invalidate(&self, key: &str) {
        let mut slots = self.slots.lock().expect("single-flight lock poisoned");
        slots.remove(key);
    }

    fn wait(&self, slot: &Slot<V>) -> Result<V> {
        let (state, condvar) = &**slot;
        let mut guard = state.lock().expect("single-flight slot poisoned");
        loop {
            match &*guard {
                SlotState::Pending => {
                    guard = condvar
                        .wait(guard)
                        .expect("single-flight slot poisoned");
                }
                SlotState::Ready(value) => return Ok(value.clone()),
                SlotState::Failed(message) => {
                    return Err(RealizeError::RequestFailed(message.clone()))
                }
            }
        }
    }
}

impl<V: Clone> Default for SingleFlight<V> {
    fn default() -> Self {
        Self::new()
    }
}
