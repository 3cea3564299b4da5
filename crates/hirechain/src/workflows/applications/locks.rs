use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

/// One mutex per key, created on demand and dropped once nobody holds or waits on it.
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `key`. Different keys never block each other.
    pub fn with_lock<R>(&self, key: &K, f: impl FnOnce() -> R) -> R {
        let slot = {
            let mut slots = self.slots.lock().expect("lock table poisoned");
            slots.entry(key.clone()).or_default().clone()
        };

        let result = {
            let _held = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            f()
        };

        let mut slots = self.slots.lock().expect("lock table poisoned");
        // The table and this call are the only owners left: no one else is waiting.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(key);
        }
        result
    }

    pub fn tracked(&self) -> usize {
        self.slots.lock().expect("lock table poisoned").len()
    }
}
