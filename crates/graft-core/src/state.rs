//! Process-scoped coordination state for interceptors.
//!
//! Hooks on unrelated routines often need to agree on small facts ("this
//! package was launched onto that display") without holding references to
//! each other. The store is a coarse-locked key→value map: each operation is
//! individually atomic, writes are visible to the next read from any thread,
//! and nothing expires. Whoever learns an association no longer applies
//! removes it.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::hook::Value;

#[derive(Debug, Default)]
pub struct SharedStateStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl SharedStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composite key helper, e.g. `scoped("display", "com.example.app")`.
    pub fn scoped(namespace: &str, name: &str) -> String {
        format!("{}/{}", namespace, name)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
