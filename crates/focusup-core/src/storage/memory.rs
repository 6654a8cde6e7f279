use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_json::Value;

use super::{KeyValueStore, Scope};
use crate::error::StoreError;

/// In-process store. Single-threaded, like every FocusUp process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<(Scope, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without going through the async API.
    pub fn insert(&self, scope: Scope, key: &str, value: Value) {
        self.entries.borrow_mut().insert((scope, key.to_string()), value);
    }

    pub fn peek(&self, scope: Scope, key: &str) -> Option<Value> {
        self.entries.borrow().get(&(scope, key.to_string())).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, scope: Scope, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.peek(scope, key))
    }

    async fn set(&self, scope: Scope, key: &str, value: Value) -> Result<(), StoreError> {
        self.insert(scope, key, value);
        Ok(())
    }
}
