use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::SessionStore;
use crate::error::TourError;

/// In-process store. Clones share the same slots, so one handle can be
/// given to each simulated page load and still see earlier writes.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    slots: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw slot value, bypassing the bridge
    pub fn get(&self, key: &str) -> Option<String> {
        self.slots.lock().ok()?.get(key).cloned()
    }

    /// Write a raw slot value, bypassing the bridge
    pub fn set(&self, key: &str, value: &str) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), value.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().map(|s| s.is_empty()).unwrap_or(true)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, TourError> {
        self.slots
            .lock()
            .map_err(|_| TourError::Storage("session slots lock poisoned".to_string()))
    }
}

impl SessionStore for MemorySessionStore {
    fn read_slot(&self, key: &str) -> Result<Option<String>, TourError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write_slot(&mut self, key: &str, value: &str) -> Result<(), TourError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_slot(&mut self, key: &str) -> Result<(), TourError> {
        self.lock()?.remove(key);
        Ok(())
    }
}
