//! In-process session store.
//!
//! Values live for the lifetime of the process. This is what the chat
//! client uses for the usage counter: a restart starts a fresh session.

use dashmap::DashMap;

use polychat_core::session::SessionStore;
use polychat_types::error::SessionError;

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: DashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), SessionError> {
        self.values.remove(key);
        Ok(())
    }
}
