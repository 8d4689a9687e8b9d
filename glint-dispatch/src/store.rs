//! Transient key-value hand-off between UI surfaces.
//!
//! The popup, side panel, and background dispatcher have independent
//! lifecycles; this store carries the last selected code and the last
//! result between them. It is ephemeral by design and not load-bearing
//! for core correctness - operations can receive code directly.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Key under which the last selected code is parked.
pub const PENDING_CODE_KEY: &str = "pendingCode";
/// Key under which the last operation result is parked.
pub const LAST_RESULT_KEY: &str = "lastResult";

#[async_trait]
pub trait TransientStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value);
    async fn remove(&self, key: &str);
}

/// In-memory store; contents vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransientStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) {
        self.entries.write().await.insert(key.to_string(), value);
    }

    async fn remove(&self, key: &str) {
        self.entries.write().await.remove(key);
    }
}
