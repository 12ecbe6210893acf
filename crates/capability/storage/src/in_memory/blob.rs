use crate::error::StorageError;
use crate::traits::BlobStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// 内存文档存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储。
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Value>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let mut map = self
            .blobs
            .write()
            .map_err(|_| StorageError::Lock(key.to_string()))?;
        map.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let item = self
            .blobs
            .read()
            .ok()
            .and_then(|map| map.get(key).cloned());
        Ok(item)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if let Ok(mut map) = self.blobs.write() {
            map.remove(key);
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let found = self
            .blobs
            .read()
            .map(|map| map.contains_key(key))
            .unwrap_or(false);
        Ok(found)
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self
            .blobs
            .read()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}
