//! JSON 文件存储实现
//!
//! 每个键对应数据目录下的一个缩进格式 JSON 文件。所有读写都经过同一把
//! `tokio::sync::Mutex`（先到先得），写入先落到临时文件再原子替换。

use crate::error::StorageError;
use crate::traits::BlobStore;
use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

/// JSON 文件存储。
pub struct JsonFileStore {
    dir: PathBuf,
    gate: Mutex<()>,
}

impl JsonFileStore {
    /// 创建文件存储（不做 I/O，目录在首次写入时创建）。
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            gate: Mutex::new(()),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let key = key.trim();
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        let file_name = if key.ends_with(".json") {
            key.to_string()
        } else {
            format!("{key}.json")
        };
        Ok(self.dir.join(file_name))
    }
}

#[async_trait]
impl BlobStore for JsonFileStore {
    async fn save(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let bytes = serde_json::to_vec_pretty(value)?;
        let _guard = self.gate.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(target: "van.storage", key = %key, bytes = bytes.len(), "blob_saved");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key)?;
        let _guard = self.gate.lock().await;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let value = serde_json::from_slice(&bytes)?;
        Ok(Some(value))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let _guard = self.gate.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        let _guard = self.gate.lock().await;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let _guard = self.gate.lock().await;
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".json") {
                keys.push(name);
            }
        }
        keys.sort();
        Ok(keys)
    }
}
