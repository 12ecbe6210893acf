//! 实体集合存储
//!
//! 内存中的 `Vec<T>` 是权威数据；`mutate` 在持有写锁的情况下完成落盘，
//! 保证同一集合的写入顺序与文件内容一致。

use crate::error::StorageError;
use crate::traits::{BlobStore, Entity};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{info, warn};
use van_telemetry::record_persistence_failure;

/// 单个实体集合（如 `tanks.json`）。
pub struct EntityStore<T> {
    key: String,
    blob: Option<Arc<dyn BlobStore>>,
    items: RwLock<Vec<T>>,
    ready: AtomicBool,
}

impl<T: Entity> EntityStore<T> {
    /// 构造集合（不做 I/O）。`blob` 为 `None` 时仅保存在内存中。
    pub fn new(key: impl Into<String>, blob: Option<Arc<dyn BlobStore>>) -> Self {
        Self {
            key: key.into(),
            blob,
            items: RwLock::new(Vec::new()),
            ready: AtomicBool::new(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// 加载持久化数据并进入就绪状态，返回加载的记录数。
    ///
    /// - 文档不存在：使用 `defaults` 并立即写回
    /// - 读取失败或解码失败：使用 `defaults`，不覆盖原文件（降级模式）
    pub async fn load<F>(&self, defaults: F) -> usize
    where
        F: FnOnce() -> Vec<T>,
    {
        let mut items = self.items.write().await;
        let (loaded, seed) = match &self.blob {
            None => (defaults(), false),
            Some(blob) => match blob.load(&self.key).await {
                Ok(Some(value)) => match serde_json::from_value::<Vec<T>>(value) {
                    Ok(loaded) => (loaded, false),
                    Err(err) => {
                        warn!(target: "van.storage", key = %self.key, "decode failed, using defaults: {}", err);
                        record_persistence_failure();
                        (defaults(), false)
                    }
                },
                Ok(None) => (defaults(), true),
                Err(err) => {
                    warn!(target: "van.storage", key = %self.key, "load failed, using defaults: {}", err);
                    record_persistence_failure();
                    (defaults(), false)
                }
            },
        };
        *items = loaded;
        if seed {
            self.persist(&items).await;
        }
        self.ready.store(true, Ordering::Release);
        info!(target: "van.storage", key = %self.key, count = items.len(), "store_loaded");
        items.len()
    }

    /// 当前集合的拷贝（含非激活记录）。
    pub async fn snapshot(&self) -> Result<Vec<T>, StorageError> {
        self.ensure_ready()?;
        Ok(self.items.read().await.clone())
    }

    /// 按 ID 查找（含非激活记录）。
    pub async fn find(&self, id: &str) -> Result<Option<T>, StorageError> {
        self.ensure_ready()?;
        let items = self.items.read().await;
        Ok(items.iter().find(|item| item.entity_id() == id).cloned())
    }

    /// 修改集合并落盘。
    pub async fn mutate<R, F>(&self, f: F) -> Result<R, StorageError>
    where
        F: FnOnce(&mut Vec<T>) -> R,
    {
        self.ensure_ready()?;
        let mut items = self.items.write().await;
        let result = f(&mut items);
        self.persist(&items).await;
        Ok(result)
    }

    /// 修改集合但不落盘（仅用于轮询得到的实时值）。
    pub async fn mutate_volatile<R, F>(&self, f: F) -> Result<R, StorageError>
    where
        F: FnOnce(&mut Vec<T>) -> R,
    {
        self.ensure_ready()?;
        let mut items = self.items.write().await;
        Ok(f(&mut items))
    }

    fn ensure_ready(&self) -> Result<(), StorageError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(StorageError::NotReady(self.key.clone()))
        }
    }

    async fn persist(&self, items: &[T]) {
        let Some(blob) = &self.blob else {
            return;
        };
        let stored: Vec<T> = items.iter().map(Entity::to_stored).collect();
        let value = match serde_json::to_value(&stored) {
            Ok(value) => value,
            Err(err) => {
                warn!(target: "van.storage", key = %self.key, "encode failed: {}", err);
                record_persistence_failure();
                return;
            }
        };
        if let Err(err) = blob.save(&self.key, &value).await {
            warn!(target: "van.storage", key = %self.key, "save failed: {}", err);
            record_persistence_failure();
        }
    }
}

