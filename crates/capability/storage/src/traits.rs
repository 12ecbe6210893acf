//! 存储接口 Trait 定义
//!
//! - BlobStore：键 → JSON 文档存储（文件或内存）
//! - Entity：可被 `EntityStore` 管理的实体

use crate::error::StorageError;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// JSON 文档存储接口。
///
/// 键为类文件名字符串（如 `tanks.json`），值为完整 JSON 文档。
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// 保存文档（覆盖）。
    async fn save(&self, key: &str, value: &Value) -> Result<(), StorageError>;

    /// 读取文档，不存在时返回 `None`。
    async fn load(&self, key: &str) -> Result<Option<Value>, StorageError>;

    /// 删除文档，不存在视为成功。
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// 文档是否存在。
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// 已存储的全部键（排序）。
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// 可持久化实体。
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn entity_id(&self) -> &str;

    /// 落盘形式；运行时字段（实时读数等）在这里清除。
    fn to_stored(&self) -> Self {
        self.clone()
    }
}
