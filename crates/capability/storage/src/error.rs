//! 存储层错误类型
//!
//! 封装文件 I/O、JSON 编解码与生命周期错误。

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("lock failed: {0}")]
    Lock(String),
    #[error("store not ready: {0}")]
    NotReady(String),
}
