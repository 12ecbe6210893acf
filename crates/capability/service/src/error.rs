use van_storage::StorageError;

/// 服务层错误。插件失败不在其中。
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("service not ready: {0}")]
    NotReady(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotReady(key) => ServiceError::NotReady(key),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}
