//! 插件错误类型

use thiserror::Error;

/// 插件调用错误。服务层负责把它们降级为缓存值或 `false`。
#[derive(Debug, Error)]
pub enum PluginError {
    /// 初始化失败
    #[error("plugin initialization failed: {0}")]
    Initialization(String),

    /// 尚未初始化
    #[error("plugin not initialized: {0}")]
    NotInitialized(String),

    /// 配置缺失或格式错误
    #[error("invalid plugin config: {0}")]
    InvalidConfig(String),

    /// 硬件调用失败
    #[error("plugin call failed: {0}")]
    Call(String),

    /// 调用超时
    #[error("plugin call timed out: {0}")]
    Timeout(String),
}
