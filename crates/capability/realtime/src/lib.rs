//! 实时推送能力模块
//!
//! 以 `tokio::sync::broadcast` 为底座的频道式扇出：
//! - 发布方（轮询循环、控制服务）调用 `TelemetryHub::publish`，永不阻塞
//! - 订阅方（WebSocket 连接）通过 `Subscription` 加入/退出频道，只接收已加入频道的消息
//!
//! 慢订阅者落后时丢弃旧消息并记录警告，不影响发布方。

pub mod channel;
pub mod hub;

pub use channel::{HubChannel, HubMessage};
pub use hub::{Subscription, TelemetryHub};
