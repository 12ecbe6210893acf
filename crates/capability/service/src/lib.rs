//! 领域服务模块
//!
//! 每个服务拥有一个实体集合，负责在存储与硬件插件之间转发：
//! 查找记录 → 按名称解析插件 → 调用插件 → 把结果写回记录。
//!
//! ## 生命周期
//!
//! 服务采用两阶段生命周期：`new()` 不做 I/O，`start()` 加载持久化数据。
//! `start()` 之前的访问返回 `ServiceError::NotReady`。
//!
//! ## 插件失败
//!
//! 插件缺失、调用失败或超时只记录日志和计数，读操作返回缓存值，写操作返回 `false`，
//! 从不向调用方抛出。

pub mod alert;
pub mod control;
pub mod dimmer_sync;
pub mod electrical;
pub mod electrical_system;
pub mod error;
pub mod layout;
pub mod position;
pub mod seeds;
pub mod settings;
pub mod tank;

mod invoke;

use std::sync::Arc;
use std::time::Duration;
use van_plugin::PluginRegistry;
use van_storage::BlobStore;

pub use alert::{AlertService, evaluate_tank};
pub use control::ControlService;
pub use dimmer_sync::DimmerSync;
pub use electrical::ElectricalService;
pub use electrical_system::ElectricalSystemService;
pub use error::ServiceError;
pub use layout::place_new_device;
pub use position::PositionService;
pub use settings::SettingsService;
pub use tank::{RefreshReport, TankService};

/// 服务共享依赖。
#[derive(Clone)]
pub struct ServiceContext {
    /// `None` 表示仅内存运行。
    pub blob: Option<Arc<dyn BlobStore>>,
    pub plugins: Arc<PluginRegistry>,
    /// 单次插件调用上限。
    pub call_timeout: Duration,
}

impl ServiceContext {
    pub fn new(
        blob: Option<Arc<dyn BlobStore>>,
        plugins: Arc<PluginRegistry>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            blob,
            plugins,
            call_timeout,
        }
    }
}
