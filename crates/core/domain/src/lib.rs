//! 领域模型：储罐、控制、电气设备、告警、布局位置与系统设置。
//!
//! 所有实体以 camelCase JSON 序列化，时间戳统一为 UTC 毫秒（i64），
//! 实体 ID 为 UUID v4 字符串。

pub mod alert;
pub mod control;
pub mod data;
pub mod electrical;
pub mod position;
pub mod settings;
pub mod tank;

use std::collections::BTreeMap;

pub use alert::{Alert, AlertSeverity};
pub use control::{Control, ControlType};
pub use data::ControlValue;
pub use electrical::{
    DevicePort, ElectricalConnection, ElectricalDevice, ElectricalDeviceType, ElectricalSystem,
    EnergyType, PortType,
};
pub use position::{DeviceKind, DevicePosition};
pub use settings::{
    AlertSettings, DrivingSide, ManualTheme, SystemConfiguration, ThemeMode, ToolbarPosition,
};
pub use tank::{Tank, TankType};

/// 插件配置：不透明的键值表。
pub type ConfigMap = BTreeMap<String, serde_json::Value>;

/// 当前 UTC 毫秒时间戳。
pub fn now_epoch_ms() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as i64
}

/// 生成新的实体 ID。
pub fn new_entity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 读取配置表中的字符串值（数字也按字符串返回）。
pub fn config_str(config: &ConfigMap, key: &str) -> Option<String> {
    match config.get(key)? {
        serde_json::Value::String(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        serde_json::Value::Number(value) => Some(value.to_string()),
        serde_json::Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

/// 读取配置表中的整数值（字符串形式的数字也接受）。
pub fn config_u64(config: &ConfigMap, key: &str) -> Option<u64> {
    match config.get(key)? {
        serde_json::Value::Number(value) => value.as_u64(),
        serde_json::Value::String(value) => value.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn default_true() -> bool {
    true
}
