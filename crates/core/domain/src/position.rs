use serde::{Deserialize, Serialize};

/// 布局位置所属的设备种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    Tank,
    Control,
    ElectricalDevice,
    #[serde(other)]
    Other,
}

/// 设备在示意图上的位置（百分比坐标）。按 device_id 唯一。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePosition {
    #[serde(default)]
    pub device_id: String,
    pub device_type: DeviceKind,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub last_updated: i64,
}
