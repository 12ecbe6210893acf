use crate::{ConfigMap, default_true};
use serde::{Deserialize, Serialize};

/// 储罐类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TankType {
    FreshWater,
    WasteWater,
    #[serde(rename = "LPG", alias = "Lpg")]
    Lpg,
    Fuel,
    Battery,
}

impl TankType {
    /// 消耗型储罐（低液位告警）；灰水箱为满溢告警。
    pub fn is_consumable(&self) -> bool {
        !matches!(self, TankType::WasteWater)
    }
}

/// 储罐（清水、灰水、液化气、燃油、电池电量）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tank {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub tank_type: TankType,
    /// 百分比液位，始终在 [0,100]。
    #[serde(default)]
    pub current_level: f64,
    /// 容量（升）。
    #[serde(default)]
    pub capacity: f64,
    #[serde(default = "default_low_threshold")]
    pub low_level_threshold: f64,
    #[serde(default = "default_high_threshold")]
    pub high_level_threshold: f64,
    #[serde(default)]
    pub sensor_plugin: String,
    #[serde(default)]
    pub sensor_configuration: ConfigMap,
    #[serde(default)]
    pub last_updated: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Tank {
    /// 写入液位，超出范围时截断到 [0,100]。
    pub fn set_level(&mut self, level: f64) {
        self.current_level = clamp_percent(level);
    }

    /// 传感器通道 ID（配置键 `sensorId`）。
    pub fn sensor_id(&self) -> Option<String> {
        crate::config_str(&self.sensor_configuration, "sensorId")
    }
}

pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

fn default_low_threshold() -> f64 {
    20.0
}

fn default_high_threshold() -> f64 {
    80.0
}
