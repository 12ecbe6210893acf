use crate::{ConfigMap, default_true};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 电气设备类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElectricalDeviceType {
    Battery,
    #[serde(rename = "SolarMPPT")]
    SolarMppt,
    #[serde(rename = "DCDCCharger")]
    DcDcCharger,
    Inverter,
    ShoreCharger,
    LoadOutput,
    Controller,
}

/// 端口方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PortType {
    #[default]
    Input,
    Output,
    Bidirectional,
}

/// 端口能量类型标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnergyType {
    #[default]
    #[serde(rename = "DC")]
    Dc,
    #[serde(rename = "AC")]
    Ac,
    Solar,
    Data,
}

/// 设备卡片上的连接端口（相对坐标 0–1）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicePort {
    pub port_id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub port_type: PortType,
    #[serde(default)]
    pub energy_type: EnergyType,
    #[serde(default)]
    pub relative_x: f64,
    #[serde(default)]
    pub relative_y: f64,
}

/// 电气设备。`current_metrics` 为运行时读数，不落盘。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectricalDevice {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub device_type: ElectricalDeviceType,
    #[serde(default)]
    pub configuration: ConfigMap,
    #[serde(default)]
    pub ports: Vec<DevicePort>,
    #[serde(default)]
    pub data_source_plugin: String,
    /// 指标名 → 传感器通道 ID。
    #[serde(default)]
    pub data_source_configuration: ConfigMap,
    #[serde(default)]
    pub current_metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub last_updated: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// 两个设备端口之间的电气连接。流量字段为运行时推导值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectricalConnection {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub source_device_id: String,
    #[serde(default)]
    pub source_port_id: String,
    pub target_device_id: String,
    #[serde(default)]
    pub target_port_id: String,
    #[serde(default)]
    pub current_flow: f64,
    #[serde(default)]
    pub power_flow: f64,
    #[serde(default)]
    pub is_flowing: bool,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_line_width")]
    pub line_width: f64,
    #[serde(default)]
    pub last_updated: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ElectricalConnection {
    /// 是否引用了指定设备（源或目标）。
    pub fn references(&self, device_id: &str) -> bool {
        self.source_device_id == device_id || self.target_device_id == device_id
    }
}

fn default_color() -> String {
    "#2196F3".to_string()
}

fn default_line_width() -> f64 {
    2.0
}

/// 电池系统汇总（单例）。`sensor_configuration` 为“读数键 → 传感器通道 ID”。
///
/// 电流为正表示充电、为负表示放电；`time_to_go` 为放电到空的秒数，充电或
/// 静置时为 0。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectricalSystem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub voltage: f64,
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub power: f64,
    #[serde(default)]
    pub state_of_charge: f64,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub consumed_amp_hours: f64,
    #[serde(default)]
    pub time_to_go: i64,
    #[serde(default)]
    pub solar_power: f64,
    #[serde(default)]
    pub solar_voltage: f64,
    #[serde(default)]
    pub solar_current: f64,
    #[serde(default)]
    pub ac_input_power: f64,
    #[serde(default)]
    pub ac_output_power: f64,
    #[serde(default)]
    pub sensor_plugin: String,
    #[serde(default)]
    pub sensor_configuration: ConfigMap,
    #[serde(default)]
    pub last_updated: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}
