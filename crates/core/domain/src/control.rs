use crate::{ConfigMap, ControlValue, default_true};
use serde::{Deserialize, Serialize};

/// 控制类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlType {
    Toggle,
    Momentary,
    Dimmer,
    Selector,
}

/// 控制（开关、调光、按钮、选择器）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Control {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub control_type: ControlType,
    #[serde(default)]
    pub state: ControlValue,
    #[serde(default)]
    pub control_plugin: String,
    #[serde(default)]
    pub control_configuration: ConfigMap,
    #[serde(default)]
    pub icon_name: String,
    #[serde(default)]
    pub last_updated: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Control {
    /// 插件侧控制 ID（配置键 `controlId`）。
    pub fn control_id(&self) -> Option<String> {
        crate::config_str(&self.control_configuration, "controlId")
    }
}
