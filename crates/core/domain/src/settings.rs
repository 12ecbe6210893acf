use crate::ConfigMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 工具栏位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToolbarPosition {
    #[default]
    Left,
    Right,
    Bottom,
}

/// 驾驶侧（影响默认工具栏位置）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrivingSide {
    #[default]
    Left,
    Right,
}

/// 主题决定方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThemeMode {
    #[default]
    Manual,
    BrowserAuto,
    HeadlightsAuto,
}

/// 手动模式下的主题。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ManualTheme {
    #[default]
    Light,
    Dark,
}

/// 告警相关设置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertSettings {
    pub enable_audio_alerts: bool,
    pub enable_push_notifications: bool,
    pub tank_low_level_threshold: f64,
    pub tank_high_level_threshold: f64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            enable_audio_alerts: true,
            enable_push_notifications: false,
            tank_low_level_threshold: 10.0,
            tank_high_level_threshold: 90.0,
        }
    }
}

/// 系统配置（单例）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemConfiguration {
    pub van_model: String,
    pub van_diagram_path: String,
    pub toolbar_position: ToolbarPosition,
    pub driving_side: DrivingSide,
    pub theme_mode: ThemeMode,
    pub manual_theme: ManualTheme,
    pub enable_fullscreen_on_startup: bool,
    pub show_fullscreen_toggle: bool,
    pub alert_settings: AlertSettings,
    /// 插件名 → 插件配置。
    pub plugin_configurations: BTreeMap<String, ConfigMap>,
    pub last_updated: i64,
}

impl Default for SystemConfiguration {
    fn default() -> Self {
        Self {
            van_model: "Mercedes Sprinter LWB".to_string(),
            van_diagram_path: "/diagrams/sprinter-lwb.svg".to_string(),
            toolbar_position: ToolbarPosition::Left,
            driving_side: DrivingSide::Left,
            theme_mode: ThemeMode::Manual,
            manual_theme: ManualTheme::Light,
            enable_fullscreen_on_startup: true,
            show_fullscreen_toggle: true,
            alert_settings: AlertSettings::default(),
            plugin_configurations: BTreeMap::new(),
            last_updated: 0,
        }
    }
}

impl SystemConfiguration {
    /// 从已存储的 JSON 解析，旧版 `theme` 字符串折算为 `themeMode` + `manualTheme`。
    ///
    /// 仅当文档中没有 `themeMode` 时才读取 `theme`；折算后该字段被丢弃。
    pub fn from_stored(mut value: Value) -> Result<Self, serde_json::Error> {
        migrate_legacy_theme(&mut value);
        serde_json::from_value(value)
    }
}

/// 旧版主题字段迁移。
pub fn migrate_legacy_theme(value: &mut Value) {
    let Some(object) = value.as_object_mut() else {
        return;
    };
    let legacy = object.remove("theme");
    if object.contains_key("themeMode") {
        return;
    }
    let Some(Value::String(theme)) = legacy else {
        return;
    };
    let manual = if theme.trim().eq_ignore_ascii_case("dark") {
        "Dark"
    } else {
        "Light"
    };
    object.insert("themeMode".to_string(), Value::String("Manual".to_string()));
    object.insert("manualTheme".to_string(), Value::String(manual.to_string()));
}
