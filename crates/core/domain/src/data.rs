use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// 控制状态值。
///
/// 开关类控制使用 `Bool`，调光/选择类使用 `Level`（0–100），
/// 其它插件自定义值使用 `Text`。JSON 形式不带标签：`true`、`50`、`"x"`。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlValue {
    Bool(bool),
    Level(u8),
    Text(String),
}

impl ControlValue {
    /// 按布尔语义解释：非零为真，字符串接受 true/1/on，其它一律为假。
    pub fn as_bool(&self) -> bool {
        match self {
            ControlValue::Bool(value) => *value,
            ControlValue::Level(value) => *value != 0,
            ControlValue::Text(value) => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "on"
            ),
        }
    }

    /// 按百分比解释：布尔映射为 100/0，字符串解析失败为 0。
    pub fn as_level(&self) -> u8 {
        match self {
            ControlValue::Bool(true) => 100,
            ControlValue::Bool(false) => 0,
            ControlValue::Level(value) => (*value).min(100),
            ControlValue::Text(value) => match value.trim().parse::<f64>() {
                Ok(number) => clamp_level(number),
                Err(_) => 0,
            },
        }
    }
}

impl Default for ControlValue {
    fn default() -> Self {
        ControlValue::Bool(false)
    }
}

impl From<bool> for ControlValue {
    fn from(value: bool) -> Self {
        ControlValue::Bool(value)
    }
}

impl From<u8> for ControlValue {
    fn from(value: u8) -> Self {
        ControlValue::Level(value.min(100))
    }
}

impl From<Value> for ControlValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(value) => ControlValue::Bool(value),
            Value::Number(number) => ControlValue::Level(clamp_level(number.as_f64().unwrap_or(0.0))),
            Value::String(value) => ControlValue::Text(value),
            _ => ControlValue::Bool(false),
        }
    }
}

impl<'de> Deserialize<'de> for ControlValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(ControlValue::from(value))
    }
}

fn clamp_level(number: f64) -> u8 {
    if !number.is_finite() {
        return 0;
    }
    number.round().clamp(0.0, 100.0) as u8
}
