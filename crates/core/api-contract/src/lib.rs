//! 稳定的 DTO 与 API 响应契约。
//!
//! 实体本身（Tank、Control 等）直接以领域模型的 camelCase JSON 形式返回，
//! 这里只定义请求体、查询参数与非实体的返回结构。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 健康检查返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub status: String,
    pub timestamp: i64,
}

/// 储罐液位返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TankLevelDto {
    pub tank_id: String,
    pub level: f64,
}

/// 批量刷新返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshDto {
    pub refreshed: usize,
    pub stale: usize,
}

/// 控制状态写入请求体。`state` 可以是布尔、数字或字符串。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetControlStateRequest {
    pub state: serde_json::Value,
}

/// 控制状态返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlStateDto {
    pub control_id: String,
    pub state: serde_json::Value,
    /// 仅写入时存在：插件是否接受。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
}

/// 告警列表查询参数。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertListQuery {
    #[serde(default)]
    pub include_acknowledged: bool,
}

/// 删除设备返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDeletedDto {
    pub device_id: String,
    pub connections_deactivated: usize,
}

/// 插件返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDto {
    pub name: String,
    pub version: String,
    /// `Sensor` 或 `Control`。
    pub kind: String,
}

/// 插件连接测试返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginTestDto {
    pub name: String,
    pub connected: bool,
}

/// 推送通道的客户端指令动作。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HubAction {
    Subscribe,
    Unsubscribe,
}

/// 推送通道的客户端指令：`{"action":"subscribe","channel":"tanks"}`。
#[derive(Debug, Deserialize)]
pub struct HubCommand {
    pub action: HubAction,
    pub channel: String,
}

/// 推送通道对客户端指令的应答。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubReply {
    pub ok: bool,
    pub action: String,
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
