use serde::{Deserialize, Serialize};

/// 告警级别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// 系统告警。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub timestamp: i64,
    pub severity: AlertSeverity,
    /// 来源（储罐 ID、控制 ID 或系统组件名）。
    pub source: String,
    pub message: String,
    pub acknowledged: bool,
    pub acknowledged_at: Option<i64>,
}
