//! 追踪、请求 ID 生成与进程内计数器。

use serde::Serialize;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 计数器快照。
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub poll_cycles: u64,
    pub poll_cycle_failures: u64,
    pub poll_cycle_ms_total: u64,
    pub plugin_call_failures: u64,
    pub plugin_timeouts: u64,
    pub alerts_created: u64,
    pub hub_messages_published: u64,
    pub persistence_failures: u64,
    pub control_state_changes: u64,
}

/// 进程内计数器。
pub struct TelemetryMetrics {
    poll_cycles: AtomicU64,
    poll_cycle_failures: AtomicU64,
    poll_cycle_ms_total: AtomicU64,
    plugin_call_failures: AtomicU64,
    plugin_timeouts: AtomicU64,
    alerts_created: AtomicU64,
    hub_messages_published: AtomicU64,
    persistence_failures: AtomicU64,
    control_state_changes: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            poll_cycles: AtomicU64::new(0),
            poll_cycle_failures: AtomicU64::new(0),
            poll_cycle_ms_total: AtomicU64::new(0),
            plugin_call_failures: AtomicU64::new(0),
            plugin_timeouts: AtomicU64::new(0),
            alerts_created: AtomicU64::new(0),
            hub_messages_published: AtomicU64::new(0),
            persistence_failures: AtomicU64::new(0),
            control_state_changes: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            poll_cycles: self.poll_cycles.load(Ordering::Relaxed),
            poll_cycle_failures: self.poll_cycle_failures.load(Ordering::Relaxed),
            poll_cycle_ms_total: self.poll_cycle_ms_total.load(Ordering::Relaxed),
            plugin_call_failures: self.plugin_call_failures.load(Ordering::Relaxed),
            plugin_timeouts: self.plugin_timeouts.load(Ordering::Relaxed),
            alerts_created: self.alerts_created.load(Ordering::Relaxed),
            hub_messages_published: self.hub_messages_published.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            control_state_changes: self.control_state_changes.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局计数器实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录一次完成的轮询周期及其耗时（毫秒）。
pub fn record_poll_cycle(elapsed_ms: u64) {
    let metrics = metrics();
    metrics.poll_cycles.fetch_add(1, Ordering::Relaxed);
    metrics
        .poll_cycle_ms_total
        .fetch_add(elapsed_ms, Ordering::Relaxed);
}

/// 记录轮询周期失败次数。
pub fn record_poll_cycle_failure() {
    metrics().poll_cycle_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录插件调用失败次数（含插件缺失）。
pub fn record_plugin_call_failure() {
    metrics()
        .plugin_call_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录插件调用超时次数。
pub fn record_plugin_timeout() {
    metrics().plugin_timeouts.fetch_add(1, Ordering::Relaxed);
}

/// 记录新建告警次数（去重命中不计）。
pub fn record_alert_created() {
    metrics().alerts_created.fetch_add(1, Ordering::Relaxed);
}

/// 记录推送消息次数。
pub fn record_hub_message() {
    metrics()
        .hub_messages_published
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录持久化失败次数。
pub fn record_persistence_failure() {
    metrics()
        .persistence_failures
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录控制状态变更次数。
pub fn record_control_state_change() {
    metrics()
        .control_state_changes
        .fetch_add(1, Ordering::Relaxed);
}
