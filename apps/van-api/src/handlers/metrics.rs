//! Telemetry 计数器快照。
//!
//! - GET /api/metrics

use crate::utils::success;
use axum::response::Response;
use van_telemetry::metrics;

pub async fn get_metrics() -> Response {
    success(metrics().snapshot())
}
