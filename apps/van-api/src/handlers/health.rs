//! 健康检查
//!
//! - GET /health

use crate::utils::success;
use api_contract::HealthDto;
use axum::response::Response;
use domain::now_epoch_ms;

pub async fn health() -> Response {
    success(HealthDto {
        status: "healthy".to_string(),
        timestamp: now_epoch_ms(),
    })
}
