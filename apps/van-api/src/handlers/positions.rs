//! 设备位置 handlers
//!
//! - GET /api/device-positions
//! - POST /api/device-positions - 新增或替换
//! - GET /api/device-positions/{deviceId}
//! - PUT /api/device-positions/{deviceId}
//! - DELETE /api/device-positions/{deviceId}

use crate::AppState;
use crate::utils::{bad_request_error, respond};
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use domain::DevicePosition;

pub async fn list_positions(State(state): State<AppState>) -> Response {
    respond(state.positions.list().await)
}

pub async fn upsert_position(
    State(state): State<AppState>,
    Json(position): Json<DevicePosition>,
) -> Response {
    respond(state.positions.upsert(position).await)
}

pub async fn get_position(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Response {
    respond(state.positions.get(&device_id).await)
}

pub async fn update_position(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(mut position): Json<DevicePosition>,
) -> Response {
    if position.device_id.is_empty() {
        position.device_id = device_id.clone();
    }
    if position.device_id != device_id {
        return bad_request_error(format!(
            "id mismatch: {} != {}",
            position.device_id, device_id
        ));
    }
    respond(state.positions.upsert(position).await)
}

pub async fn delete_position(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Response {
    respond(
        state
            .positions
            .delete(&device_id)
            .await
            .map(|()| serde_json::json!({ "deviceId": device_id })),
    )
}
