//! 控制 handlers
//!
//! - GET /api/controls - 列出激活控制
//! - POST /api/controls - 创建控制（自动布局）
//! - GET /api/controls/{id} - 获取控制（含已删除）
//! - PUT /api/controls/{id} - 更新控制
//! - DELETE /api/controls/{id} - 软删除
//! - GET /api/controls/{id}/state - 读取硬件状态（失败时返回缓存值）
//! - POST /api/controls/{id}/state - 写入状态，`{"state": true | 50 | "x"}`
//! - POST /api/controls/refresh - 读取全部控制的硬件状态

use crate::AppState;
use crate::utils::{bad_request_error, created, respond, service_error, success};
use api_contract::{ControlStateDto, RefreshDto, SetControlStateRequest};
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use domain::{Control, ControlValue};

pub async fn list_controls(State(state): State<AppState>) -> Response {
    respond(state.controls.list().await)
}

pub async fn create_control(
    State(state): State<AppState>,
    Json(control): Json<Control>,
) -> Response {
    match state.controls.create(control).await {
        Ok(control) => created(control),
        Err(err) => service_error(err),
    }
}

pub async fn get_control(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(state.controls.get(&id).await)
}

pub async fn update_control(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(control): Json<Control>,
) -> Response {
    respond(state.controls.update(&id, control).await)
}

pub async fn delete_control(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(state.controls.delete(&id).await.map(|()| serde_json::json!({ "id": id })))
}

pub async fn get_control_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    respond(
        state
            .controls
            .get_state(&id)
            .await
            .map(|value| state_dto(id, &value, None)),
    )
}

pub async fn set_control_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetControlStateRequest>,
) -> Response {
    let value = ControlValue::from(req.state);
    match state.controls.set_state(&id, value).await {
        Ok(true) => {
            // 返回归一后的状态
            let stored = match state.controls.get(&id).await {
                Ok(control) => control.state,
                Err(err) => return service_error(err),
            };
            success(state_dto(id, &stored, Some(true)))
        }
        Ok(false) => bad_request_error("failed to set control state"),
        Err(err) => service_error(err),
    }
}

pub async fn refresh_controls(State(state): State<AppState>) -> Response {
    respond(state.controls.refresh_all().await.map(|report| RefreshDto {
        refreshed: report.refreshed,
        stale: report.stale,
    }))
}

fn state_dto(control_id: String, value: &ControlValue, accepted: Option<bool>) -> ControlStateDto {
    ControlStateDto {
        control_id,
        state: serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        accepted,
    }
}
