//! 储罐 handlers
//!
//! - GET /api/tanks - 列出激活储罐
//! - POST /api/tanks - 创建储罐（自动布局）
//! - GET /api/tanks/{id} - 获取储罐（含已删除）
//! - PUT /api/tanks/{id} - 更新储罐
//! - DELETE /api/tanks/{id} - 软删除
//! - GET /api/tanks/{id}/level - 读取传感器并返回液位
//! - POST /api/tanks/refresh - 刷新全部储罐

use crate::AppState;
use crate::utils::{created, respond, service_error};
use api_contract::{RefreshDto, TankLevelDto};
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use domain::Tank;

pub async fn list_tanks(State(state): State<AppState>) -> Response {
    respond(state.tanks.list().await)
}

pub async fn create_tank(State(state): State<AppState>, Json(tank): Json<Tank>) -> Response {
    match state.tanks.create(tank).await {
        Ok(tank) => created(tank),
        Err(err) => service_error(err),
    }
}

pub async fn get_tank(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(state.tanks.get(&id).await)
}

pub async fn update_tank(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(tank): Json<Tank>,
) -> Response {
    respond(state.tanks.update(&id, tank).await)
}

pub async fn delete_tank(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(state.tanks.delete(&id).await.map(|()| serde_json::json!({ "id": id })))
}

pub async fn get_tank_level(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(
        state
            .tanks
            .refresh_level(&id)
            .await
            .map(|level| TankLevelDto { tank_id: id, level }),
    )
}

pub async fn refresh_tanks(State(state): State<AppState>) -> Response {
    respond(state.tanks.refresh_all().await.map(|report| RefreshDto {
        refreshed: report.refreshed,
        stale: report.stale,
    }))
}
