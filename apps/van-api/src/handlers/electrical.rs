//! 电气系统 handlers
//!
//! 设备：
//! - GET/POST /api/electrical/devices
//! - GET/PUT/DELETE /api/electrical/devices/{id}（删除会停用相关连接）
//!
//! 连接：
//! - GET/POST /api/electrical/connections
//! - GET/PUT/DELETE /api/electrical/connections/{id}
//!
//! 运行时读数：
//! - GET /api/electrical/metrics - 设备 ID → 指标
//! - GET /api/electrical/flows - 连接 ID → 电流
//!
//! 电池系统汇总：
//! - GET/PUT /api/electrical
//! - POST /api/electrical/refresh - 从传感器刷新并返回汇总

use crate::AppState;
use crate::utils::{created, respond, service_error};
use api_contract::DeviceDeletedDto;
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use domain::{ElectricalConnection, ElectricalDevice, ElectricalSystem};

pub async fn list_electrical_devices(State(state): State<AppState>) -> Response {
    respond(state.electrical.list_devices().await)
}

pub async fn create_electrical_device(
    State(state): State<AppState>,
    Json(device): Json<ElectricalDevice>,
) -> Response {
    match state.electrical.create_device(device).await {
        Ok(device) => created(device),
        Err(err) => service_error(err),
    }
}

pub async fn get_electrical_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    respond(state.electrical.get_device(&id).await)
}

pub async fn update_electrical_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(device): Json<ElectricalDevice>,
) -> Response {
    respond(state.electrical.update_device(&id, device).await)
}

pub async fn delete_electrical_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    respond(
        state
            .electrical
            .delete_device(&id)
            .await
            .map(|connections_deactivated| DeviceDeletedDto {
                device_id: id,
                connections_deactivated,
            }),
    )
}

pub async fn list_electrical_connections(State(state): State<AppState>) -> Response {
    respond(state.electrical.list_connections().await)
}

pub async fn create_electrical_connection(
    State(state): State<AppState>,
    Json(connection): Json<ElectricalConnection>,
) -> Response {
    match state.electrical.create_connection(connection).await {
        Ok(connection) => created(connection),
        Err(err) => service_error(err),
    }
}

pub async fn get_electrical_connection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    respond(state.electrical.get_connection(&id).await)
}

pub async fn update_electrical_connection(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(connection): Json<ElectricalConnection>,
) -> Response {
    respond(state.electrical.update_connection(&id, connection).await)
}

pub async fn delete_electrical_connection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    respond(
        state
            .electrical
            .delete_connection(&id)
            .await
            .map(|()| serde_json::json!({ "id": id })),
    )
}

pub async fn get_electrical_metrics(State(state): State<AppState>) -> Response {
    respond(state.electrical.device_metrics().await)
}

pub async fn get_electrical_flows(State(state): State<AppState>) -> Response {
    respond(state.electrical.connection_flows().await)
}

pub async fn get_electrical_system(State(state): State<AppState>) -> Response {
    respond(state.electrical_system.get().await)
}

pub async fn update_electrical_system(
    State(state): State<AppState>,
    Json(system): Json<ElectricalSystem>,
) -> Response {
    respond(state.electrical_system.update(system).await)
}

pub async fn refresh_electrical_system(State(state): State<AppState>) -> Response {
    respond(state.electrical_system.refresh().await)
}
