//! 告警 handlers
//!
//! - GET /api/alerts?includeAcknowledged=true|false
//! - GET /api/alerts/{id}
//! - DELETE /api/alerts/{id}
//! - POST /api/alerts/{id}/acknowledge
//! - POST /api/alerts/check - 立即评估全部储罐

use crate::AppState;
use crate::utils::{respond, success};
use api_contract::AlertListQuery;
use axum::{
    extract::{Path, Query, State},
    response::Response,
};

pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertListQuery>,
) -> Response {
    success(state.alerts.list(query.include_acknowledged).await)
}

pub async fn get_alert(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(state.alerts.get(&id).await)
}

pub async fn acknowledge_alert(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(state.alerts.acknowledge(&id).await)
}

pub async fn delete_alert(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(state.alerts.delete(&id).await.map(|()| serde_json::json!({ "id": id })))
}

pub async fn check_alerts(State(state): State<AppState>) -> Response {
    respond(state.alerts.check_tank_alerts().await)
}
