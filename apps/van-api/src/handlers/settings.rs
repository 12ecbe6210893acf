//! 系统设置 handlers
//!
//! - GET /api/settings
//! - PUT /api/settings - 接受旧版 `theme` 字段并折算
//! - GET /api/settings/van-diagrams

use crate::AppState;
use crate::utils::{bad_request_error, respond, success};
use axum::{Json, extract::State, response::Response};
use domain::SystemConfiguration;

pub async fn get_settings(State(state): State<AppState>) -> Response {
    respond(state.settings.get().await)
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let settings = match SystemConfiguration::from_stored(body) {
        Ok(settings) => settings,
        Err(err) => return bad_request_error(format!("invalid settings: {err}")),
    };
    respond(state.settings.update(settings).await)
}

pub async fn get_van_diagrams(State(state): State<AppState>) -> Response {
    success(state.settings.available_van_diagrams())
}
