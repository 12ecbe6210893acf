//! 插件 handlers
//!
//! - GET /api/plugins
//! - GET /api/plugins/{name}/test

use crate::AppState;
use crate::utils::{not_found_error, success};
use api_contract::{PluginDto, PluginTestDto};
use axum::{
    extract::{Path, State},
    response::Response,
};

pub async fn list_plugins(State(state): State<AppState>) -> Response {
    let data: Vec<PluginDto> = state
        .plugins
        .list()
        .into_iter()
        .map(|info| PluginDto {
            name: info.name,
            version: info.version,
            kind: format!("{:?}", info.kind),
        })
        .collect();
    success(data)
}

pub async fn test_plugin(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.plugins.test_connection(&name).await {
        Some(connected) => success(PluginTestDto { name, connected }),
        None => not_found_error(format!("plugin {name} not found")),
    }
}
