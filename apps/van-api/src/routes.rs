//! 路由定义
//!
//! 集中管理所有路由，将路径映射到对应的 handlers：
//! - 健康检查：/health
//! - 储罐：/api/tanks/*
//! - 控制：/api/controls/*
//! - 电气：/api/electrical/*
//! - 布局：/api/device-positions/*
//! - 告警：/api/alerts/*
//! - 设置：/api/settings/*
//! - 插件：/api/plugins/*
//! - 计数器：/api/metrics
//! - 推送通道：/hubs/telemetry

use super::AppState;
use super::handlers::*;
use super::middleware::request_context;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// 创建 /api 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/tanks", get(list_tanks).post(create_tank))
        .route("/tanks/refresh", post(refresh_tanks))
        .route(
            "/tanks/:id",
            get(get_tank).put(update_tank).delete(delete_tank),
        )
        .route("/tanks/:id/level", get(get_tank_level))
        .route("/controls", get(list_controls).post(create_control))
        .route("/controls/refresh", post(refresh_controls))
        .route(
            "/controls/:id",
            get(get_control).put(update_control).delete(delete_control),
        )
        .route(
            "/controls/:id/state",
            get(get_control_state).post(set_control_state),
        )
        .route(
            "/electrical",
            get(get_electrical_system).put(update_electrical_system),
        )
        .route("/electrical/refresh", post(refresh_electrical_system))
        .route(
            "/electrical/devices",
            get(list_electrical_devices).post(create_electrical_device),
        )
        .route(
            "/electrical/devices/:id",
            get(get_electrical_device)
                .put(update_electrical_device)
                .delete(delete_electrical_device),
        )
        .route(
            "/electrical/connections",
            get(list_electrical_connections).post(create_electrical_connection),
        )
        .route(
            "/electrical/connections/:id",
            get(get_electrical_connection)
                .put(update_electrical_connection)
                .delete(delete_electrical_connection),
        )
        .route("/electrical/metrics", get(get_electrical_metrics))
        .route("/electrical/flows", get(get_electrical_flows))
        .route(
            "/device-positions",
            get(list_positions).post(upsert_position),
        )
        .route(
            "/device-positions/:device_id",
            get(get_position).put(update_position).delete(delete_position),
        )
        .route("/alerts", get(list_alerts))
        .route("/alerts/check", post(check_alerts))
        .route("/alerts/:id", get(get_alert).delete(delete_alert))
        .route("/alerts/:id/acknowledge", post(acknowledge_alert))
        .route("/settings", get(get_settings).put(update_settings))
        .route("/settings/van-diagrams", get(get_van_diagrams))
        .route("/plugins", get(list_plugins))
        .route("/plugins/:name/test", get(test_plugin))
        .route("/metrics", get(get_metrics))
}

/// 组装完整应用：路由、请求上下文、访问日志与跨域
pub fn create_router(state: AppState, cors_allow_any: bool) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/hubs/telemetry", get(telemetry_hub))
        .nest("/api", create_api_router())
        .with_state(state)
        // 注入 request_id/trace_id
        .layer(middleware::from_fn(request_context))
        .layer(TraceLayer::new_for_http());
    if cors_allow_any {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
