//! 房车遥测后端：REST API、`/hubs/telemetry` 推送通道与后台轮询。

mod bootstrap;
mod handlers;
mod middleware;
mod routes;
mod utils;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;
use van_config::{AppConfig, PersistenceMode};
use van_plugin::PluginRegistry;
use van_poller::TelemetryPoller;
use van_realtime::TelemetryHub;
use van_service::{
    AlertService, ControlService, DimmerSync, ElectricalService, ElectricalSystemService,
    PositionService, ServiceContext, SettingsService, TankService,
};
use van_storage::{BlobStore, InMemoryBlobStore, JsonFileStore};
use van_telemetry::init_tracing;

#[derive(Clone)]
pub struct AppState {
    pub tanks: Arc<TankService>,
    pub controls: Arc<ControlService>,
    pub electrical: Arc<ElectricalService>,
    pub electrical_system: Arc<ElectricalSystemService>,
    pub positions: Arc<PositionService>,
    pub alerts: Arc<AlertService>,
    pub settings: Arc<SettingsService>,
    pub plugins: Arc<PluginRegistry>,
    pub hub: TelemetryHub,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    let blob: Arc<dyn BlobStore> = match config.persistence {
        PersistenceMode::Json => Arc::new(JsonFileStore::new(config.data_dir.clone())),
        PersistenceMode::Memory => Arc::new(InMemoryBlobStore::new()),
    };

    let (registry, dimmer) = bootstrap::build_registry(&config);
    let plugins = Arc::new(registry);
    let hub = TelemetryHub::new(config.hub_capacity);
    let ctx = ServiceContext::new(
        Some(blob),
        plugins.clone(),
        Duration::from_millis(config.plugin_call_timeout_ms),
    );
    let state = bootstrap::start_services(&ctx, hub.clone()).await;

    // 插件配置：设置文档优先，MQTT 调光器缺省项来自环境变量
    let mut plugin_configs = state.settings.plugin_configurations().await?;
    if let Some(dimmer_config) = &config.mqtt_dimmer {
        bootstrap::merge_dimmer_config(&mut plugin_configs, dimmer_config);
    }
    let initialized = plugins.initialize_all(&plugin_configs).await;
    tracing::info!(
        target: "van.api",
        plugins = plugins.list().len(),
        initialized = initialized,
        "plugins_ready"
    );

    // 后台轮询：刷新读数 → 推送 → 告警评估
    let poller = TelemetryPoller::new(
        state.tanks.clone(),
        state.electrical.clone(),
        state.electrical_system.clone(),
        state.alerts.clone(),
        hub,
    );
    let _poll_task = poller.spawn(Duration::from_secs(config.refresh_interval_seconds));

    let _dimmer_tasks = match (dimmer, &config.mqtt_dimmer) {
        (Some(plugin), Some(dimmer_config)) => {
            let sync = Arc::new(DimmerSync::new(
                plugin,
                state.controls.clone(),
                Duration::from_secs(dimmer_config.discovery_interval_seconds),
                Duration::from_secs(dimmer_config.state_refresh_interval_seconds),
            ));
            Some(sync.spawn())
        }
        _ => None,
    };

    let app = routes::create_router(state, config.cors_allow_any);
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!(target: "van.api", addr = %config.http_addr, "http_listening");
    axum::serve(listener, app).await?;
    Ok(())
}
