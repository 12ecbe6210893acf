//! 启动装配：插件注册表与服务实例。

use crate::AppState;
use domain::ConfigMap;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use van_config::{AppConfig, MqttDimmerConfig};
use van_plugin::{
    ModbusControlPlugin, MqttLedDimmerPlugin, PluginRegistry, SimulatedControlPlugin,
    SimulatedSensorPlugin,
};
use van_realtime::TelemetryHub;
use van_service::{
    AlertService, ControlService, ElectricalService, ElectricalSystemService, PositionService,
    ServiceContext, SettingsService, TankService,
};

/// 注册全部插件。调光器仅在配置开启时注册，并单独返回供同步任务使用。
pub fn build_registry(config: &AppConfig) -> (PluginRegistry, Option<Arc<MqttLedDimmerPlugin>>) {
    let mut registry = PluginRegistry::new()
        .with_sensor(Arc::new(SimulatedSensorPlugin::new()))
        .with_control(Arc::new(SimulatedControlPlugin::new()))
        .with_control(Arc::new(ModbusControlPlugin::new(
            Duration::from_millis(config.modbus_connect_timeout_ms),
            Duration::from_millis(config.modbus_request_timeout_ms),
        )));
    let dimmer = config.mqtt_dimmer.as_ref().map(|_| Arc::new(MqttLedDimmerPlugin::new()));
    if let Some(plugin) = &dimmer {
        registry = registry.with_control(plugin.clone());
    }
    (registry, dimmer)
}

/// 把环境变量中的调光器连接参数补入插件配置；设置文档中已有的键保持不变。
pub fn merge_dimmer_config(
    configs: &mut BTreeMap<String, ConfigMap>,
    dimmer: &MqttDimmerConfig,
) {
    let entry = configs
        .entry(MqttLedDimmerPlugin::NAME.to_string())
        .or_default();
    let mut defaults = vec![
        ("mqttBroker", json!(dimmer.host)),
        ("mqttPort", json!(dimmer.port)),
        ("baseTopic", json!(dimmer.base_topic)),
    ];
    if let Some(username) = &dimmer.username {
        defaults.push(("mqttUsername", json!(username)));
    }
    if let Some(password) = &dimmer.password {
        defaults.push(("mqttPassword", json!(password)));
    }
    for (key, value) in defaults {
        entry.entry(key.to_string()).or_insert(value);
    }
}

/// 创建并加载全部服务。位置服务先于其它服务加载，新建实体的自动布局依赖它。
pub async fn start_services(ctx: &ServiceContext, hub: TelemetryHub) -> AppState {
    let positions = Arc::new(PositionService::new(ctx));
    let tanks = Arc::new(TankService::new(ctx, positions.clone()));
    let controls = Arc::new(ControlService::new(ctx, positions.clone(), hub.clone()));
    let electrical = Arc::new(ElectricalService::new(ctx, positions.clone()));
    let electrical_system = Arc::new(ElectricalSystemService::new(ctx));
    let alerts = Arc::new(AlertService::new(tanks.clone()));
    let settings = Arc::new(SettingsService::new(ctx));

    settings.start().await;
    let position_count = positions.start().await;
    let tank_count = tanks.start().await;
    let control_count = controls.start().await;
    let (device_count, connection_count) = electrical.start().await;
    electrical_system.start().await;
    info!(
        target: "van.api",
        positions = position_count,
        tanks = tank_count,
        controls = control_count,
        electrical_devices = device_count,
        electrical_connections = connection_count,
        "services_started"
    );

    AppState {
        tanks,
        controls,
        electrical,
        electrical_system,
        positions,
        alerts,
        settings,
        plugins: ctx.plugins.clone(),
        hub,
    }
}
