use domain::{ConfigMap, ControlValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use van_plugin::{
    ControlPlugin, HardwarePlugin, ModbusControlPlugin, PluginKind, PluginRegistry, SensorPlugin,
    SimulatedControlPlugin, SimulatedSensorPlugin,
};

fn registry() -> PluginRegistry {
    PluginRegistry::new()
        .with_sensor(Arc::new(SimulatedSensorPlugin::new()))
        .with_control(Arc::new(SimulatedControlPlugin::new()))
        .with_control(Arc::new(ModbusControlPlugin::new(
            Duration::from_millis(200),
            Duration::from_millis(200),
        )))
}

#[test]
fn lookup_respects_capability_kind() {
    let registry = registry();
    assert!(registry.sensor(SimulatedSensorPlugin::NAME).is_some());
    assert!(registry.control(SimulatedSensorPlugin::NAME).is_none());
    assert!(registry.control(SimulatedControlPlugin::NAME).is_some());
    assert!(registry.sensor("missing").is_none());
    assert_eq!(
        registry.get(ModbusControlPlugin::NAME).map(|handle| handle.kind()),
        Some(PluginKind::Control)
    );
}

#[test]
fn list_is_sorted_by_name() {
    let names: Vec<String> = registry().list().into_iter().map(|info| info.name).collect();
    assert_eq!(
        names,
        vec![
            ModbusControlPlugin::NAME.to_string(),
            SimulatedControlPlugin::NAME.to_string(),
            SimulatedSensorPlugin::NAME.to_string(),
        ]
    );
}

#[tokio::test]
async fn initialize_all_counts_successes() {
    let registry = registry();
    let initialized = registry.initialize_all(&BTreeMap::new()).await;
    assert_eq!(initialized, 3);
}

#[tokio::test]
async fn test_connection_for_unknown_plugin_is_none() {
    let registry = registry();
    assert_eq!(registry.test_connection("missing").await, None);
    assert_eq!(
        registry.test_connection(SimulatedSensorPlugin::NAME).await,
        Some(true)
    );
}

#[tokio::test]
async fn simulated_control_remembers_state() {
    let plugin = SimulatedControlPlugin::new();
    let config = ConfigMap::new();
    assert_eq!(
        plugin.get_state("light_main", &config).await.expect("get"),
        ControlValue::Bool(false)
    );
    assert!(
        plugin
            .set_state("light_main", &config, &ControlValue::Bool(true))
            .await
            .expect("set")
    );
    assert_eq!(
        plugin.get_state("light_main", &config).await.expect("get"),
        ControlValue::Bool(true)
    );
    assert_eq!(plugin.name(), "Simulated Control Plugin");
}

#[tokio::test]
async fn simulated_sensor_reads_all_channels() {
    let plugin = SimulatedSensorPlugin::new();
    let values = plugin.read_all_values().await.expect("values");
    assert!(values.contains_key("fresh_water"));
    assert!(values.contains_key("battery_voltage"));
    assert_eq!(plugin.read_value("unknown").await.expect("value"), 0.0);
}
