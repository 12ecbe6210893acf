use domain::{
    DeviceKind, DevicePosition, ElectricalConnection, SystemConfiguration, Tank, TankType,
    ThemeMode, ManualTheme,
};
use serde_json::json;

#[test]
fn tank_accepts_minimal_payload() {
    let tank: Tank = serde_json::from_value(json!({
        "name": "Grey",
        "type": "WasteWater",
        "capacity": 80.0,
        "sensorPlugin": "Simulated Sensor Plugin",
        "sensorConfiguration": {"sensorId": "waste_water"}
    }))
    .expect("parse");
    assert_eq!(tank.tank_type, TankType::WasteWater);
    assert!(tank.is_active);
    assert_eq!(tank.low_level_threshold, 20.0);
    assert_eq!(tank.high_level_threshold, 80.0);
    assert_eq!(tank.sensor_id().as_deref(), Some("waste_water"));
}

#[test]
fn tank_level_is_clamped() {
    let mut tank: Tank = serde_json::from_value(json!({"name": "LPG", "type": "LPG"})).unwrap();
    tank.set_level(140.0);
    assert_eq!(tank.current_level, 100.0);
    tank.set_level(-5.0);
    assert_eq!(tank.current_level, 0.0);
    tank.set_level(f64::NAN);
    assert_eq!(tank.current_level, 0.0);
}

#[test]
fn tank_serializes_camel_case() {
    let tank: Tank = serde_json::from_value(json!({"name": "Fuel", "type": "Fuel"})).unwrap();
    let value = serde_json::to_value(tank).unwrap();
    assert!(value.get("currentLevel").is_some());
    assert!(value.get("isActive").is_some());
    assert_eq!(value.get("type"), Some(&json!("Fuel")));
}

#[test]
fn connection_defaults_and_references() {
    let connection: ElectricalConnection = serde_json::from_value(json!({
        "sourceDeviceId": "a",
        "targetDeviceId": "b"
    }))
    .unwrap();
    assert_eq!(connection.color, "#2196F3");
    assert_eq!(connection.line_width, 2.0);
    assert!(connection.references("a"));
    assert!(connection.references("b"));
    assert!(!connection.references("c"));
}

#[test]
fn unknown_position_kind_maps_to_other() {
    let position: DevicePosition = serde_json::from_value(json!({
        "deviceId": "x",
        "deviceType": "Overlay",
        "x": 10.0,
        "y": 20.0
    }))
    .unwrap();
    assert_eq!(position.device_type, DeviceKind::Other);
}

#[test]
fn legacy_theme_is_imported_once() {
    let config = SystemConfiguration::from_stored(json!({
        "vanModel": "VW Crafter",
        "theme": "Dark"
    }))
    .unwrap();
    assert_eq!(config.van_model, "VW Crafter");
    assert_eq!(config.theme_mode, ThemeMode::Manual);
    assert_eq!(config.manual_theme, ManualTheme::Dark);
    let value = serde_json::to_value(&config).unwrap();
    assert!(value.get("theme").is_none());
}

#[test]
fn theme_mode_wins_over_legacy_theme() {
    let config = SystemConfiguration::from_stored(json!({
        "theme": "Dark",
        "themeMode": "BrowserAuto"
    }))
    .unwrap();
    assert_eq!(config.theme_mode, ThemeMode::BrowserAuto);
    assert_eq!(config.manual_theme, ManualTheme::Light);
}
