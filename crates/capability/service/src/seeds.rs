//! 首次启动时写入的默认实体。

use domain::{
    ConfigMap, Control, ControlType, ControlValue, ElectricalSystem, Tank, TankType,
    new_entity_id, now_epoch_ms,
};
use van_plugin::{SimulatedControlPlugin, SimulatedSensorPlugin};

fn single(key: &str, value: &str) -> ConfigMap {
    ConfigMap::from([(key.to_string(), serde_json::Value::String(value.to_string()))])
}

fn tank(name: &str, tank_type: TankType, capacity: f64, level: f64, sensor_id: &str) -> Tank {
    Tank {
        id: new_entity_id(),
        name: name.to_string(),
        tank_type,
        current_level: level,
        capacity,
        low_level_threshold: 20.0,
        high_level_threshold: 80.0,
        sensor_plugin: SimulatedSensorPlugin::NAME.to_string(),
        sensor_configuration: single("sensorId", sensor_id),
        last_updated: now_epoch_ms(),
        is_active: true,
    }
}

pub fn default_tanks() -> Vec<Tank> {
    vec![
        tank("Fresh Water", TankType::FreshWater, 100.0, 75.0, "fresh_water"),
        tank("Waste Water", TankType::WasteWater, 80.0, 25.0, "waste_water"),
        tank("LPG", TankType::Lpg, 30.0, 60.0, "lpg"),
    ]
}

fn control(
    name: &str,
    control_type: ControlType,
    state: ControlValue,
    control_id: &str,
    icon: &str,
) -> Control {
    Control {
        id: new_entity_id(),
        name: name.to_string(),
        control_type,
        state,
        control_plugin: SimulatedControlPlugin::NAME.to_string(),
        control_configuration: single("controlId", control_id),
        icon_name: icon.to_string(),
        last_updated: now_epoch_ms(),
        is_active: true,
    }
}

pub fn default_controls() -> Vec<Control> {
    vec![
        control(
            "Main Lights",
            ControlType::Toggle,
            ControlValue::Bool(false),
            "light_main",
            "lightbulb",
        ),
        control(
            "Dimmer Lights",
            ControlType::Dimmer,
            ControlValue::Level(0),
            "light_dimmer",
            "light_mode",
        ),
        control(
            "Water Pump",
            ControlType::Toggle,
            ControlValue::Bool(false),
            "water_pump",
            "water_drop",
        ),
        control(
            "Heater",
            ControlType::Toggle,
            ControlValue::Bool(false),
            "heater",
            "thermostat",
        ),
    ]
}

/// 默认电池系统：读数来自模拟器的电池与太阳能通道。
pub fn default_electrical_system() -> ElectricalSystem {
    let sensor_configuration = [
        ("voltage_sensor", "battery_voltage"),
        ("current_sensor", "battery_current"),
        ("soc_sensor", "battery_soc"),
        ("temperature_sensor", "battery_temperature"),
        ("solar_power_sensor", "solar_power"),
    ]
    .into_iter()
    .map(|(key, channel)| (key.to_string(), serde_json::Value::String(channel.to_string())))
    .collect();
    ElectricalSystem {
        id: new_entity_id(),
        name: "Main Battery System".to_string(),
        voltage: 12.6,
        current: -5.0,
        power: -63.0,
        state_of_charge: 75.0,
        temperature: 22.0,
        consumed_amp_hours: 25.0,
        time_to_go: 36_000,
        solar_power: 0.0,
        solar_voltage: 0.0,
        solar_current: 0.0,
        ac_input_power: 0.0,
        ac_output_power: 0.0,
        sensor_plugin: SimulatedSensorPlugin::NAME.to_string(),
        sensor_configuration,
        last_updated: now_epoch_ms(),
        is_active: true,
    }
}
