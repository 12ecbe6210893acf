//! 模拟插件
//!
//! 传感器读数是“起始时间 + 当前时间”的纯函数：每个通道按 120 秒周期走锯齿波
//! （排放类 100→0，注入类 0→100），再叠加小幅随机抖动。起始时间在初始化时回拨，
//! 使首次读数与默认液位一致。

use crate::{ControlPlugin, HardwarePlugin, PluginError, SensorPlugin};
use async_trait::async_trait;
use domain::{ConfigMap, ControlValue, now_epoch_ms};
use rand::Rng;
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;
use std::sync::RwLock;
use tracing::{info, warn};

/// 锯齿波周期（毫秒）。
pub const CYCLE_MS: i64 = 120_000;

/// 通道波形。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    /// 100% → 0%
    Draining,
    /// 0% → 100%
    Filling,
    /// 11.8–13.0 V，跟随电量下降
    BatteryVoltage,
    /// -15…+10 A 正弦
    BatteryCurrent,
    /// 18–28 °C 正弦
    Temperature,
    /// 0…400 W 半正弦，周期中点达到峰值
    SolarPower,
}

impl Waveform {
    /// 不含抖动的理论值，`phase` ∈ [0,1)。
    pub fn value_at(&self, phase: f64) -> f64 {
        match self {
            Waveform::Draining => 100.0 * (1.0 - phase),
            Waveform::Filling => 100.0 * phase,
            Waveform::BatteryVoltage => 11.8 + 1.2 * (1.0 - phase),
            Waveform::BatteryCurrent => -2.5 + 12.5 * (2.0 * PI * phase).sin(),
            Waveform::Temperature => 23.0 + 5.0 * (2.0 * PI * phase).sin(),
            Waveform::SolarPower => 400.0 * (PI * phase).sin(),
        }
    }

    fn jitter(&self) -> f64 {
        match self {
            Waveform::Draining | Waveform::Filling => 0.5,
            Waveform::BatteryVoltage => 0.05,
            Waveform::BatteryCurrent => 0.5,
            Waveform::Temperature => 0.2,
            Waveform::SolarPower => 5.0,
        }
    }

    fn clamp(&self, value: f64) -> f64 {
        match self {
            Waveform::Draining | Waveform::Filling => value.clamp(0.0, 100.0),
            Waveform::SolarPower => value.max(0.0),
            _ => value,
        }
    }

    /// 首次读数等于 `initial` 时的周期相位。
    fn phase_for(&self, initial: f64) -> f64 {
        match self {
            Waveform::Draining => (100.0 - initial) / 100.0,
            Waveform::Filling => initial / 100.0,
            Waveform::BatteryVoltage => (100.0 - initial) / 100.0,
            _ => 0.0,
        }
        .clamp(0.0, 0.999)
    }
}

/// 默认通道：(通道 ID, 波形, 初始值)。电压通道的初始值按电量百分比给出。
const CHANNELS: &[(&str, Waveform, f64)] = &[
    ("fresh_water", Waveform::Draining, 75.0),
    ("waste_water", Waveform::Filling, 25.0),
    ("lpg", Waveform::Draining, 60.0),
    ("fuel", Waveform::Draining, 80.0),
    ("battery", Waveform::Draining, 95.0),
    ("battery_soc", Waveform::Draining, 95.0),
    ("battery_voltage", Waveform::BatteryVoltage, 95.0),
    ("battery_current", Waveform::BatteryCurrent, 0.0),
    ("battery_temperature", Waveform::Temperature, 0.0),
    ("solar_power", Waveform::SolarPower, 0.0),
];

#[derive(Debug, Clone, Copy)]
struct Channel {
    waveform: Waveform,
    started_at_ms: i64,
}

/// 模拟传感器插件。
pub struct SimulatedSensorPlugin {
    channels: RwLock<HashMap<String, Channel>>,
}

impl SimulatedSensorPlugin {
    pub const NAME: &'static str = "Simulated Sensor Plugin";

    pub fn new() -> Self {
        Self {
            channels: RwLock::new(anchored_channels(now_epoch_ms())),
        }
    }

    /// 指定时刻的读数（含抖动）。未知通道返回 `None`。
    pub fn read_at(&self, sensor_id: &str, now_ms: i64) -> Option<f64> {
        let channel = self
            .channels
            .read()
            .ok()
            .and_then(|map| map.get(sensor_id).copied())?;
        let phase = cycle_phase(channel.started_at_ms, now_ms);
        let jitter = channel.waveform.jitter();
        let noise = rand::thread_rng().gen_range(-jitter..=jitter);
        Some(channel.waveform.clamp(channel.waveform.value_at(phase) + noise))
    }
}

impl Default for SimulatedSensorPlugin {
    fn default() -> Self {
        Self::new()
    }
}

/// 从起始时间到 `now_ms` 的周期相位，∈ [0,1)。
pub fn cycle_phase(started_at_ms: i64, now_ms: i64) -> f64 {
    let elapsed = (now_ms - started_at_ms).rem_euclid(CYCLE_MS);
    elapsed as f64 / CYCLE_MS as f64
}

fn anchored_channels(now_ms: i64) -> HashMap<String, Channel> {
    CHANNELS
        .iter()
        .map(|(id, waveform, initial)| {
            let offset = (waveform.phase_for(*initial) * CYCLE_MS as f64) as i64;
            (
                id.to_string(),
                Channel {
                    waveform: *waveform,
                    started_at_ms: now_ms - offset,
                },
            )
        })
        .collect()
}

#[async_trait]
impl HardwarePlugin for SimulatedSensorPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    async fn initialize(&self, _config: &ConfigMap) -> Result<(), PluginError> {
        let mut channels = self
            .channels
            .write()
            .map_err(|_| PluginError::Initialization("channel lock poisoned".to_string()))?;
        *channels = anchored_channels(now_epoch_ms());
        info!(target: "van.plugin", plugin = Self::NAME, channels = channels.len(), "simulator_anchored");
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        true
    }
}

#[async_trait]
impl SensorPlugin for SimulatedSensorPlugin {
    async fn read_value(&self, sensor_id: &str) -> Result<f64, PluginError> {
        match self.read_at(sensor_id, now_epoch_ms()) {
            Some(value) => Ok(value),
            None => {
                warn!(target: "van.plugin", plugin = Self::NAME, sensor_id = %sensor_id, "unknown sensor");
                Ok(0.0)
            }
        }
    }

    async fn read_all_values(&self) -> Result<BTreeMap<String, f64>, PluginError> {
        let now = now_epoch_ms();
        let mut values = BTreeMap::new();
        for (id, _, _) in CHANNELS {
            if let Some(value) = self.read_at(id, now) {
                values.insert(id.to_string(), value);
            }
        }
        Ok(values)
    }
}

/// 模拟控制插件：状态仅保存在内存中。
pub struct SimulatedControlPlugin {
    states: RwLock<HashMap<String, ControlValue>>,
}

impl SimulatedControlPlugin {
    pub const NAME: &'static str = "Simulated Control Plugin";

    pub fn new() -> Self {
        let states = HashMap::from([
            ("light_main".to_string(), ControlValue::Bool(false)),
            ("light_dimmer".to_string(), ControlValue::Level(0)),
            ("water_pump".to_string(), ControlValue::Bool(false)),
            ("heater".to_string(), ControlValue::Bool(false)),
        ]);
        Self {
            states: RwLock::new(states),
        }
    }
}

impl Default for SimulatedControlPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HardwarePlugin for SimulatedControlPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    async fn initialize(&self, _config: &ConfigMap) -> Result<(), PluginError> {
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        true
    }
}

#[async_trait]
impl ControlPlugin for SimulatedControlPlugin {
    async fn set_state(
        &self,
        control_id: &str,
        _config: &ConfigMap,
        value: &ControlValue,
    ) -> Result<bool, PluginError> {
        let mut states = self
            .states
            .write()
            .map_err(|_| PluginError::Call("state lock poisoned".to_string()))?;
        states.insert(control_id.to_string(), value.clone());
        info!(target: "van.plugin", plugin = Self::NAME, control_id = %control_id, state = ?value, "simulated_state_set");
        Ok(true)
    }

    async fn get_state(
        &self,
        control_id: &str,
        _config: &ConfigMap,
    ) -> Result<ControlValue, PluginError> {
        let state = self
            .states
            .read()
            .ok()
            .and_then(|map| map.get(control_id).cloned());
        match state {
            Some(state) => Ok(state),
            None => {
                warn!(target: "van.plugin", plugin = Self::NAME, control_id = %control_id, "unknown control");
                Ok(ControlValue::Bool(false))
            }
        }
    }
}
