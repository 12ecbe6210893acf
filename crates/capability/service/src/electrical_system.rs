//! 电池系统汇总服务（单例文档 `electrical_system.json`）
//!
//! `refresh` 按 `sensorConfiguration` 从传感器插件读取电压、电流、SoC、温度与
//! 太阳能功率，再推导功率、太阳能电压/电流、已消耗安时与剩余放电时间。
//! 读数是运行时值，只有 `update` 落盘。

use crate::ServiceContext;
use crate::error::ServiceError;
use crate::invoke::bounded;
use crate::seeds::default_electrical_system;
use domain::{ElectricalSystem, config_str, new_entity_id, now_epoch_ms};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use van_plugin::{PluginRegistry, SensorPlugin};
use van_storage::BlobStore;
use van_telemetry::record_persistence_failure;

const STORE_KEY: &str = "electrical_system.json";

/// 估算剩余时间时假定的电池容量。
pub const BATTERY_CAPACITY_AH: f64 = 200.0;
/// 12 V 系统太阳能板的标称电压及波动范围。
pub const SOLAR_NOMINAL_VOLTAGE: f64 = 18.0;
const SOLAR_VOLTAGE_SPREAD: f64 = 1.0;
/// 两次刷新间隔超过该值时只按该值累计安时（避免停机后跳变）。
const MAX_INTEGRATION: Duration = Duration::from_secs(60);

/// (配置键, 默认通道)
const VOLTAGE: (&str, &str) = ("voltage_sensor", "battery_voltage");
const CURRENT: (&str, &str) = ("current_sensor", "battery_current");
const STATE_OF_CHARGE: (&str, &str) = ("soc_sensor", "battery_soc");
const TEMPERATURE: (&str, &str) = ("temperature_sensor", "battery_temperature");
const SOLAR_POWER: (&str, &str) = ("solar_power_sensor", "solar_power");
/// 交流输入/输出只在配置了对应键时读取。
const AC_INPUT_POWER: &str = "ac_input_power_sensor";
const AC_OUTPUT_POWER: &str = "ac_output_power_sensor";

/// 一次刷新得到的原始读数，读取失败的项为 `None`。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatteryReadings {
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub state_of_charge: Option<f64>,
    pub temperature: Option<f64>,
    pub solar_power: Option<f64>,
    pub ac_input_power: Option<f64>,
    pub ac_output_power: Option<f64>,
}

impl BatteryReadings {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// 把读数合并进汇总并重新推导派生值。
///
/// `elapsed` 为距上次刷新的时间，放电时按 `|I| × elapsed` 累计已消耗安时。
pub fn apply_readings(
    system: &mut ElectricalSystem,
    readings: &BatteryReadings,
    elapsed: Duration,
    solar_voltage: f64,
) {
    let slots = [
        (readings.voltage, &mut system.voltage),
        (readings.current, &mut system.current),
        (readings.state_of_charge, &mut system.state_of_charge),
        (readings.temperature, &mut system.temperature),
        (readings.solar_power, &mut system.solar_power),
        (readings.ac_input_power, &mut system.ac_input_power),
        (readings.ac_output_power, &mut system.ac_output_power),
    ];
    for (reading, slot) in slots {
        if let Some(value) = reading {
            *slot = value;
        }
    }

    system.power = system.voltage * system.current;

    if system.solar_power > 0.0 && solar_voltage > 0.0 {
        system.solar_voltage = solar_voltage;
        system.solar_current = system.solar_power / solar_voltage;
    } else {
        system.solar_voltage = 0.0;
        system.solar_current = 0.0;
    }

    let discharging = system.current < 0.0;
    if discharging {
        let hours = elapsed.min(MAX_INTEGRATION).as_secs_f64() / 3600.0;
        system.consumed_amp_hours += system.current.abs() * hours;
        let remaining_ah = BATTERY_CAPACITY_AH * system.state_of_charge.clamp(0.0, 100.0) / 100.0;
        system.time_to_go = (remaining_ah / system.current.abs() * 3600.0) as i64;
    } else {
        system.time_to_go = 0;
    }
}

struct Current {
    system: ElectricalSystem,
    refreshed_at: Option<Instant>,
}

pub struct ElectricalSystemService {
    blob: Option<Arc<dyn BlobStore>>,
    plugins: Arc<PluginRegistry>,
    call_timeout: Duration,
    current: RwLock<Option<Current>>,
}

impl ElectricalSystemService {
    pub fn new(ctx: &ServiceContext) -> Self {
        Self {
            blob: ctx.blob.clone(),
            plugins: ctx.plugins.clone(),
            call_timeout: ctx.call_timeout,
            current: RwLock::new(None),
        }
    }

    /// 加载汇总；文档缺失时写入默认值，读取或解码失败时使用默认值但不覆盖原文件。
    pub async fn start(&self) {
        let mut current = self.current.write().await;
        let (system, seed) = match &self.blob {
            None => (default_electrical_system(), false),
            Some(blob) => match blob.load(STORE_KEY).await {
                Ok(Some(value)) => match serde_json::from_value::<ElectricalSystem>(value) {
                    Ok(system) => (system, false),
                    Err(err) => {
                        warn!(target: "van.service", "electrical system decode failed, using defaults: {}", err);
                        record_persistence_failure();
                        (default_electrical_system(), false)
                    }
                },
                Ok(None) => (default_electrical_system(), true),
                Err(err) => {
                    warn!(target: "van.service", "electrical system load failed, using defaults: {}", err);
                    record_persistence_failure();
                    (default_electrical_system(), false)
                }
            },
        };
        if seed {
            self.persist(&system).await;
        }
        info!(
            target: "van.service",
            name = %system.name,
            plugin = %system.sensor_plugin,
            "electrical_system_loaded"
        );
        *current = Some(Current {
            system,
            refreshed_at: None,
        });
    }

    pub async fn get(&self) -> Result<ElectricalSystem, ServiceError> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|current| current.system.clone())
            .ok_or_else(|| ServiceError::NotReady(STORE_KEY.to_string()))
    }

    /// 替换汇总（含传感器映射）并落盘。
    pub async fn update(
        &self,
        mut system: ElectricalSystem,
    ) -> Result<ElectricalSystem, ServiceError> {
        if system.name.trim().is_empty() {
            return Err(ServiceError::Validation("name required".to_string()));
        }
        let mut current = self.current.write().await;
        let Some(slot) = current.as_mut() else {
            return Err(ServiceError::NotReady(STORE_KEY.to_string()));
        };
        if system.id.is_empty() {
            system.id = if slot.system.id.is_empty() {
                new_entity_id()
            } else {
                slot.system.id.clone()
            };
        }
        system.last_updated = now_epoch_ms();
        self.persist(&system).await;
        slot.system = system.clone();
        info!(target: "van.service", name = %system.name, plugin = %system.sensor_plugin, "electrical_system_updated");
        Ok(system)
    }

    /// 从传感器刷新读数。插件缺失或全部读取失败时返回缓存值。
    pub async fn refresh(&self) -> Result<ElectricalSystem, ServiceError> {
        let snapshot = self.get().await?;
        let Some(plugin) = self.plugins.sensor(&snapshot.sensor_plugin) else {
            warn!(
                target: "van.service",
                plugin = %snapshot.sensor_plugin,
                "electrical system sensor plugin not found"
            );
            return Ok(snapshot);
        };

        let readings = BatteryReadings {
            voltage: self.read(&plugin, &snapshot, VOLTAGE.0, Some(VOLTAGE.1)).await,
            current: self.read(&plugin, &snapshot, CURRENT.0, Some(CURRENT.1)).await,
            state_of_charge: self
                .read(&plugin, &snapshot, STATE_OF_CHARGE.0, Some(STATE_OF_CHARGE.1))
                .await,
            temperature: self
                .read(&plugin, &snapshot, TEMPERATURE.0, Some(TEMPERATURE.1))
                .await,
            solar_power: self
                .read(&plugin, &snapshot, SOLAR_POWER.0, Some(SOLAR_POWER.1))
                .await,
            ac_input_power: self.read(&plugin, &snapshot, AC_INPUT_POWER, None).await,
            ac_output_power: self.read(&plugin, &snapshot, AC_OUTPUT_POWER, None).await,
        };
        if readings.is_empty() {
            return Ok(snapshot);
        }

        let solar_voltage = SOLAR_NOMINAL_VOLTAGE
            + rand::thread_rng().gen_range(-SOLAR_VOLTAGE_SPREAD..=SOLAR_VOLTAGE_SPREAD);
        let mut current = self.current.write().await;
        let Some(slot) = current.as_mut() else {
            return Err(ServiceError::NotReady(STORE_KEY.to_string()));
        };
        let now = Instant::now();
        let elapsed = slot
            .refreshed_at
            .map(|at| now.duration_since(at))
            .unwrap_or_default();
        apply_readings(&mut slot.system, &readings, elapsed, solar_voltage);
        slot.system.last_updated = now_epoch_ms();
        slot.refreshed_at = Some(now);
        let system = &slot.system;
        debug!(
            target: "van.service",
            voltage = system.voltage,
            current = system.current,
            power = system.power,
            soc = system.state_of_charge,
            solar_power = system.solar_power,
            "electrical_system_refreshed"
        );
        Ok(system.clone())
    }

    /// 读取一项。配置缺失时使用 `fallback` 通道，`fallback` 为 `None` 则跳过。
    async fn read(
        &self,
        plugin: &Arc<dyn SensorPlugin>,
        system: &ElectricalSystem,
        key: &str,
        fallback: Option<&str>,
    ) -> Option<f64> {
        let sensor_id = config_str(&system.sensor_configuration, key)
            .or_else(|| fallback.map(str::to_string))?;
        bounded(
            self.call_timeout,
            &system.sensor_plugin,
            "read_value",
            &sensor_id,
            plugin.read_value(&sensor_id),
        )
        .await
    }

    async fn persist(&self, system: &ElectricalSystem) {
        let Some(blob) = &self.blob else {
            return;
        };
        let value = match serde_json::to_value(system) {
            Ok(value) => value,
            Err(err) => {
                warn!(target: "van.service", "electrical system encode failed: {}", err);
                record_persistence_failure();
                return;
            }
        };
        if let Err(err) = blob.save(STORE_KEY, &value).await {
            warn!(target: "van.service", "electrical system save failed: {}", err);
            record_persistence_failure();
        }
    }
}
