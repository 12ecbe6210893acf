#![allow(dead_code)]

use async_trait::async_trait;
use domain::{ConfigMap, ControlValue};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use van_plugin::{
    ControlPlugin, HardwarePlugin, PluginError, PluginRegistry, SensorPlugin,
    SimulatedControlPlugin,
};
use van_realtime::TelemetryHub;
use van_service::{
    AlertService, ControlService, ElectricalService, PositionService, ServiceContext, TankService,
};
use van_storage::{BlobStore, InMemoryBlobStore};

/// 固定读数的传感器；`broken` 通道返回错误，`slow` 通道永不返回。
pub struct FixedSensor {
    pub values: BTreeMap<String, f64>,
}

pub const FIXED_SENSOR: &str = "Fixed Sensor";

#[async_trait]
impl HardwarePlugin for FixedSensor {
    fn name(&self) -> &str {
        FIXED_SENSOR
    }

    fn version(&self) -> &str {
        "test"
    }

    async fn initialize(&self, _config: &ConfigMap) -> Result<(), PluginError> {
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        true
    }
}

#[async_trait]
impl SensorPlugin for FixedSensor {
    async fn read_value(&self, sensor_id: &str) -> Result<f64, PluginError> {
        match sensor_id {
            "broken" => Err(PluginError::Call("sensor offline".to_string())),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(0.0)
            }
            other => Ok(self.values.get(other).copied().unwrap_or(0.0)),
        }
    }

    async fn read_all_values(&self) -> Result<BTreeMap<String, f64>, PluginError> {
        Ok(self.values.clone())
    }
}

/// 拒绝一切写入的控制插件。
pub struct RejectingControl;

pub const REJECTING_CONTROL: &str = "Rejecting Control";

#[async_trait]
impl HardwarePlugin for RejectingControl {
    fn name(&self) -> &str {
        REJECTING_CONTROL
    }

    fn version(&self) -> &str {
        "test"
    }

    async fn initialize(&self, _config: &ConfigMap) -> Result<(), PluginError> {
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        false
    }
}

#[async_trait]
impl ControlPlugin for RejectingControl {
    async fn set_state(
        &self,
        _control_id: &str,
        _config: &ConfigMap,
        _value: &ControlValue,
    ) -> Result<bool, PluginError> {
        Err(PluginError::Call("relay stuck".to_string()))
    }

    async fn get_state(
        &self,
        _control_id: &str,
        _config: &ConfigMap,
    ) -> Result<ControlValue, PluginError> {
        Err(PluginError::Call("relay stuck".to_string()))
    }
}

pub fn registry() -> Arc<PluginRegistry> {
    let values = BTreeMap::from([
        ("fresh".to_string(), 42.0),
        ("overflow".to_string(), 150.0),
        ("voltage".to_string(), 12.5),
        ("current".to_string(), 4.0),
        ("discharge".to_string(), -10.0),
        ("soc".to_string(), 50.0),
        ("panel".to_string(), 180.0),
    ]);
    Arc::new(
        PluginRegistry::new()
            .with_sensor(Arc::new(FixedSensor { values }))
            .with_control(Arc::new(SimulatedControlPlugin::new()))
            .with_control(Arc::new(RejectingControl)),
    )
}

pub fn context() -> ServiceContext {
    let blob: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
    ServiceContext::new(Some(blob), registry(), Duration::from_millis(200))
}

pub struct Services {
    pub ctx: ServiceContext,
    pub hub: TelemetryHub,
    pub positions: Arc<PositionService>,
    pub tanks: Arc<TankService>,
    pub controls: Arc<ControlService>,
    pub electrical: Arc<ElectricalService>,
    pub alerts: Arc<AlertService>,
}

pub async fn started() -> Services {
    let ctx = context();
    let hub = TelemetryHub::new(64);
    let positions = Arc::new(PositionService::new(&ctx));
    let tanks = Arc::new(TankService::new(&ctx, positions.clone()));
    let controls = Arc::new(ControlService::new(&ctx, positions.clone(), hub.clone()));
    let electrical = Arc::new(ElectricalService::new(&ctx, positions.clone()));
    let alerts = Arc::new(AlertService::new(tanks.clone()));
    positions.start().await;
    tanks.start().await;
    controls.start().await;
    electrical.start().await;
    Services {
        ctx,
        hub,
        positions,
        tanks,
        controls,
        electrical,
        alerts,
    }
}

pub fn sensor_config(sensor_id: &str) -> ConfigMap {
    ConfigMap::from([("sensorId".to_string(), serde_json::json!(sensor_id))])
}
