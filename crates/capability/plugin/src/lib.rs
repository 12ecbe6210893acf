//! 硬件插件能力模块
//!
//! 提供两类插件接口：
//! - `SensorPlugin`：读取传感器通道（储罐液位、电池电压等）
//! - `ControlPlugin`：读写控制状态（开关、调光）
//!
//! ## 内置实现
//!
//! - `simulator`：模拟传感器（120 秒锯齿波）与模拟控制
//! - `modbus`：Modbus TCP 线圈/保持寄存器控制
//! - `mqtt_dimmer`：基于 MQTT 的 LED 调光器（自动发现）
//!
//! 插件在启动时注册到 `PluginRegistry`，之后以名称查找并注入各领域服务。

pub mod error;
pub mod modbus;
pub mod mqtt_dimmer;
pub mod registry;
pub mod simulator;

use async_trait::async_trait;
use domain::{ConfigMap, ControlValue};
use std::collections::BTreeMap;

pub use error::PluginError;
pub use modbus::ModbusControlPlugin;
pub use mqtt_dimmer::{DimmerCache, DimmerDevice, MqttLedDimmerPlugin};
pub use registry::{PluginHandle, PluginInfo, PluginKind, PluginRegistry};
pub use simulator::{SimulatedControlPlugin, SimulatedSensorPlugin};

/// 硬件插件公共接口。
#[async_trait]
pub trait HardwarePlugin: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// 使用插件配置初始化，失败返回 `PluginError::Initialization`。
    async fn initialize(&self, config: &ConfigMap) -> Result<(), PluginError>;

    async fn test_connection(&self) -> bool;
}

/// 传感器插件。
#[async_trait]
pub trait SensorPlugin: HardwarePlugin {
    /// 读取单个通道。未知通道返回 0 并记录警告。
    async fn read_value(&self, sensor_id: &str) -> Result<f64, PluginError>;

    async fn read_all_values(&self) -> Result<BTreeMap<String, f64>, PluginError>;
}

/// 控制插件。
///
/// `config` 为控制实体自身的配置表，需要寻址信息的驱动（如 Modbus）从中读取。
#[async_trait]
pub trait ControlPlugin: HardwarePlugin {
    /// 写入状态，返回是否被接受。
    async fn set_state(
        &self,
        control_id: &str,
        config: &ConfigMap,
        value: &ControlValue,
    ) -> Result<bool, PluginError>;

    async fn get_state(&self, control_id: &str, config: &ConfigMap)
    -> Result<ControlValue, PluginError>;
}
