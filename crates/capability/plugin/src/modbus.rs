//! Modbus TCP 控制插件
//!
//! 每次读写建立一次短连接，按控制实体配置中的地址访问单个线圈或保持寄存器。
//!
//! ## 配置键
//!
//! | 键 | 说明 |
//! |---|---|
//! | `ipAddress` / `host` | 设备地址 |
//! | `modbusAddress` | `host[:port]` 形式的地址（兼容旧配置） |
//! | `port` | 端口，默认 502 |
//! | `register` | 寄存器地址（必填） |
//! | `registerType` | `Coil` 或 `HoldingRegister`，默认 `Coil` |
//! | `unitId` | 从站 ID，默认 0 |
//! | `deviceType` | 设备预设，覆盖 `registerType` |
//!
//! 连接或读写失败只记录日志，对调用方表现为 `false`。

use crate::{ControlPlugin, HardwarePlugin, PluginError};
use async_trait::async_trait;
use domain::{ConfigMap, ControlValue, config_str, config_u64};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::lookup_host;
use tokio::time::timeout;
use tokio_modbus::prelude::*;
use tracing::{debug, error, info, warn};

const DEFAULT_MODBUS_PORT: u16 = 502;

/// 寄存器类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterType {
    Coil,
    HoldingRegister,
}

impl RegisterType {
    fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("coil") {
            Some(RegisterType::Coil)
        } else if value.eq_ignore_ascii_case("holdingregister") {
            Some(RegisterType::HoldingRegister)
        } else {
            None
        }
    }
}

/// 设备预设：名称 → 强制寄存器类型。
pub fn device_preset(name: &str) -> Option<RegisterType> {
    match name {
        // Waveshare 8 路 PoE 继电器，8 个线圈
        "Waveshare8Relay" => Some(RegisterType::Coil),
        _ => None,
    }
}

/// 单个控制对应的 Modbus 地址。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModbusTarget {
    pub host: String,
    pub port: u16,
    pub register: u16,
    pub register_type: RegisterType,
    pub unit_id: u8,
}

impl ModbusTarget {
    /// 从控制实体配置解析。
    pub fn from_config(config: &ConfigMap) -> Result<Self, PluginError> {
        let (host, address_port) = match config_str(config, "ipAddress")
            .or_else(|| config_str(config, "host"))
        {
            Some(host) => (host, None),
            None => {
                let address = config_str(config, "modbusAddress").ok_or_else(|| {
                    PluginError::InvalidConfig("ipAddress or modbusAddress required".to_string())
                })?;
                parse_address(&address)
            }
        };
        if host.is_empty() {
            return Err(PluginError::InvalidConfig("empty modbus host".to_string()));
        }
        let port = match config_u64(config, "port") {
            Some(port) => u16::try_from(port)
                .map_err(|_| PluginError::InvalidConfig(format!("port out of range: {port}")))?,
            None => address_port.unwrap_or(DEFAULT_MODBUS_PORT),
        };
        let register = config_u64(config, "register")
            .ok_or_else(|| PluginError::InvalidConfig("register required".to_string()))?;
        let register = u16::try_from(register)
            .map_err(|_| PluginError::InvalidConfig(format!("register out of range: {register}")))?;
        let mut register_type = match config_str(config, "registerType") {
            Some(value) => RegisterType::parse(&value).ok_or_else(|| {
                PluginError::InvalidConfig(format!("unsupported register type: {value}"))
            })?,
            None => RegisterType::Coil,
        };
        if let Some(preset) = config_str(config, "deviceType").and_then(|name| device_preset(&name))
        {
            register_type = preset;
        }
        let unit_id = config_u64(config, "unitId").unwrap_or(0);
        let unit_id = u8::try_from(unit_id)
            .map_err(|_| PluginError::InvalidConfig(format!("unitId out of range: {unit_id}")))?;
        Ok(Self {
            host,
            port,
            register,
            register_type,
            unit_id,
        })
    }
}

/// 解析 `host[:port]`，端口缺失或非法时返回 `None`。
fn parse_address(address: &str) -> (String, Option<u16>) {
    match address.trim().split_once(':') {
        Some((host, port)) => (host.trim().to_string(), port.trim().parse().ok()),
        None => (address.trim().to_string(), None),
    }
}

/// Modbus TCP 控制插件。
pub struct ModbusControlPlugin {
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl ModbusControlPlugin {
    pub const NAME: &'static str = "Modbus Control Plugin";

    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }

    async fn connect(
        &self,
        target: &ModbusTarget,
    ) -> Result<tokio_modbus::client::Context, PluginError> {
        let addr: SocketAddr = timeout(
            self.connect_timeout,
            lookup_host((target.host.as_str(), target.port)),
        )
        .await
        .map_err(|_| PluginError::Timeout(format!("resolve {}", target.host)))?
        .map_err(|e| PluginError::Call(format!("resolve {}: {}", target.host, e)))?
        .next()
        .ok_or_else(|| PluginError::Call(format!("no address for {}", target.host)))?;

        timeout(
            self.connect_timeout,
            tcp::connect_slave(addr, Slave(target.unit_id)),
        )
        .await
        .map_err(|_| PluginError::Timeout(format!("connect {addr}")))?
        .map_err(|e| PluginError::Call(format!("connect {addr}: {e}")))
    }

    async fn write(&self, target: &ModbusTarget, state: bool) -> Result<(), PluginError> {
        let mut ctx = self.connect(target).await?;
        let result = match target.register_type {
            RegisterType::Coil => timeout(
                self.request_timeout,
                ctx.write_single_coil(target.register, state),
            )
            .await
            .map_err(|_| PluginError::Timeout("write coil".to_string()))?
            .map_err(|e| PluginError::Call(e.to_string()))?
            .map_err(|e| PluginError::Call(format!("exception: {:?}", e))),
            RegisterType::HoldingRegister => timeout(
                self.request_timeout,
                ctx.write_single_register(target.register, u16::from(state)),
            )
            .await
            .map_err(|_| PluginError::Timeout("write register".to_string()))?
            .map_err(|e| PluginError::Call(e.to_string()))?
            .map_err(|e| PluginError::Call(format!("exception: {:?}", e))),
        };
        let _ = ctx.disconnect().await;
        result
    }

    async fn read(&self, target: &ModbusTarget) -> Result<bool, PluginError> {
        let mut ctx = self.connect(target).await?;
        let result = match target.register_type {
            RegisterType::Coil => timeout(self.request_timeout, ctx.read_coils(target.register, 1))
                .await
                .map_err(|_| PluginError::Timeout("read coil".to_string()))?
                .map_err(|e| PluginError::Call(e.to_string()))?
                .map_err(|e| PluginError::Call(format!("exception: {:?}", e)))
                .map(|coils| coils.first().copied().unwrap_or(false)),
            RegisterType::HoldingRegister => timeout(
                self.request_timeout,
                ctx.read_holding_registers(target.register, 1),
            )
            .await
            .map_err(|_| PluginError::Timeout("read register".to_string()))?
            .map_err(|e| PluginError::Call(e.to_string()))?
            .map_err(|e| PluginError::Call(format!("exception: {:?}", e)))
            .map(|registers| registers.first().is_some_and(|value| *value != 0)),
        };
        let _ = ctx.disconnect().await;
        result
    }
}

#[async_trait]
impl HardwarePlugin for ModbusControlPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    async fn initialize(&self, _config: &ConfigMap) -> Result<(), PluginError> {
        info!(
            target: "van.plugin",
            plugin = Self::NAME,
            presets = "Waveshare8Relay",
            connect_timeout_ms = self.connect_timeout.as_millis() as u64,
            "modbus_plugin_ready"
        );
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        // 地址在每个控制的配置中，插件本身没有固定连接。
        true
    }
}

#[async_trait]
impl ControlPlugin for ModbusControlPlugin {
    async fn set_state(
        &self,
        control_id: &str,
        config: &ConfigMap,
        value: &ControlValue,
    ) -> Result<bool, PluginError> {
        let target = match ModbusTarget::from_config(config) {
            Ok(target) => target,
            Err(err) => {
                warn!(target: "van.plugin", control_id = %control_id, "modbus config invalid: {}", err);
                return Ok(false);
            }
        };
        let state = value.as_bool();
        debug!(
            target: "van.plugin",
            control_id = %control_id,
            host = %target.host,
            port = target.port,
            register = target.register,
            register_type = ?target.register_type,
            state = state,
            "modbus_write"
        );
        match self.write(&target, state).await {
            Ok(()) => Ok(true),
            Err(err) => {
                error!(
                    target: "van.plugin",
                    control_id = %control_id,
                    host = %target.host,
                    register = target.register,
                    "modbus write failed: {}",
                    err
                );
                Ok(false)
            }
        }
    }

    async fn get_state(
        &self,
        control_id: &str,
        config: &ConfigMap,
    ) -> Result<ControlValue, PluginError> {
        let target = match ModbusTarget::from_config(config) {
            Ok(target) => target,
            Err(err) => {
                warn!(target: "van.plugin", control_id = %control_id, "modbus config invalid: {}", err);
                return Ok(ControlValue::Bool(false));
            }
        };
        match self.read(&target).await {
            Ok(state) => Ok(ControlValue::Bool(state)),
            Err(err) => {
                error!(
                    target: "van.plugin",
                    control_id = %control_id,
                    host = %target.host,
                    register = target.register,
                    "modbus read failed: {}",
                    err
                );
                Ok(ControlValue::Bool(false))
            }
        }
    }
}
