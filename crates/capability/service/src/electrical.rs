//! 电气系统服务：设备与连接
//!
//! 设备的 `dataSourceConfiguration` 是“指标名 → 传感器通道 ID”的映射，
//! `refresh_metrics` 通过设备的数据源插件逐项读取。连接的流量由源设备的
//! `current` / `power` 指标推导。两者都是运行时值，不落盘。

use crate::ServiceContext;
use crate::error::ServiceError;
use crate::invoke::bounded;
use crate::position::PositionService;
use domain::{
    DeviceKind, ElectricalConnection, ElectricalDevice, config_str, new_entity_id, now_epoch_ms,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use van_plugin::PluginRegistry;
use van_storage::EntityStore;

const DEVICES_KEY: &str = "electrical_devices.json";
const CONNECTIONS_KEY: &str = "electrical_connections.json";

/// 低于该值的电流/功率视为无流动。
const FLOW_EPSILON: f64 = 0.01;

pub struct ElectricalService {
    devices: EntityStore<ElectricalDevice>,
    connections: EntityStore<ElectricalConnection>,
    plugins: Arc<PluginRegistry>,
    positions: Arc<PositionService>,
    call_timeout: Duration,
}

impl ElectricalService {
    pub fn new(ctx: &ServiceContext, positions: Arc<PositionService>) -> Self {
        Self {
            devices: EntityStore::new(DEVICES_KEY, ctx.blob.clone()),
            connections: EntityStore::new(CONNECTIONS_KEY, ctx.blob.clone()),
            plugins: ctx.plugins.clone(),
            positions,
            call_timeout: ctx.call_timeout,
        }
    }

    pub async fn start(&self) -> (usize, usize) {
        let devices = self.devices.load(Vec::new).await;
        let connections = self.connections.load(Vec::new).await;
        (devices, connections)
    }

    pub async fn list_devices(&self) -> Result<Vec<ElectricalDevice>, ServiceError> {
        let devices = self.devices.snapshot().await?;
        Ok(devices.into_iter().filter(|d| d.is_active).collect())
    }

    pub async fn get_device(&self, id: &str) -> Result<ElectricalDevice, ServiceError> {
        self.devices
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("electrical device {id}")))
    }

    pub async fn create_device(
        &self,
        mut device: ElectricalDevice,
    ) -> Result<ElectricalDevice, ServiceError> {
        if device.name.trim().is_empty() {
            return Err(ServiceError::Validation("name required".to_string()));
        }
        device.id = new_entity_id();
        device.last_updated = now_epoch_ms();
        device.is_active = true;
        let stored = device.clone();
        self.devices.mutate(move |items| items.push(stored)).await?;
        info!(
            target: "van.service",
            device_id = %device.id,
            device_type = ?device.device_type,
            "electrical_device_created"
        );
        if let Err(err) = self
            .positions
            .place(&device.id, DeviceKind::ElectricalDevice)
            .await
        {
            warn!(target: "van.service", device_id = %device.id, "auto placement failed: {}", err);
        }
        Ok(device)
    }

    /// 替换已有设备；设备不存在时返回 `NotFound`。
    pub async fn update_device(
        &self,
        id: &str,
        mut device: ElectricalDevice,
    ) -> Result<ElectricalDevice, ServiceError> {
        if !device.id.is_empty() && device.id != id {
            return Err(ServiceError::Validation(format!(
                "id mismatch: {} != {}",
                device.id, id
            )));
        }
        device.id = id.to_string();
        device.last_updated = now_epoch_ms();
        let stored = device.clone();
        let found = self
            .devices
            .mutate(move |items| match items.iter_mut().find(|item| item.id == stored.id) {
                Some(slot) => {
                    *slot = stored;
                    true
                }
                None => false,
            })
            .await?;
        if !found {
            return Err(ServiceError::NotFound(format!("electrical device {id}")));
        }
        Ok(device)
    }

    /// 软删除设备，并停用引用它的全部连接。返回被停用的连接数。
    pub async fn delete_device(&self, id: &str) -> Result<usize, ServiceError> {
        let found = self
            .devices
            .mutate(|items| match items.iter_mut().find(|item| item.id == id) {
                Some(device) => {
                    device.is_active = false;
                    device.last_updated = now_epoch_ms();
                    true
                }
                None => false,
            })
            .await?;
        if !found {
            return Err(ServiceError::NotFound(format!("electrical device {id}")));
        }
        let cascaded = self
            .connections
            .mutate(|items| {
                let now = now_epoch_ms();
                let mut count = 0;
                for connection in items
                    .iter_mut()
                    .filter(|c| c.is_active && c.references(id))
                {
                    connection.is_active = false;
                    connection.last_updated = now;
                    count += 1;
                }
                count
            })
            .await?;
        info!(
            target: "van.service",
            device_id = %id,
            connections = cascaded,
            "electrical_device_deleted"
        );
        Ok(cascaded)
    }

    pub async fn list_connections(&self) -> Result<Vec<ElectricalConnection>, ServiceError> {
        let connections = self.connections.snapshot().await?;
        Ok(connections.into_iter().filter(|c| c.is_active).collect())
    }

    pub async fn get_connection(&self, id: &str) -> Result<ElectricalConnection, ServiceError> {
        self.connections
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("electrical connection {id}")))
    }

    pub async fn create_connection(
        &self,
        mut connection: ElectricalConnection,
    ) -> Result<ElectricalConnection, ServiceError> {
        validate_connection(&connection)?;
        connection.id = new_entity_id();
        connection.last_updated = now_epoch_ms();
        connection.is_active = true;
        let stored = connection.clone();
        self.connections.mutate(move |items| items.push(stored)).await?;
        info!(
            target: "van.service",
            connection_id = %connection.id,
            source = %connection.source_device_id,
            target_device = %connection.target_device_id,
            "electrical_connection_created"
        );
        Ok(connection)
    }

    /// 替换已有连接；连接不存在时返回 `NotFound`。
    pub async fn update_connection(
        &self,
        id: &str,
        mut connection: ElectricalConnection,
    ) -> Result<ElectricalConnection, ServiceError> {
        if !connection.id.is_empty() && connection.id != id {
            return Err(ServiceError::Validation(format!(
                "id mismatch: {} != {}",
                connection.id, id
            )));
        }
        validate_connection(&connection)?;
        connection.id = id.to_string();
        connection.last_updated = now_epoch_ms();
        let stored = connection.clone();
        let found = self
            .connections
            .mutate(move |items| match items.iter_mut().find(|item| item.id == stored.id) {
                Some(slot) => {
                    *slot = stored;
                    true
                }
                None => false,
            })
            .await?;
        if !found {
            return Err(ServiceError::NotFound(format!("electrical connection {id}")));
        }
        Ok(connection)
    }

    pub async fn delete_connection(&self, id: &str) -> Result<(), ServiceError> {
        let found = self
            .connections
            .mutate(|items| match items.iter_mut().find(|item| item.id == id) {
                Some(connection) => {
                    connection.is_active = false;
                    connection.last_updated = now_epoch_ms();
                    true
                }
                None => false,
            })
            .await?;
        if !found {
            return Err(ServiceError::NotFound(format!("electrical connection {id}")));
        }
        Ok(())
    }

    /// 读取全部激活设备的指标并推导连接流量，返回得到读数的设备数。
    pub async fn refresh_metrics(&self) -> Result<usize, ServiceError> {
        let mut updates: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for device in self.list_devices().await? {
            if let Some(metrics) = self.read_metrics(&device).await {
                updates.insert(device.id.clone(), metrics);
            }
        }
        let refreshed = updates.len();

        let now = now_epoch_ms();
        let metrics_by_device = self
            .devices
            .mutate_volatile(move |items| {
                for device in items.iter_mut() {
                    if let Some(metrics) = updates.remove(&device.id) {
                        device.current_metrics = metrics;
                        device.last_updated = now;
                    }
                }
                items
                    .iter()
                    .filter(|d| d.is_active)
                    .map(|d| (d.id.clone(), d.current_metrics.clone()))
                    .collect::<BTreeMap<_, _>>()
            })
            .await?;

        self.connections
            .mutate_volatile(move |items| {
                for connection in items.iter_mut().filter(|c| c.is_active) {
                    let source = metrics_by_device.get(&connection.source_device_id);
                    let current = source.and_then(|m| m.get("current")).copied().unwrap_or(0.0);
                    let power = source.and_then(|m| m.get("power")).copied().unwrap_or(0.0);
                    connection.current_flow = current;
                    connection.power_flow = power;
                    connection.is_flowing =
                        current.abs() > FLOW_EPSILON || power.abs() > FLOW_EPSILON;
                }
            })
            .await?;
        Ok(refreshed)
    }

    /// 设备 ID → 当前指标。
    pub async fn device_metrics(
        &self,
    ) -> Result<BTreeMap<String, BTreeMap<String, f64>>, ServiceError> {
        Ok(self
            .list_devices()
            .await?
            .into_iter()
            .map(|device| (device.id, device.current_metrics))
            .collect())
    }

    /// 连接 ID → 当前电流。
    pub async fn connection_flows(&self) -> Result<BTreeMap<String, f64>, ServiceError> {
        Ok(self
            .list_connections()
            .await?
            .into_iter()
            .map(|connection| (connection.id, connection.current_flow))
            .collect())
    }

    async fn read_metrics(&self, device: &ElectricalDevice) -> Option<BTreeMap<String, f64>> {
        if device.data_source_configuration.is_empty() {
            return None;
        }
        let Some(plugin) = self.plugins.sensor(&device.data_source_plugin) else {
            warn!(
                target: "van.service",
                device_id = %device.id,
                plugin = %device.data_source_plugin,
                "data source plugin not found"
            );
            return None;
        };
        let mut metrics = BTreeMap::new();
        for metric in device.data_source_configuration.keys() {
            let Some(sensor_id) = config_str(&device.data_source_configuration, metric) else {
                continue;
            };
            if let Some(value) = bounded(
                self.call_timeout,
                &device.data_source_plugin,
                "read_value",
                &sensor_id,
                plugin.read_value(&sensor_id),
            )
            .await
            {
                metrics.insert(metric.clone(), value);
            }
        }
        if !metrics.contains_key("power") {
            if let (Some(voltage), Some(current)) = (metrics.get("voltage"), metrics.get("current"))
            {
                let power = voltage * current;
                metrics.insert("power".to_string(), power);
            }
        }
        if metrics.is_empty() { None } else { Some(metrics) }
    }
}

fn validate_connection(connection: &ElectricalConnection) -> Result<(), ServiceError> {
    if connection.source_device_id.trim().is_empty() || connection.target_device_id.trim().is_empty()
    {
        return Err(ServiceError::Validation(
            "sourceDeviceId and targetDeviceId required".to_string(),
        ));
    }
    Ok(())
}
