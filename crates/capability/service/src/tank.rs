//! 储罐服务

use crate::ServiceContext;
use crate::error::ServiceError;
use crate::invoke::bounded;
use crate::position::PositionService;
use crate::seeds::default_tanks;
use domain::{DeviceKind, Tank, new_entity_id, now_epoch_ms};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use van_plugin::PluginRegistry;
use van_storage::EntityStore;

const STORE_KEY: &str = "tanks.json";

/// 一次批量刷新的结果。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    /// 得到新读数的记录数。
    pub refreshed: usize,
    /// 保持缓存值的记录数（插件缺失、失败或超时）。
    pub stale: usize,
}

pub struct TankService {
    store: EntityStore<Tank>,
    plugins: Arc<PluginRegistry>,
    positions: Arc<PositionService>,
    call_timeout: Duration,
}

impl TankService {
    pub fn new(ctx: &ServiceContext, positions: Arc<PositionService>) -> Self {
        Self {
            store: EntityStore::new(STORE_KEY, ctx.blob.clone()),
            plugins: ctx.plugins.clone(),
            positions,
            call_timeout: ctx.call_timeout,
        }
    }

    pub async fn start(&self) -> usize {
        self.store.load(default_tanks).await
    }

    /// 激活的储罐。
    pub async fn list(&self) -> Result<Vec<Tank>, ServiceError> {
        let tanks = self.store.snapshot().await?;
        Ok(tanks.into_iter().filter(|tank| tank.is_active).collect())
    }

    /// 按 ID 获取（包括已删除的记录）。
    pub async fn get(&self, id: &str) -> Result<Tank, ServiceError> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("tank {id}")))
    }

    pub async fn create(&self, mut tank: Tank) -> Result<Tank, ServiceError> {
        validate(&tank)?;
        tank.id = new_entity_id();
        tank.last_updated = now_epoch_ms();
        tank.is_active = true;
        tank.set_level(tank.current_level);
        let stored = tank.clone();
        self.store.mutate(move |items| items.push(stored)).await?;
        info!(target: "van.service", tank_id = %tank.id, name = %tank.name, "tank_created");
        if let Err(err) = self.positions.place(&tank.id, DeviceKind::Tank).await {
            warn!(target: "van.service", tank_id = %tank.id, "auto placement failed: {}", err);
        }
        Ok(tank)
    }

    /// 替换记录；原记录不存在时重新加入。
    pub async fn update(&self, id: &str, mut tank: Tank) -> Result<Tank, ServiceError> {
        if !tank.id.is_empty() && tank.id != id {
            return Err(ServiceError::Validation(format!(
                "id mismatch: {} != {}",
                tank.id, id
            )));
        }
        validate(&tank)?;
        tank.id = id.to_string();
        tank.last_updated = now_epoch_ms();
        tank.set_level(tank.current_level);
        let stored = tank.clone();
        self.store
            .mutate(move |items| {
                items.retain(|item| item.id != stored.id);
                items.push(stored);
            })
            .await?;
        Ok(tank)
    }

    /// 软删除。
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let found = self
            .store
            .mutate(|items| match items.iter_mut().find(|item| item.id == id) {
                Some(tank) => {
                    tank.is_active = false;
                    tank.last_updated = now_epoch_ms();
                    true
                }
                None => false,
            })
            .await?;
        if !found {
            return Err(ServiceError::NotFound(format!("tank {id}")));
        }
        info!(target: "van.service", tank_id = %id, "tank_deleted");
        Ok(())
    }

    /// 通过传感器插件刷新液位，返回当前液位（失败时为缓存值）。
    pub async fn refresh_level(&self, id: &str) -> Result<f64, ServiceError> {
        let tank = self.get(id).await?;
        Ok(self.refresh_one(&tank).await.unwrap_or(tank.current_level))
    }

    /// 依次刷新全部激活储罐。
    pub async fn refresh_all(&self) -> Result<RefreshReport, ServiceError> {
        let mut report = RefreshReport::default();
        for tank in self.list().await? {
            match self.refresh_one(&tank).await {
                Some(_) => report.refreshed += 1,
                None => report.stale += 1,
            }
        }
        Ok(report)
    }

    async fn refresh_one(&self, tank: &Tank) -> Option<f64> {
        let Some(plugin) = self.plugins.sensor(&tank.sensor_plugin) else {
            warn!(
                target: "van.service",
                tank_id = %tank.id,
                plugin = %tank.sensor_plugin,
                "sensor plugin not found"
            );
            return None;
        };
        let sensor_id = tank.sensor_id().unwrap_or_else(|| tank.id.clone());
        let reading = bounded(
            self.call_timeout,
            &tank.sensor_plugin,
            "read_value",
            &sensor_id,
            plugin.read_value(&sensor_id),
        )
        .await?;

        let id = tank.id.clone();
        self.store
            .mutate_volatile(move |items| {
                let tank = items.iter_mut().find(|item| item.id == id)?;
                tank.set_level(reading);
                tank.last_updated = now_epoch_ms();
                Some(tank.current_level)
            })
            .await
            .ok()
            .flatten()
    }
}

fn validate(tank: &Tank) -> Result<(), ServiceError> {
    if tank.name.trim().is_empty() {
        return Err(ServiceError::Validation("name required".to_string()));
    }
    if tank.capacity < 0.0 {
        return Err(ServiceError::Validation("capacity must be >= 0".to_string()));
    }
    Ok(())
}
