//! 设备位置服务：每个设备（任意种类）一条位置记录，按 device_id 查找。

use crate::ServiceContext;
use crate::error::ServiceError;
use crate::layout::place_new_device;
use domain::{DeviceKind, DevicePosition, now_epoch_ms};
use tracing::info;
use van_storage::EntityStore;

const STORE_KEY: &str = "device_positions.json";

pub struct PositionService {
    store: EntityStore<DevicePosition>,
}

impl PositionService {
    pub fn new(ctx: &ServiceContext) -> Self {
        Self {
            store: EntityStore::new(STORE_KEY, ctx.blob.clone()),
        }
    }

    pub async fn start(&self) -> usize {
        self.store.load(Vec::new).await
    }

    pub async fn list(&self) -> Result<Vec<DevicePosition>, ServiceError> {
        Ok(self.store.snapshot().await?)
    }

    pub async fn get(&self, device_id: &str) -> Result<DevicePosition, ServiceError> {
        self.store
            .find(device_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("position {device_id}")))
    }

    /// 新增或替换位置。
    pub async fn upsert(
        &self,
        mut position: DevicePosition,
    ) -> Result<DevicePosition, ServiceError> {
        if position.device_id.trim().is_empty() {
            return Err(ServiceError::Validation("deviceId required".to_string()));
        }
        for (axis, value) in [("x", position.x), ("y", position.y)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ServiceError::Validation(format!(
                    "{axis} out of range: {value}"
                )));
            }
        }
        position.last_updated = now_epoch_ms();
        let stored = position.clone();
        self.store
            .mutate(move |items| {
                items.retain(|item| item.device_id != stored.device_id);
                items.push(stored);
            })
            .await?;
        Ok(position)
    }

    pub async fn delete(&self, device_id: &str) -> Result<(), ServiceError> {
        let removed = self
            .store
            .mutate(|items| {
                let before = items.len();
                items.retain(|item| item.device_id != device_id);
                before != items.len()
            })
            .await?;
        if removed {
            Ok(())
        } else {
            Err(ServiceError::NotFound(format!("position {device_id}")))
        }
    }

    /// 为设备自动布局；已有位置时原样返回。
    pub async fn place(
        &self,
        device_id: &str,
        kind: DeviceKind,
    ) -> Result<DevicePosition, ServiceError> {
        let positions = self.store.snapshot().await?;
        if let Some(existing) = positions.iter().find(|p| p.device_id == device_id) {
            return Ok(existing.clone());
        }
        let occupied: Vec<(f64, f64)> = positions
            .iter()
            .filter(|p| p.device_type == kind)
            .map(|p| (p.x, p.y))
            .collect();
        let (x, y) = place_new_device(&occupied, kind, &mut rand::thread_rng());
        info!(target: "van.service", device_id = %device_id, kind = ?kind, x = x, y = y, "device_placed");
        self.upsert(DevicePosition {
            device_id: device_id.to_string(),
            device_type: kind,
            x,
            y,
            last_updated: 0,
        })
        .await
    }
}
