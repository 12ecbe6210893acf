//! 控制服务
//!
//! 写入成功后立即在 `controls` 频道推送 `ControlStateChanged`。
//! 状态值按控制类型归一：开关/按钮为 `Bool`，调光/选择器为 `Level`。

use crate::ServiceContext;
use crate::error::ServiceError;
use crate::invoke::bounded;
use crate::position::PositionService;
use crate::seeds::default_controls;
use crate::tank::RefreshReport;
use domain::{Control, ControlType, ControlValue, DeviceKind, new_entity_id, now_epoch_ms};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use van_plugin::PluginRegistry;
use van_realtime::{HubChannel, TelemetryHub};
use van_storage::EntityStore;
use van_telemetry::record_control_state_change;

const STORE_KEY: &str = "controls.json";

/// 控制状态变更事件名。
pub const CONTROL_STATE_CHANGED: &str = "ControlStateChanged";

/// 按控制类型归一状态值。
pub fn normalize_state(control_type: ControlType, value: &ControlValue) -> ControlValue {
    match control_type {
        ControlType::Toggle | ControlType::Momentary => ControlValue::Bool(value.as_bool()),
        ControlType::Dimmer | ControlType::Selector => ControlValue::Level(value.as_level()),
    }
}

pub struct ControlService {
    store: EntityStore<Control>,
    plugins: Arc<PluginRegistry>,
    positions: Arc<PositionService>,
    hub: TelemetryHub,
    call_timeout: Duration,
}

impl ControlService {
    pub fn new(ctx: &ServiceContext, positions: Arc<PositionService>, hub: TelemetryHub) -> Self {
        Self {
            store: EntityStore::new(STORE_KEY, ctx.blob.clone()),
            plugins: ctx.plugins.clone(),
            positions,
            hub,
            call_timeout: ctx.call_timeout,
        }
    }

    pub async fn start(&self) -> usize {
        self.store.load(default_controls).await
    }

    /// 激活的控制。
    pub async fn list(&self) -> Result<Vec<Control>, ServiceError> {
        let controls = self.store.snapshot().await?;
        Ok(controls.into_iter().filter(|c| c.is_active).collect())
    }

    /// 全部控制（含已删除）。
    pub async fn list_all(&self) -> Result<Vec<Control>, ServiceError> {
        Ok(self.store.snapshot().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Control, ServiceError> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("control {id}")))
    }

    pub async fn create(&self, mut control: Control) -> Result<Control, ServiceError> {
        validate(&control)?;
        control.id = new_entity_id();
        control.last_updated = now_epoch_ms();
        control.is_active = true;
        control.state = normalize_state(control.control_type, &control.state);
        let stored = control.clone();
        self.store.mutate(move |items| items.push(stored)).await?;
        info!(
            target: "van.service",
            control_id = %control.id,
            name = %control.name,
            plugin = %control.control_plugin,
            "control_created"
        );
        if let Err(err) = self.positions.place(&control.id, DeviceKind::Control).await {
            warn!(
                target: "van.service",
                control_id = %control.id,
                "auto placement failed: {}",
                err
            );
        }
        Ok(control)
    }

    /// 替换记录；原记录不存在时重新加入。
    pub async fn update(&self, id: &str, mut control: Control) -> Result<Control, ServiceError> {
        if !control.id.is_empty() && control.id != id {
            return Err(ServiceError::Validation(format!(
                "id mismatch: {} != {}",
                control.id, id
            )));
        }
        validate(&control)?;
        control.id = id.to_string();
        control.last_updated = now_epoch_ms();
        control.state = normalize_state(control.control_type, &control.state);
        let stored = control.clone();
        self.store
            .mutate(move |items| {
                items.retain(|item| item.id != stored.id);
                items.push(stored);
            })
            .await?;
        Ok(control)
    }

    /// 软删除。
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let found = self
            .store
            .mutate(|items| match items.iter_mut().find(|item| item.id == id) {
                Some(control) => {
                    control.is_active = false;
                    control.last_updated = now_epoch_ms();
                    true
                }
                None => false,
            })
            .await?;
        if !found {
            return Err(ServiceError::NotFound(format!("control {id}")));
        }
        info!(target: "van.service", control_id = %id, "control_deleted");
        Ok(())
    }

    /// 读取硬件状态；插件不可用时返回缓存值。
    pub async fn get_state(&self, id: &str) -> Result<ControlValue, ServiceError> {
        let control = self.get(id).await?;
        Ok(self.read_one(&control).await.unwrap_or(control.state))
    }

    /// 写入硬件状态，返回是否被接受。插件缺失、失败或超时返回 `false`。
    pub async fn set_state(&self, id: &str, value: ControlValue) -> Result<bool, ServiceError> {
        let control = self.get(id).await?;
        let state = normalize_state(control.control_type, &value);
        let Some(plugin) = self.plugins.control(&control.control_plugin) else {
            warn!(
                target: "van.service",
                control_id = %id,
                plugin = %control.control_plugin,
                "control plugin not found"
            );
            return Ok(false);
        };
        let plugin_id = control.control_id().unwrap_or_else(|| control.id.clone());
        let accepted = bounded(
            self.call_timeout,
            &control.control_plugin,
            "set_state",
            &plugin_id,
            plugin.set_state(&plugin_id, &control.control_configuration, &state),
        )
        .await
        .unwrap_or(false);
        if !accepted {
            return Ok(false);
        }
        self.commit_state(&control, state).await?;
        Ok(true)
    }

    /// 记录外部观测到的状态（不调用插件）。状态有变化时返回 `true`。
    pub async fn apply_state(&self, id: &str, value: ControlValue) -> Result<bool, ServiceError> {
        let control = self.get(id).await?;
        let state = normalize_state(control.control_type, &value);
        if state == control.state {
            return Ok(false);
        }
        self.commit_state(&control, state).await?;
        Ok(true)
    }

    /// 依次读取全部激活控制的硬件状态（不并发）。
    pub async fn refresh_all(&self) -> Result<RefreshReport, ServiceError> {
        let mut report = RefreshReport::default();
        for control in self.list().await? {
            match self.read_one(&control).await {
                Some(_) => report.refreshed += 1,
                None => report.stale += 1,
            }
        }
        Ok(report)
    }

    async fn read_one(&self, control: &Control) -> Option<ControlValue> {
        let Some(plugin) = self.plugins.control(&control.control_plugin) else {
            warn!(
                target: "van.service",
                control_id = %control.id,
                plugin = %control.control_plugin,
                "control plugin not found"
            );
            return None;
        };
        let plugin_id = control.control_id().unwrap_or_else(|| control.id.clone());
        let value = bounded(
            self.call_timeout,
            &control.control_plugin,
            "get_state",
            &plugin_id,
            plugin.get_state(&plugin_id, &control.control_configuration),
        )
        .await?;
        let state = normalize_state(control.control_type, &value);
        let id = control.id.clone();
        let cached = state.clone();
        let _ = self
            .store
            .mutate_volatile(move |items| {
                if let Some(item) = items.iter_mut().find(|item| item.id == id) {
                    if item.state != cached {
                        item.state = cached;
                        item.last_updated = now_epoch_ms();
                    }
                }
            })
            .await;
        Some(state)
    }

    async fn commit_state(
        &self,
        control: &Control,
        state: ControlValue,
    ) -> Result<(), ServiceError> {
        let id = control.id.clone();
        let stored = state.clone();
        self.store
            .mutate(move |items| {
                if let Some(item) = items.iter_mut().find(|item| item.id == id) {
                    item.state = stored;
                    item.last_updated = now_epoch_ms();
                }
            })
            .await?;
        record_control_state_change();
        info!(
            target: "van.service",
            control_id = %control.id,
            state = ?state,
            "control_state_changed"
        );
        self.hub.publish(
            HubChannel::Controls,
            CONTROL_STATE_CHANGED,
            &json!({
                "controlId": control.id,
                "state": state,
                "name": control.name,
            }),
        );
        Ok(())
    }
}

fn validate(control: &Control) -> Result<(), ServiceError> {
    if control.name.trim().is_empty() {
        return Err(ServiceError::Validation("name required".to_string()));
    }
    Ok(())
}
