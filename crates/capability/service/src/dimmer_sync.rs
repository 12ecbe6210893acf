//! MQTT 调光器同步
//!
//! 两个后台任务：
//! - 发现：把在线设备的每个通道登记为调光控制（已登记的跳过，重启不会重复）
//! - 状态刷新：把插件缓存中的亮度通过 `ControlService::apply_state` 写回控制

use crate::control::ControlService;
use crate::error::ServiceError;
use domain::{Control, ControlType, ControlValue, ConfigMap, new_entity_id};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use van_plugin::mqtt_dimmer::{brightness_to_percent, control_id_for};
use van_plugin::{ControlPlugin, MqttLedDimmerPlugin};

/// 首次发现前的等待时间（给 MQTT 连接留出时间）。
const INITIAL_DELAY: Duration = Duration::from_secs(5);
const DIMMER_ICON: &str = "mdi-lightbulb-outline";

pub struct DimmerSync {
    plugin: Arc<MqttLedDimmerPlugin>,
    controls: Arc<ControlService>,
    discovery_interval: Duration,
    refresh_interval: Duration,
}

impl DimmerSync {
    pub fn new(
        plugin: Arc<MqttLedDimmerPlugin>,
        controls: Arc<ControlService>,
        discovery_interval: Duration,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            plugin,
            controls,
            discovery_interval,
            refresh_interval,
        }
    }

    /// 为尚未登记的在线设备通道创建控制，返回新建数量。
    pub async fn register_discovered(&self) -> Result<usize, ServiceError> {
        let registered: BTreeSet<String> = self
            .controls
            .list_all()
            .await?
            .into_iter()
            .filter(|control| control.control_plugin == MqttLedDimmerPlugin::NAME)
            .filter_map(|control| control.control_id())
            .collect();

        let mut created = 0;
        for device in self.plugin.discovered_devices() {
            if !device.is_online {
                continue;
            }
            for channel in 0..device.channels {
                let control_id = control_id_for(&device.device_id, channel);
                if registered.contains(&control_id) {
                    continue;
                }
                let configuration = ConfigMap::from([
                    ("deviceId".to_string(), serde_json::json!(device.device_id)),
                    ("channel".to_string(), serde_json::json!(channel)),
                    ("controlId".to_string(), serde_json::json!(control_id)),
                ]);
                let brightness = device.channel_states.get(&channel).copied().unwrap_or(0);
                let result = self
                    .controls
                    .create(Control {
                        id: new_entity_id(),
                        name: format!("{} - Channel {}", device.device_name, channel + 1),
                        control_type: ControlType::Dimmer,
                        state: ControlValue::Level(brightness_to_percent(brightness)),
                        control_plugin: MqttLedDimmerPlugin::NAME.to_string(),
                        control_configuration: configuration,
                        icon_name: DIMMER_ICON.to_string(),
                        last_updated: 0,
                        is_active: true,
                    })
                    .await;
                // 单个通道失败不影响其余通道
                let control = match result {
                    Ok(control) => control,
                    Err(err) => {
                        warn!(
                            target: "van.service",
                            dimmer_control_id = %control_id,
                            "dimmer channel registration failed: {}",
                            err
                        );
                        continue;
                    }
                };
                info!(
                    target: "van.service",
                    control_id = %control.id,
                    dimmer_control_id = %control_id,
                    "dimmer_channel_registered"
                );
                created += 1;
            }
        }
        Ok(created)
    }

    /// 把插件缓存中的亮度同步到控制记录，返回发生变化的数量。
    pub async fn refresh_states(&self) -> Result<usize, ServiceError> {
        let empty = ConfigMap::new();
        let mut changed = 0;
        for control in self.controls.list().await? {
            if control.control_plugin != MqttLedDimmerPlugin::NAME {
                continue;
            }
            let Some(control_id) = control.control_id() else {
                continue;
            };
            let value = match self.plugin.get_state(&control_id, &empty).await {
                Ok(value) => value,
                Err(err) => {
                    warn!(target: "van.service", control_id = %control_id, "dimmer state read failed: {}", err);
                    continue;
                }
            };
            if self.controls.apply_state(&control.id, value).await? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// 启动发现与刷新两个后台任务。
    pub fn spawn(self: Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        let discovery = {
            let sync = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(INITIAL_DELAY).await;
                let mut ticker = tokio::time::interval(sync.discovery_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if let Err(err) = sync.register_discovered().await {
                        warn!(target: "van.service", "dimmer discovery failed: {}", err);
                    }
                }
            })
        };
        let refresh = tokio::spawn(async move {
            tokio::time::sleep(INITIAL_DELAY).await;
            let mut ticker = tokio::time::interval(self.refresh_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = self.refresh_states().await {
                    warn!(target: "van.service", "dimmer state refresh failed: {}", err);
                }
            }
        });
        (discovery, refresh)
    }
}
