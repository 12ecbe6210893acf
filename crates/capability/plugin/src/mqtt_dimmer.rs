//! MQTT LED 调光器插件
//!
//! 与 ESP32 调光器通过 MQTT 通信，主题树以 `baseTopic`（默认 `vandaemon/leddimmer`）为根：
//!
//! | 主题 | 方向 | 载荷 |
//! |---|---|---|
//! | `{base}/{deviceId}/status` | 设备 → 服务 | `online` / `offline` |
//! | `{base}/{deviceId}/config` | 设备 → 服务 | `{"deviceId","deviceName","channels","version","variant"}` |
//! | `{base}/{deviceId}/channel/{n}/state` | 设备 → 服务 | 亮度 0–255 |
//! | `{base}/{deviceId}/heartbeat` | 设备 → 服务 | `{"uptime","freeHeap","rssi"}` |
//! | `{base}/{deviceId}/channel/{n}/set` | 服务 → 设备 | 亮度 0–255（QoS 1） |
//!
//! 控制 ID 格式为 `{deviceId}-CH{n}`，设备 ID 本身可以包含 `-`。
//! 连接断开后事件循环继续 poll，由 rumqttc 自动重连，每次 ConnAck 后重新订阅。

use crate::{ControlPlugin, HardwarePlugin, PluginError};
use async_trait::async_trait;
use domain::{ConfigMap, ControlValue, now_epoch_ms};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// 插件配置（camelCase 键）。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DimmerSettings {
    pub mqtt_broker: String,
    pub mqtt_port: u16,
    pub mqtt_username: Option<String>,
    pub mqtt_password: Option<String>,
    pub base_topic: String,
    /// 关闭后只接受 config 消息登记的设备。
    pub auto_discovery: bool,
}

impl Default for DimmerSettings {
    fn default() -> Self {
        Self {
            mqtt_broker: "localhost".to_string(),
            mqtt_port: 1883,
            mqtt_username: None,
            mqtt_password: None,
            base_topic: "vandaemon/leddimmer".to_string(),
            auto_discovery: true,
        }
    }
}

impl DimmerSettings {
    pub fn from_config(config: &ConfigMap) -> Result<Self, PluginError> {
        let object: serde_json::Map<String, serde_json::Value> = config
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let mut settings: DimmerSettings = serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| PluginError::InvalidConfig(e.to_string()))?;
        settings.base_topic = settings.base_topic.trim().trim_end_matches('/').to_string();
        if settings.base_topic.is_empty() {
            return Err(PluginError::InvalidConfig("baseTopic required".to_string()));
        }
        Ok(settings)
    }
}

/// 已发现的调光器设备。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimmerDevice {
    pub device_id: String,
    pub device_name: String,
    pub channels: u8,
    pub version: Option<String>,
    pub variant: Option<String>,
    pub is_online: bool,
    pub last_seen: i64,
    /// 通道号 → 亮度（0–255）。
    pub channel_states: BTreeMap<u8, u8>,
    pub uptime: Option<u64>,
    pub free_heap: Option<u64>,
    pub rssi: Option<i32>,
}

impl DimmerDevice {
    fn discovered(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            device_name: device_id.to_string(),
            channels: 0,
            version: None,
            variant: None,
            is_online: true,
            last_seen: now_epoch_ms(),
            channel_states: BTreeMap::new(),
            uptime: None,
            free_heap: None,
            rssi: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigPayload {
    #[serde(default)]
    device_name: String,
    #[serde(default)]
    channels: u8,
    version: Option<String>,
    variant: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HeartbeatPayload {
    #[serde(default)]
    uptime: u64,
    #[serde(default)]
    free_heap: u64,
    #[serde(default)]
    rssi: i32,
}

/// 调光器主题种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimmerTopic {
    Status,
    Config,
    ChannelState(u8),
    Heartbeat,
}

/// 解析 `{base}/{deviceId}/...` 主题，返回设备 ID 与主题种类。
pub fn parse_topic<'a>(base_topic: &str, topic: &'a str) -> Option<(&'a str, DimmerTopic)> {
    let rest = topic
        .trim()
        .strip_prefix(base_topic.trim_end_matches('/'))?
        .strip_prefix('/')?;
    let parts: Vec<&str> = rest.split('/').collect();
    match parts.as_slice() {
        [device, "status"] if !device.is_empty() => Some((device, DimmerTopic::Status)),
        [device, "config"] if !device.is_empty() => Some((device, DimmerTopic::Config)),
        [device, "heartbeat"] if !device.is_empty() => Some((device, DimmerTopic::Heartbeat)),
        [device, "channel", channel, "state"] if !device.is_empty() => {
            let channel = channel.parse::<u8>().ok()?;
            Some((device, DimmerTopic::ChannelState(channel)))
        }
        _ => None,
    }
}

/// 解析控制 ID `{deviceId}-CH{n}`。
pub fn parse_control_id(control_id: &str) -> Option<(&str, u8)> {
    let (device_id, channel) = control_id.trim().rsplit_once('-')?;
    if device_id.is_empty() {
        return None;
    }
    let channel = channel.strip_prefix("CH")?.parse::<u8>().ok()?;
    Some((device_id, channel))
}

/// 构造控制 ID。
pub fn control_id_for(device_id: &str, channel: u8) -> String {
    format!("{device_id}-CH{channel}")
}

/// 百分比（0–100）→ 硬件亮度（0–255）。
pub fn percent_to_brightness(percent: u8) -> u8 {
    (f64::from(percent.min(100)) * 2.55).round() as u8
}

/// 硬件亮度（0–255）→ 百分比（0–100）。
pub fn brightness_to_percent(brightness: u8) -> u8 {
    (f64::from(brightness) / 2.55).round().clamp(0.0, 100.0) as u8
}

/// 设备发现缓存，由事件循环写入、插件读取。
#[derive(Default)]
pub struct DimmerCache {
    devices: RwLock<HashMap<String, DimmerDevice>>,
    connected: AtomicBool,
}

impl DimmerCache {
    /// 处理一条入站消息，返回是否被识别。
    pub fn handle_message(
        &self,
        base_topic: &str,
        auto_discovery: bool,
        topic: &str,
        payload: &[u8],
    ) -> bool {
        let Some((device_id, kind)) = parse_topic(base_topic, topic) else {
            debug!(target: "van.plugin", topic = %topic, "dimmer topic skipped");
            return false;
        };
        let payload = String::from_utf8_lossy(payload);
        let payload = payload.trim();
        let Ok(mut devices) = self.devices.write() else {
            return false;
        };
        match kind {
            DimmerTopic::Status => {
                let online = payload.eq_ignore_ascii_case("online");
                match devices.get_mut(device_id) {
                    Some(device) => {
                        device.is_online = online;
                        device.last_seen = now_epoch_ms();
                        info!(target: "van.plugin", device_id = %device_id, status = %payload, "dimmer_status");
                    }
                    None if online && auto_discovery => {
                        devices.insert(device_id.to_string(), DimmerDevice::discovered(device_id));
                        info!(target: "van.plugin", device_id = %device_id, "dimmer_discovered");
                    }
                    None => {}
                }
            }
            DimmerTopic::Config => {
                let config: ConfigPayload = match serde_json::from_str(payload) {
                    Ok(config) => config,
                    Err(err) => {
                        warn!(target: "van.plugin", device_id = %device_id, "dimmer config invalid: {}", err);
                        return false;
                    }
                };
                let device = devices
                    .entry(device_id.to_string())
                    .or_insert_with(|| DimmerDevice::discovered(device_id));
                if !config.device_name.trim().is_empty() {
                    device.device_name = config.device_name.trim().to_string();
                }
                device.channels = config.channels;
                device.version = config.version;
                device.variant = config.variant;
                device.is_online = true;
                device.last_seen = now_epoch_ms();
                info!(
                    target: "van.plugin",
                    device_id = %device_id,
                    device_name = %device.device_name,
                    channels = device.channels,
                    "dimmer_config"
                );
            }
            DimmerTopic::ChannelState(channel) => {
                let Ok(brightness) = payload.parse::<i64>() else {
                    warn!(target: "van.plugin", device_id = %device_id, channel = channel, "dimmer state payload invalid");
                    return false;
                };
                if let Some(device) = devices.get_mut(device_id) {
                    device
                        .channel_states
                        .insert(channel, brightness.clamp(0, 255) as u8);
                }
            }
            DimmerTopic::Heartbeat => {
                let heartbeat: HeartbeatPayload = match serde_json::from_str(payload) {
                    Ok(heartbeat) => heartbeat,
                    Err(err) => {
                        warn!(target: "van.plugin", device_id = %device_id, "dimmer heartbeat invalid: {}", err);
                        return false;
                    }
                };
                if let Some(device) = devices.get_mut(device_id) {
                    device.last_seen = now_epoch_ms();
                    device.uptime = Some(heartbeat.uptime);
                    device.free_heap = Some(heartbeat.free_heap);
                    device.rssi = Some(heartbeat.rssi);
                }
            }
        }
        true
    }

    fn record_brightness(&self, device_id: &str, channel: u8, brightness: u8) {
        if let Ok(mut devices) = self.devices.write() {
            if let Some(device) = devices.get_mut(device_id) {
                device.channel_states.insert(channel, brightness);
            }
        }
    }

    fn brightness(&self, device_id: &str, channel: u8) -> Option<u8> {
        self.devices
            .read()
            .ok()
            .and_then(|map| map.get(device_id)?.channel_states.get(&channel).copied())
    }

    pub fn devices(&self) -> Vec<DimmerDevice> {
        let mut devices: Vec<DimmerDevice> = self
            .devices
            .read()
            .map(|map| map.values().cloned().collect())
            .unwrap_or_default();
        devices.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        devices
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

struct Session {
    client: AsyncClient,
    base_topic: String,
    task: Option<JoinHandle<()>>,
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// MQTT LED 调光器插件。
pub struct MqttLedDimmerPlugin {
    cache: Arc<DimmerCache>,
    session: RwLock<Option<Session>>,
}

impl MqttLedDimmerPlugin {
    pub const NAME: &'static str = "MQTT LED Dimmer";

    pub fn new() -> Self {
        Self {
            cache: Arc::new(DimmerCache::default()),
            session: RwLock::new(None),
        }
    }

    /// 已发现的设备（按设备 ID 排序）。
    pub fn discovered_devices(&self) -> Vec<DimmerDevice> {
        self.cache.devices()
    }

    pub fn cache(&self) -> &Arc<DimmerCache> {
        &self.cache
    }

    fn session_parts(&self) -> Option<(AsyncClient, String)> {
        self.session
            .read()
            .ok()?
            .as_ref()
            .map(|session| (session.client.clone(), session.base_topic.clone()))
    }
}

impl Default for MqttLedDimmerPlugin {
    fn default() -> Self {
        Self::new()
    }
}

fn subscription_topics(base_topic: &str) -> [String; 4] {
    [
        format!("{base_topic}/+/status"),
        format!("{base_topic}/+/config"),
        format!("{base_topic}/+/channel/+/state"),
        format!("{base_topic}/+/heartbeat"),
    ]
}

fn spawn_event_loop(
    client: AsyncClient,
    mut eventloop: rumqttc::EventLoop,
    cache: Arc<DimmerCache>,
    settings: DimmerSettings,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    cache.connected.store(true, Ordering::Relaxed);
                    info!(
                        target: "van.plugin",
                        broker = %settings.mqtt_broker,
                        port = settings.mqtt_port,
                        "dimmer_connected"
                    );
                    for topic in subscription_topics(&settings.base_topic) {
                        if let Err(err) = client.try_subscribe(topic.clone(), QoS::AtLeastOnce) {
                            warn!(target: "van.plugin", topic = %topic, "dimmer subscribe error: {}", err);
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    cache.handle_message(
                        &settings.base_topic,
                        settings.auto_discovery,
                        &publish.topic,
                        &publish.payload,
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    cache.connected.store(false, Ordering::Relaxed);
                    warn!(target: "van.plugin", "dimmer eventloop error: {}", err);
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            }
        }
    })
}

#[async_trait]
impl HardwarePlugin for MqttLedDimmerPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    async fn initialize(&self, config: &ConfigMap) -> Result<(), PluginError> {
        let settings = DimmerSettings::from_config(config)
            .map_err(|e| PluginError::Initialization(e.to_string()))?;
        let client_id = format!("vandaemon-leddimmer-{}", uuid::Uuid::new_v4().simple());
        let mut options =
            MqttOptions::new(client_id, settings.mqtt_broker.clone(), settings.mqtt_port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_clean_session(true);
        if let Some(username) = settings.mqtt_username.clone() {
            options.set_credentials(username, settings.mqtt_password.clone().unwrap_or_default());
        }
        let (client, eventloop) = AsyncClient::new(options, 10);
        let base_topic = settings.base_topic.clone();
        info!(
            target: "van.plugin",
            broker = %settings.mqtt_broker,
            port = settings.mqtt_port,
            base_topic = %base_topic,
            "dimmer_initializing"
        );
        let task = spawn_event_loop(client.clone(), eventloop, self.cache.clone(), settings);
        let mut session = self
            .session
            .write()
            .map_err(|_| PluginError::Initialization("session lock poisoned".to_string()))?;
        *session = Some(Session {
            client,
            base_topic,
            task: Some(task),
        });
        Ok(())
    }

    async fn test_connection(&self) -> bool {
        self.cache.is_connected()
    }
}

#[async_trait]
impl ControlPlugin for MqttLedDimmerPlugin {
    async fn set_state(
        &self,
        control_id: &str,
        _config: &ConfigMap,
        value: &ControlValue,
    ) -> Result<bool, PluginError> {
        let Some((client, base_topic)) = self.session_parts() else {
            return Err(PluginError::NotInitialized(Self::NAME.to_string()));
        };
        if !self.cache.is_connected() {
            warn!(target: "van.plugin", control_id = %control_id, "dimmer not connected");
            return Ok(false);
        }
        let Some((device_id, channel)) = parse_control_id(control_id) else {
            warn!(target: "van.plugin", control_id = %control_id, "dimmer control id invalid");
            return Ok(false);
        };
        let brightness = percent_to_brightness(value.as_level());
        let topic = format!("{base_topic}/{device_id}/channel/{channel}/set");
        client
            .try_publish(topic.clone(), QoS::AtLeastOnce, false, brightness.to_string())
            .map_err(|e| PluginError::Call(e.to_string()))?;
        self.cache.record_brightness(device_id, channel, brightness);
        info!(
            target: "van.plugin",
            control_id = %control_id,
            topic = %topic,
            brightness = brightness,
            "dimmer_state_set"
        );
        Ok(true)
    }

    async fn get_state(
        &self,
        control_id: &str,
        _config: &ConfigMap,
    ) -> Result<ControlValue, PluginError> {
        let level = parse_control_id(control_id)
            .and_then(|(device_id, channel)| self.cache.brightness(device_id, channel))
            .map(brightness_to_percent)
            .unwrap_or(0);
        Ok(ControlValue::Level(level))
    }
}
