//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 实体持久化方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceMode {
    /// 每个集合一个 JSON 文件。
    Json,
    /// 仅内存，进程退出即丢失。
    Memory,
}

/// MQTT LED 调光器配置（仅在 `VAN_MQTT_DIMMER` 开启时存在）。
#[derive(Debug, Clone)]
pub struct MqttDimmerConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub base_topic: String,
    pub discovery_interval_seconds: u64,
    pub state_refresh_interval_seconds: u64,
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub data_dir: String,
    pub persistence: PersistenceMode,
    pub refresh_interval_seconds: u64,
    pub plugin_call_timeout_ms: u64,
    pub modbus_connect_timeout_ms: u64,
    pub modbus_request_timeout_ms: u64,
    pub hub_capacity: usize,
    pub cors_allow_any: bool,
    pub mqtt_dimmer: Option<MqttDimmerConfig>,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr = env::var("VAN_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let data_dir = env::var("VAN_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
        let persistence = read_persistence("VAN_PERSISTENCE")?;
        let refresh_interval_seconds = read_u64_with_default("VAN_REFRESH_INTERVAL_SECONDS", 5)?;
        if refresh_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "VAN_REFRESH_INTERVAL_SECONDS".to_string(),
                "0".to_string(),
            ));
        }
        let plugin_call_timeout_ms = read_u64_with_default("VAN_PLUGIN_CALL_TIMEOUT_MS", 3000)?;
        let modbus_connect_timeout_ms =
            read_u64_with_default("VAN_MODBUS_CONNECT_TIMEOUT_MS", 5000)?;
        let modbus_request_timeout_ms =
            read_u64_with_default("VAN_MODBUS_REQUEST_TIMEOUT_MS", 1000)?;
        let hub_capacity = read_u64_with_default("VAN_HUB_CAPACITY", 256)?.max(1) as usize;
        let cors_allow_any = read_bool_with_default("VAN_CORS_ALLOW_ANY", true);
        let mqtt_dimmer = if read_bool_with_default("VAN_MQTT_DIMMER", false) {
            Some(read_mqtt_dimmer()?)
        } else {
            None
        };

        Ok(Self {
            http_addr,
            data_dir,
            persistence,
            refresh_interval_seconds,
            plugin_call_timeout_ms,
            modbus_connect_timeout_ms,
            modbus_request_timeout_ms,
            hub_capacity,
            cors_allow_any,
            mqtt_dimmer,
        })
    }
}

fn read_mqtt_dimmer() -> Result<MqttDimmerConfig, ConfigError> {
    let host = read_optional("VAN_MQTT_HOST")
        .ok_or_else(|| ConfigError::Missing("VAN_MQTT_HOST".to_string()))?;
    let port = read_u16_with_default("VAN_MQTT_PORT", 1883)?;
    let username = read_optional("VAN_MQTT_USERNAME");
    let password = read_optional("VAN_MQTT_PASSWORD");
    let base_topic = env::var("VAN_MQTT_DIMMER_BASE_TOPIC")
        .map(|value| value.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| "vandaemon/leddimmer".to_string());
    let discovery_interval_seconds =
        read_u64_with_default("VAN_MQTT_DIMMER_DISCOVERY_SECONDS", 10)?.max(1);
    let state_refresh_interval_seconds =
        read_u64_with_default("VAN_MQTT_DIMMER_REFRESH_SECONDS", 5)?.max(1);
    Ok(MqttDimmerConfig {
        host,
        port,
        username,
        password,
        base_topic,
        discovery_interval_seconds,
        state_refresh_interval_seconds,
    })
}

fn read_persistence(key: &str) -> Result<PersistenceMode, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(PersistenceMode::Json),
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "" | "json" | "file" => Ok(PersistenceMode::Json),
            "memory" | "in-memory" => Ok(PersistenceMode::Memory),
            _ => Err(ConfigError::Invalid(key.to_string(), value)),
        },
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
