//! 系统设置服务（单例文档 `settings.json`）。

use crate::ServiceContext;
use crate::error::ServiceError;
use domain::{ConfigMap, SystemConfiguration, now_epoch_ms};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use van_storage::BlobStore;
use van_telemetry::record_persistence_failure;

const STORE_KEY: &str = "settings.json";

/// 可选的车型示意图。
const VAN_DIAGRAMS: &[&str] = &[
    "Mercedes Sprinter LWB",
    "Mercedes Sprinter MWB",
    "Ford Transit Custom",
    "VW Crafter",
    "Fiat Ducato",
];

pub struct SettingsService {
    blob: Option<Arc<dyn BlobStore>>,
    current: RwLock<Option<SystemConfiguration>>,
}

impl SettingsService {
    pub fn new(ctx: &ServiceContext) -> Self {
        Self {
            blob: ctx.blob.clone(),
            current: RwLock::new(None),
        }
    }

    /// 加载设置；文档缺失时写入默认值，含旧版 `theme` 字段时迁移后写回。
    pub async fn start(&self) {
        let mut current = self.current.write().await;
        let (settings, write_back) = match &self.blob {
            None => (SystemConfiguration::default(), false),
            Some(blob) => match blob.load(STORE_KEY).await {
                Ok(Some(value)) => {
                    let legacy = value.get("theme").is_some();
                    match SystemConfiguration::from_stored(value) {
                        Ok(settings) => (settings, legacy),
                        Err(err) => {
                            warn!(target: "van.service", "settings decode failed, using defaults: {}", err);
                            record_persistence_failure();
                            (SystemConfiguration::default(), false)
                        }
                    }
                }
                Ok(None) => (SystemConfiguration::default(), true),
                Err(err) => {
                    warn!(target: "van.service", "settings load failed, using defaults: {}", err);
                    record_persistence_failure();
                    (SystemConfiguration::default(), false)
                }
            },
        };
        if write_back {
            self.persist(&settings).await;
        }
        info!(target: "van.service", van_model = %settings.van_model, "settings_loaded");
        *current = Some(settings);
    }

    pub async fn get(&self) -> Result<SystemConfiguration, ServiceError> {
        self.current
            .read()
            .await
            .clone()
            .ok_or_else(|| ServiceError::NotReady(STORE_KEY.to_string()))
    }

    pub async fn update(
        &self,
        mut settings: SystemConfiguration,
    ) -> Result<SystemConfiguration, ServiceError> {
        let mut current = self.current.write().await;
        if current.is_none() {
            return Err(ServiceError::NotReady(STORE_KEY.to_string()));
        }
        settings.last_updated = now_epoch_ms();
        self.persist(&settings).await;
        *current = Some(settings.clone());
        info!(target: "van.service", van_model = %settings.van_model, "settings_updated");
        Ok(settings)
    }

    pub fn available_van_diagrams(&self) -> Vec<String> {
        VAN_DIAGRAMS.iter().map(|name| name.to_string()).collect()
    }

    /// 指定插件的配置，未配置时为空表。
    pub async fn plugin_configuration(&self, name: &str) -> Result<ConfigMap, ServiceError> {
        Ok(self
            .get()
            .await?
            .plugin_configurations
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    pub async fn plugin_configurations(
        &self,
    ) -> Result<BTreeMap<String, ConfigMap>, ServiceError> {
        Ok(self.get().await?.plugin_configurations)
    }

    async fn persist(&self, settings: &SystemConfiguration) {
        let Some(blob) = &self.blob else {
            return;
        };
        let value = match serde_json::to_value(settings) {
            Ok(value) => value,
            Err(err) => {
                warn!(target: "van.service", "settings encode failed: {}", err);
                record_persistence_failure();
                return;
            }
        };
        if let Err(err) = blob.save(STORE_KEY, &value).await {
            warn!(target: "van.service", "settings save failed: {}", err);
            record_persistence_failure();
        }
    }
}
