//! 插件注册表
//!
//! 启动时一次性注册所有插件，之后只读；按名称解析为传感器或控制能力。

use crate::{ControlPlugin, HardwarePlugin, SensorPlugin};
use domain::ConfigMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// 插件能力种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PluginKind {
    Sensor,
    Control,
}

/// 已注册插件。
#[derive(Clone)]
pub enum PluginHandle {
    Sensor(Arc<dyn SensorPlugin>),
    Control(Arc<dyn ControlPlugin>),
}

impl PluginHandle {
    pub fn kind(&self) -> PluginKind {
        match self {
            PluginHandle::Sensor(_) => PluginKind::Sensor,
            PluginHandle::Control(_) => PluginKind::Control,
        }
    }

    fn hardware(&self) -> &dyn HardwarePlugin {
        match self {
            PluginHandle::Sensor(plugin) => plugin.as_ref(),
            PluginHandle::Control(plugin) => plugin.as_ref(),
        }
    }
}

/// 插件概要信息。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub kind: PluginKind,
}

/// 插件注册表。
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, PluginHandle>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册传感器插件（同名覆盖）。
    pub fn with_sensor(mut self, plugin: Arc<dyn SensorPlugin>) -> Self {
        let name = plugin.name().to_string();
        self.plugins.insert(name, PluginHandle::Sensor(plugin));
        self
    }

    /// 注册控制插件（同名覆盖）。
    pub fn with_control(mut self, plugin: Arc<dyn ControlPlugin>) -> Self {
        let name = plugin.name().to_string();
        self.plugins.insert(name, PluginHandle::Control(plugin));
        self
    }

    pub fn get(&self, name: &str) -> Option<&PluginHandle> {
        self.plugins.get(name)
    }

    pub fn sensor(&self, name: &str) -> Option<Arc<dyn SensorPlugin>> {
        match self.plugins.get(name)? {
            PluginHandle::Sensor(plugin) => Some(plugin.clone()),
            PluginHandle::Control(_) => None,
        }
    }

    pub fn control(&self, name: &str) -> Option<Arc<dyn ControlPlugin>> {
        match self.plugins.get(name)? {
            PluginHandle::Control(plugin) => Some(plugin.clone()),
            PluginHandle::Sensor(_) => None,
        }
    }

    pub fn list(&self) -> Vec<PluginInfo> {
        self.plugins
            .values()
            .map(|handle| {
                let plugin = handle.hardware();
                PluginInfo {
                    name: plugin.name().to_string(),
                    version: plugin.version().to_string(),
                    kind: handle.kind(),
                }
            })
            .collect()
    }

    /// 初始化全部插件，返回成功数量。单个插件失败只记录日志。
    pub async fn initialize_all(&self, configs: &BTreeMap<String, ConfigMap>) -> usize {
        let empty = ConfigMap::new();
        let mut initialized = 0;
        for (name, handle) in &self.plugins {
            let config = configs.get(name).unwrap_or(&empty);
            match handle.hardware().initialize(config).await {
                Ok(()) => {
                    initialized += 1;
                    info!(target: "van.plugin", plugin = %name, "plugin_initialized");
                }
                Err(err) => {
                    warn!(target: "van.plugin", plugin = %name, "plugin initialization failed: {}", err);
                }
            }
        }
        initialized
    }

    /// 测试指定插件连接，插件不存在时返回 `None`。
    pub async fn test_connection(&self, name: &str) -> Option<bool> {
        let handle = self.plugins.get(name)?;
        Some(handle.hardware().test_connection().await)
    }
}
