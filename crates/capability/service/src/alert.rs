//! 告警服务
//!
//! 告警仅保存在内存中。去重键为未确认告警的 `(source, message)`；
//! 消息中带一位小数的液位，因此液位变化后会产生新告警。

use crate::error::ServiceError;
use crate::tank::TankService;
use domain::{Alert, AlertSeverity, Tank, new_entity_id, now_epoch_ms};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use van_telemetry::record_alert_created;

/// 灰水箱达到该液位即为严重告警。
const WASTE_CRITICAL_LEVEL: f64 = 95.0;

/// 评估单个储罐，返回应产生的告警级别与消息。
pub fn evaluate_tank(tank: &Tank) -> Option<(AlertSeverity, String)> {
    let level = tank.current_level;
    if tank.tank_type.is_consumable() {
        if level > tank.low_level_threshold {
            return None;
        }
        let severity = if level <= tank.low_level_threshold / 2.0 {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        };
        Some((severity, format!("{} level is low: {:.1}%", tank.name, level)))
    } else {
        if level < tank.high_level_threshold {
            return None;
        }
        let severity = if level >= WASTE_CRITICAL_LEVEL {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        };
        Some((severity, format!("{} level is high: {:.1}%", tank.name, level)))
    }
}

pub struct AlertService {
    alerts: RwLock<Vec<Alert>>,
    tanks: Arc<TankService>,
}

impl AlertService {
    pub fn new(tanks: Arc<TankService>) -> Self {
        Self {
            alerts: RwLock::new(Vec::new()),
            tanks,
        }
    }

    /// 创建告警；存在相同的未确认告警时直接返回它。
    pub async fn create_alert(
        &self,
        severity: AlertSeverity,
        source: &str,
        message: &str,
    ) -> Alert {
        let mut alerts = self.alerts.write().await;
        if let Some(existing) = alerts
            .iter()
            .find(|alert| !alert.acknowledged && alert.source == source && alert.message == message)
        {
            return existing.clone();
        }
        let alert = Alert {
            id: new_entity_id(),
            timestamp: now_epoch_ms(),
            severity,
            source: source.to_string(),
            message: message.to_string(),
            acknowledged: false,
            acknowledged_at: None,
        };
        alerts.push(alert.clone());
        record_alert_created();
        info!(
            target: "van.service",
            alert_id = %alert.id,
            severity = ?severity,
            source = %source,
            "alert_created"
        );
        alert
    }

    /// 评估全部激活储罐，返回本次评估涉及的告警（含去重命中的已有告警）。
    pub async fn check_tank_alerts(&self) -> Result<Vec<Alert>, ServiceError> {
        let mut raised = Vec::new();
        for tank in self.tanks.list().await? {
            if let Some((severity, message)) = evaluate_tank(&tank) {
                raised.push(self.create_alert(severity, &tank.id, &message).await);
            }
        }
        Ok(raised)
    }

    /// 按时间倒序列出告警。
    pub async fn list(&self, include_acknowledged: bool) -> Vec<Alert> {
        let alerts = self.alerts.read().await;
        let mut listed: Vec<Alert> = alerts
            .iter()
            .rev()
            .filter(|alert| include_acknowledged || !alert.acknowledged)
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        listed
    }

    pub async fn get(&self, id: &str) -> Result<Alert, ServiceError> {
        let alerts = self.alerts.read().await;
        alerts
            .iter()
            .find(|alert| alert.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("alert {id}")))
    }

    pub async fn acknowledge(&self, id: &str) -> Result<Alert, ServiceError> {
        let mut alerts = self.alerts.write().await;
        let alert = alerts
            .iter_mut()
            .find(|alert| alert.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("alert {id}")))?;
        if !alert.acknowledged {
            alert.acknowledged = true;
            alert.acknowledged_at = Some(now_epoch_ms());
        }
        Ok(alert.clone())
    }

    /// 物理删除。
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let mut alerts = self.alerts.write().await;
        let before = alerts.len();
        alerts.retain(|alert| alert.id != id);
        if alerts.len() == before {
            return Err(ServiceError::NotFound(format!("alert {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::TankType;

    fn tank(tank_type: TankType, level: f64) -> Tank {
        Tank {
            id: "t1".to_string(),
            name: "Test".to_string(),
            tank_type,
            current_level: level,
            capacity: 100.0,
            low_level_threshold: 10.0,
            high_level_threshold: 80.0,
            sensor_plugin: String::new(),
            sensor_configuration: Default::default(),
            last_updated: 0,
            is_active: true,
        }
    }

    #[test]
    fn consumable_thresholds() {
        let severity = |level| evaluate_tank(&tank(TankType::FreshWater, level)).map(|a| a.0);
        assert_eq!(severity(4.0), Some(AlertSeverity::Critical));
        assert_eq!(severity(5.0), Some(AlertSeverity::Critical));
        assert_eq!(severity(8.0), Some(AlertSeverity::Warning));
        assert_eq!(severity(10.0), Some(AlertSeverity::Warning));
        assert_eq!(severity(15.0), None);
    }

    #[test]
    fn waste_thresholds() {
        let severity = |level| evaluate_tank(&tank(TankType::WasteWater, level)).map(|a| a.0);
        assert_eq!(severity(96.0), Some(AlertSeverity::Critical));
        assert_eq!(severity(85.0), Some(AlertSeverity::Warning));
        assert_eq!(severity(50.0), None);
    }

    #[test]
    fn message_embeds_level_with_one_decimal() {
        let (_, message) = evaluate_tank(&tank(TankType::Lpg, 7.26)).expect("alert");
        assert_eq!(message, "Test level is low: 7.3%");
        let (_, message) = evaluate_tank(&tank(TankType::WasteWater, 85.0)).expect("alert");
        assert_eq!(message, "Test level is high: 85.0%");
    }
}
