//! 轮询广播能力
//!
//! 单个后台任务按固定周期执行：
//! 1. 依次刷新全部储罐液位，逐个推送 `TankLevelUpdated`（`tanks` 频道）
//! 2. 刷新电气指标与电池系统汇总，推送 `ElectricalMetricsUpdated` 与
//!    `ElectricalSystemUpdated`（`electrical` 频道）
//! 3. 评估储罐告警
//! 4. 存在未确认告警时推送 `AlertsUpdated`（`alerts` 频道）
//!
//! 任一阶段失败只记录日志和计数，后续阶段照常执行；某轮 panic 同样只计一次失败，循环不会退出。

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, warn};
use van_realtime::{HubChannel, TelemetryHub};
use van_service::{
    AlertService, ElectricalService, ElectricalSystemService, ServiceError, TankService,
};
use van_telemetry::{record_poll_cycle, record_poll_cycle_failure};

pub const TANK_LEVEL_UPDATED: &str = "TankLevelUpdated";
pub const ELECTRICAL_METRICS_UPDATED: &str = "ElectricalMetricsUpdated";
pub const ELECTRICAL_SYSTEM_UPDATED: &str = "ElectricalSystemUpdated";
pub const ALERTS_UPDATED: &str = "AlertsUpdated";

/// 单轮结果。
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub tanks_refreshed: usize,
    pub tanks_stale: usize,
    pub tanks_published: usize,
    pub electrical_devices_refreshed: usize,
    pub unacknowledged_alerts: usize,
    /// 失败的阶段名。
    pub failed_stages: Vec<&'static str>,
}

impl CycleReport {
    pub fn is_ok(&self) -> bool {
        self.failed_stages.is_empty()
    }
}

struct PollerInner {
    tanks: Arc<TankService>,
    electrical: Arc<ElectricalService>,
    electrical_system: Arc<ElectricalSystemService>,
    alerts: Arc<AlertService>,
    hub: TelemetryHub,
}

/// 遥测轮询器。
#[derive(Clone)]
pub struct TelemetryPoller {
    inner: Arc<PollerInner>,
}

impl TelemetryPoller {
    pub fn new(
        tanks: Arc<TankService>,
        electrical: Arc<ElectricalService>,
        electrical_system: Arc<ElectricalSystemService>,
        alerts: Arc<AlertService>,
        hub: TelemetryHub,
    ) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                tanks,
                electrical,
                electrical_system,
                alerts,
                hub,
            }),
        }
    }

    /// 执行一轮轮询。
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        if let Err(err) = self.tank_stage(&mut report).await {
            stage_failed(&mut report, "tanks", &err);
        }
        if let Err(err) = self.electrical_stage(&mut report).await {
            stage_failed(&mut report, "electrical", &err);
        }
        if let Err(err) = self.alert_stage(&mut report).await {
            stage_failed(&mut report, "alerts", &err);
        }
        report
    }

    /// 启动后台循环。首轮立即执行，之后按 `period` 间隔。
    ///
    /// 每轮在独立任务中执行，插件 panic 只算作一次失败的轮询。
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let started = Instant::now();
                let poller = self.clone();
                let outcome = tokio::spawn(async move { poller.run_cycle().await }).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;
                record_poll_cycle(elapsed_ms);
                match outcome {
                    Ok(report) if report.is_ok() => {
                        debug!(
                            target: "van.poller",
                            elapsed_ms = elapsed_ms,
                            tanks = report.tanks_refreshed,
                            stale = report.tanks_stale,
                            alerts = report.unacknowledged_alerts,
                            "poll_cycle"
                        );
                    }
                    Ok(report) => {
                        record_poll_cycle_failure();
                        warn!(
                            target: "van.poller",
                            elapsed_ms = elapsed_ms,
                            failed = ?report.failed_stages,
                            "poll cycle incomplete"
                        );
                    }
                    Err(err) => {
                        record_poll_cycle_failure();
                        error!(
                            target: "van.poller",
                            elapsed_ms = elapsed_ms,
                            panicked = err.is_panic(),
                            "poll cycle aborted: {}",
                            err
                        );
                    }
                }
            }
        })
    }

    async fn tank_stage(&self, report: &mut CycleReport) -> Result<(), ServiceError> {
        let refresh = self.inner.tanks.refresh_all().await?;
        report.tanks_refreshed = refresh.refreshed;
        report.tanks_stale = refresh.stale;
        for tank in self.inner.tanks.list().await? {
            self.inner.hub.publish(
                HubChannel::Tanks,
                TANK_LEVEL_UPDATED,
                &json!({
                    "tankId": tank.id,
                    "level": tank.current_level,
                    "name": tank.name,
                }),
            );
            report.tanks_published += 1;
        }
        Ok(())
    }

    async fn electrical_stage(&self, report: &mut CycleReport) -> Result<(), ServiceError> {
        let electrical = &self.inner.electrical;
        report.electrical_devices_refreshed = electrical.refresh_metrics().await?;
        let devices = electrical.device_metrics().await?;
        let flows = electrical.connection_flows().await?;
        self.inner.hub.publish(
            HubChannel::Electrical,
            ELECTRICAL_METRICS_UPDATED,
            &json!({ "devices": devices, "flows": flows }),
        );
        let system = self.inner.electrical_system.refresh().await?;
        self.inner
            .hub
            .publish(HubChannel::Electrical, ELECTRICAL_SYSTEM_UPDATED, &system);
        Ok(())
    }

    async fn alert_stage(&self, report: &mut CycleReport) -> Result<(), ServiceError> {
        self.inner.alerts.check_tank_alerts().await?;
        let unacknowledged = self.inner.alerts.list(false).await;
        report.unacknowledged_alerts = unacknowledged.len();
        if !unacknowledged.is_empty() {
            self.inner
                .hub
                .publish(HubChannel::Alerts, ALERTS_UPDATED, &unacknowledged);
        }
        Ok(())
    }
}

fn stage_failed(report: &mut CycleReport, stage: &'static str, err: &ServiceError) {
    warn!(target: "van.poller", stage = stage, "poll stage failed: {}", err);
    report.failed_stages.push(stage);
}
