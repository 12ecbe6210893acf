mod support;

use domain::{AlertSeverity, Tank, TankType};
use support::{FIXED_SENSOR, sensor_config, started};

#[tokio::test]
async fn identical_unacknowledged_alerts_are_deduplicated() {
    let services = started().await;
    let alerts = &services.alerts;
    let first = alerts
        .create_alert(AlertSeverity::Warning, "tank-1", "Fresh Water level is low: 8.0%")
        .await;
    let second = alerts
        .create_alert(AlertSeverity::Warning, "tank-1", "Fresh Water level is low: 8.0%")
        .await;
    assert_eq!(first.id, second.id);
    assert_eq!(alerts.list(false).await.len(), 1);

    alerts.acknowledge(&first.id).await.expect("ack");
    let third = alerts
        .create_alert(AlertSeverity::Warning, "tank-1", "Fresh Water level is low: 8.0%")
        .await;
    assert_ne!(first.id, third.id);
    assert_eq!(alerts.list(true).await.len(), 2);
    assert_eq!(alerts.list(false).await.len(), 1);
}

#[tokio::test]
async fn acknowledge_sets_timestamp_and_delete_removes() {
    let services = started().await;
    let alerts = &services.alerts;
    let alert = alerts
        .create_alert(AlertSeverity::Info, "system", "Started")
        .await;
    let acknowledged = alerts.acknowledge(&alert.id).await.expect("ack");
    assert!(acknowledged.acknowledged);
    assert!(acknowledged.acknowledged_at.is_some());

    alerts.delete(&alert.id).await.expect("delete");
    assert!(alerts.get(&alert.id).await.is_err());
    assert!(alerts.delete(&alert.id).await.is_err());
}

#[tokio::test]
async fn list_is_newest_first() {
    let services = started().await;
    let alerts = &services.alerts;
    let older = alerts.create_alert(AlertSeverity::Info, "a", "first").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = alerts.create_alert(AlertSeverity::Info, "b", "second").await;
    let listed = alerts.list(false).await;
    assert_eq!(listed[0].id, newer.id);
    assert_eq!(listed[1].id, older.id);
}

#[tokio::test]
async fn check_uses_active_tank_levels() {
    let services = started().await;
    let low = services
        .tanks
        .create(Tank {
            id: String::new(),
            name: "Fuel".to_string(),
            tank_type: TankType::Fuel,
            current_level: 4.0,
            capacity: 70.0,
            low_level_threshold: 10.0,
            high_level_threshold: 90.0,
            sensor_plugin: FIXED_SENSOR.to_string(),
            sensor_configuration: sensor_config("fuel"),
            last_updated: 0,
            is_active: true,
        })
        .await
        .expect("create");

    let raised = services.alerts.check_tank_alerts().await.expect("check");
    let fuel = raised
        .iter()
        .find(|alert| alert.source == low.id)
        .expect("fuel alert");
    assert_eq!(fuel.severity, AlertSeverity::Critical);
    assert_eq!(fuel.message, "Fuel level is low: 4.0%");

    // 再次评估不产生重复告警。
    services.alerts.check_tank_alerts().await.expect("check");
    let count = services
        .alerts
        .list(false)
        .await
        .iter()
        .filter(|alert| alert.source == low.id)
        .count();
    assert_eq!(count, 1);
}
