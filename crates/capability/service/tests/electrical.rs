mod support;

use domain::{ConfigMap, ElectricalConnection, ElectricalDevice, ElectricalDeviceType};
use support::{FIXED_SENSOR, started};
use van_service::ServiceError;

fn device(name: &str, sources: &[(&str, &str)]) -> ElectricalDevice {
    ElectricalDevice {
        id: String::new(),
        name: name.to_string(),
        device_type: ElectricalDeviceType::Battery,
        configuration: ConfigMap::new(),
        ports: Vec::new(),
        data_source_plugin: FIXED_SENSOR.to_string(),
        data_source_configuration: sources
            .iter()
            .map(|(metric, sensor)| (metric.to_string(), serde_json::json!(sensor)))
            .collect(),
        current_metrics: Default::default(),
        last_updated: 0,
        is_active: true,
    }
}

fn connection(source: &str, target: &str) -> ElectricalConnection {
    ElectricalConnection {
        id: String::new(),
        name: "link".to_string(),
        source_device_id: source.to_string(),
        source_port_id: "out".to_string(),
        target_device_id: target.to_string(),
        target_port_id: "in".to_string(),
        current_flow: 0.0,
        power_flow: 0.0,
        is_flowing: false,
        color: "#2196F3".to_string(),
        line_width: 2.0,
        last_updated: 0,
        is_active: true,
    }
}

#[tokio::test]
async fn delete_device_cascades_to_connections() {
    let services = started().await;
    let electrical = &services.electrical;
    let battery = electrical.create_device(device("Battery", &[])).await.expect("battery");
    let inverter = electrical.create_device(device("Inverter", &[])).await.expect("inverter");
    let solar = electrical.create_device(device("Solar", &[])).await.expect("solar");
    let a = electrical
        .create_connection(connection(&battery.id, &inverter.id))
        .await
        .expect("a");
    let b = electrical
        .create_connection(connection(&solar.id, &battery.id))
        .await
        .expect("b");
    let c = electrical
        .create_connection(connection(&solar.id, &inverter.id))
        .await
        .expect("c");

    let cascaded = electrical.delete_device(&battery.id).await.expect("delete");
    assert_eq!(cascaded, 2);

    let active: Vec<String> = electrical
        .list_connections()
        .await
        .expect("list")
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(active, vec![c.id.clone()]);
    assert!(!electrical.get_connection(&a.id).await.expect("a").is_active);
    assert!(!electrical.get_connection(&b.id).await.expect("b").is_active);
}

#[tokio::test]
async fn update_requires_existing_record() {
    let services = started().await;
    assert!(matches!(
        services
            .electrical
            .update_device("missing", device("Ghost", &[]))
            .await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        services
            .electrical
            .update_connection("missing", connection("a", "b"))
            .await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn refresh_derives_power_and_flows() {
    let services = started().await;
    let electrical = &services.electrical;
    let battery = electrical
        .create_device(device(
            "House Battery",
            &[("voltage", "voltage"), ("current", "current"), ("broken", "broken")],
        ))
        .await
        .expect("battery");
    let load = electrical.create_device(device("Fridge", &[])).await.expect("load");
    let link = electrical
        .create_connection(connection(&battery.id, &load.id))
        .await
        .expect("link");

    assert_eq!(electrical.refresh_metrics().await.expect("refresh"), 1);

    let metrics = electrical.device_metrics().await.expect("metrics");
    let battery_metrics = &metrics[&battery.id];
    assert_eq!(battery_metrics["voltage"], 12.5);
    assert_eq!(battery_metrics["current"], 4.0);
    assert_eq!(battery_metrics["power"], 50.0);
    assert!(!battery_metrics.contains_key("broken"));

    let flows = electrical.connection_flows().await.expect("flows");
    assert_eq!(flows[&link.id], 4.0);
    let refreshed = electrical.get_connection(&link.id).await.expect("link");
    assert!(refreshed.is_flowing);
    assert_eq!(refreshed.power_flow, 50.0);
}

#[tokio::test]
async fn connection_requires_endpoints() {
    let services = started().await;
    assert!(matches!(
        services.electrical.create_connection(connection("", "b")).await,
        Err(ServiceError::Validation(_))
    ));
}
