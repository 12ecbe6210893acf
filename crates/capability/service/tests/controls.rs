mod support;

use domain::{ConfigMap, Control, ControlType, ControlValue};
use std::time::Duration;
use support::{REJECTING_CONTROL, started};
use van_plugin::SimulatedControlPlugin;
use van_realtime::HubChannel;
use van_service::ServiceError;

fn control(name: &str, plugin: &str, control_id: &str, control_type: ControlType) -> Control {
    Control {
        id: String::new(),
        name: name.to_string(),
        control_type,
        state: ControlValue::Bool(false),
        control_plugin: plugin.to_string(),
        control_configuration: ConfigMap::from([(
            "controlId".to_string(),
            serde_json::json!(control_id),
        )]),
        icon_name: "lightbulb".to_string(),
        last_updated: 0,
        is_active: true,
    }
}

#[tokio::test]
async fn set_state_publishes_change() {
    let services = started().await;
    let mut subscription = services.hub.subscribe();
    subscription.join(HubChannel::Controls);

    let lamp = services
        .controls
        .create(control(
            "Reading Lamp",
            SimulatedControlPlugin::NAME,
            "reading_lamp",
            ControlType::Toggle,
        ))
        .await
        .expect("create");

    let accepted = services
        .controls
        .set_state(&lamp.id, ControlValue::Bool(true))
        .await
        .expect("set");
    assert!(accepted);
    assert_eq!(
        services.controls.get(&lamp.id).await.expect("get").state,
        ControlValue::Bool(true)
    );

    let message = tokio::time::timeout(Duration::from_secs(1), subscription.recv())
        .await
        .expect("published")
        .expect("hub open");
    assert_eq!(message.event, "ControlStateChanged");
    assert_eq!(message.payload["controlId"], lamp.id.as_str());
    assert_eq!(message.payload["state"], true);
    assert_eq!(message.payload["name"], "Reading Lamp");
}

#[tokio::test]
async fn dimmer_values_are_levels() {
    let services = started().await;
    let dimmer = services
        .controls
        .create(control(
            "Cabin Dimmer",
            SimulatedControlPlugin::NAME,
            "cabin_dimmer",
            ControlType::Dimmer,
        ))
        .await
        .expect("create");
    assert_eq!(dimmer.state, ControlValue::Level(0));

    services
        .controls
        .set_state(&dimmer.id, ControlValue::Text("65".to_string()))
        .await
        .expect("set");
    assert_eq!(
        services.controls.get_state(&dimmer.id).await.expect("state"),
        ControlValue::Level(65)
    );
}

#[tokio::test]
async fn plugin_failures_are_soft() {
    let services = started().await;
    let stuck = services
        .controls
        .create(control("Stuck Relay", REJECTING_CONTROL, "relay_1", ControlType::Toggle))
        .await
        .expect("create");
    let orphan = services
        .controls
        .create(control("Orphan", "Nobody", "x", ControlType::Toggle))
        .await
        .expect("create");

    for id in [&stuck.id, &orphan.id] {
        assert!(!services.controls.set_state(id, ControlValue::Bool(true)).await.expect("set"));
        assert_eq!(
            services.controls.get_state(id).await.expect("get"),
            ControlValue::Bool(false)
        );
    }
}

#[tokio::test]
async fn apply_state_only_reports_changes() {
    let services = started().await;
    let lamp = services
        .controls
        .create(control("Lamp", REJECTING_CONTROL, "lamp", ControlType::Dimmer))
        .await
        .expect("create");
    assert!(!services
        .controls
        .apply_state(&lamp.id, ControlValue::Level(0))
        .await
        .expect("apply"));
    assert!(services
        .controls
        .apply_state(&lamp.id, ControlValue::Level(30))
        .await
        .expect("apply"));
    assert_eq!(
        services.controls.get(&lamp.id).await.expect("get").state,
        ControlValue::Level(30)
    );
}

#[tokio::test]
async fn unknown_control_is_not_found() {
    let services = started().await;
    assert!(matches!(
        services.controls.set_state("missing", ControlValue::Bool(true)).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn refresh_all_reads_every_active_control() {
    let services = started().await;
    let stuck = services
        .controls
        .create(control("Stuck Relay", REJECTING_CONTROL, "relay_2", ControlType::Toggle))
        .await
        .expect("create");
    let active = services.controls.list().await.expect("list").len();

    let report = services.controls.refresh_all().await.expect("refresh");
    assert_eq!(report.stale, 1);
    assert_eq!(report.refreshed, active - 1);
    assert_eq!(
        services.controls.get(&stuck.id).await.expect("get").state,
        ControlValue::Bool(false)
    );

    services.controls.delete(&stuck.id).await.expect("delete");
    let report = services.controls.refresh_all().await.expect("refresh");
    assert_eq!(report.stale, 0);
    assert_eq!(report.refreshed, active - 1);
}
