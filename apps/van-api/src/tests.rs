use crate::handlers::apply_command;
use crate::{AppState, bootstrap, routes};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use van_config::MqttDimmerConfig;
use van_plugin::{MqttLedDimmerPlugin, PluginRegistry, SimulatedControlPlugin, SimulatedSensorPlugin};
use van_realtime::{HubChannel, TelemetryHub};
use van_service::ServiceContext;
use van_storage::InMemoryBlobStore;

async fn test_state() -> AppState {
    let registry = PluginRegistry::new()
        .with_sensor(Arc::new(SimulatedSensorPlugin::new()))
        .with_control(Arc::new(SimulatedControlPlugin::new()));
    let ctx = ServiceContext::new(
        Some(Arc::new(InMemoryBlobStore::new())),
        Arc::new(registry),
        Duration::from_millis(200),
    );
    bootstrap::start_services(&ctx, TelemetryHub::new(16)).await
}

async fn test_app() -> Router {
    routes::create_router(test_state().await, false)
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes: bytes::Bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json")
    };
    (status, value)
}

fn find_by_name<'a>(items: &'a Value, name: &str) -> &'a Value {
    items
        .as_array()
        .expect("array")
        .iter()
        .find(|item| item["name"] == name)
        .expect("named item")
}

#[tokio::test]
async fn health_carries_request_ids() {
    let app = test_app().await;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("x-trace-id"));
}

#[tokio::test]
async fn tank_lifecycle_over_http() {
    let app = test_app().await;
    let (status, body) = call(&app, Method::GET, "/api/tanks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().expect("tanks").len(), 3);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/tanks",
        Some(json!({
            "name": "Diesel",
            "type": "Fuel",
            "capacity": 70.0,
            "currentLevel": 40.0,
            "sensorPlugin": "Simulated Sensor Plugin",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().expect("id").to_string();
    assert_eq!(body["data"]["lowLevelThreshold"], 20.0);

    let (status, body) = call(&app, Method::GET, &format!("/api/tanks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Diesel");

    let (_, positions) = call(&app, Method::GET, "/api/device-positions", None).await;
    assert!(
        positions["data"]
            .as_array()
            .expect("positions")
            .iter()
            .any(|p| p["deviceId"] == id.as_str() && p["deviceType"] == "Tank")
    );

    let (status, _) = call(&app, Method::DELETE, &format!("/api/tanks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = call(&app, Method::GET, "/api/tanks", None).await;
    assert_eq!(body["data"].as_array().expect("tanks").len(), 3);
    let (status, body) = call(&app, Method::GET, &format!("/api/tanks/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);
}

#[tokio::test]
async fn put_with_mismatched_id_is_rejected() {
    let app = test_app().await;
    let (_, body) = call(&app, Method::GET, "/api/tanks", None).await;
    let tank = find_by_name(&body["data"], "LPG").clone();
    let id = tank["id"].as_str().expect("id").to_string();

    let mut changed = tank.clone();
    changed["id"] = json!("someone-else");
    let (status, body) = call(&app, Method::PUT, &format!("/api/tanks/{id}"), Some(changed)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID.REQUEST");
}

#[tokio::test]
async fn unknown_entities_are_not_found() {
    let app = test_app().await;
    for uri in [
        "/api/tanks/missing",
        "/api/controls/missing",
        "/api/alerts/missing",
        "/api/electrical/devices/missing",
        "/api/device-positions/missing",
        "/api/plugins/Missing%20Plugin/test",
    ] {
        let (status, body) = call(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"]["code"], "RESOURCE.NOT_FOUND", "{uri}");
    }
}

#[tokio::test]
async fn control_state_round_trip_publishes() {
    let state = test_state().await;
    let mut subscription = state.hub.subscribe();
    subscription.join(HubChannel::Controls);
    let app = routes::create_router(state, false);

    let (_, body) = call(&app, Method::GET, "/api/controls", None).await;
    let id = find_by_name(&body["data"], "Main Lights")["id"]
        .as_str()
        .expect("id")
        .to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/controls/{id}/state"),
        Some(json!({ "state": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], true);
    assert_eq!(body["data"]["accepted"], true);

    let (status, body) = call(&app, Method::GET, &format!("/api/controls/{id}/state"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["state"], true);

    let message = tokio::time::timeout(Duration::from_millis(200), subscription.recv())
        .await
        .expect("published")
        .expect("message");
    assert_eq!(message.event, "ControlStateChanged");
    assert_eq!(message.payload["controlId"], id.as_str());
}

#[tokio::test]
async fn electrical_device_delete_reports_cascade() {
    let app = test_app().await;
    let mut ids = Vec::new();
    for (name, device_type) in [("House Battery", "Battery"), ("Roof Solar", "SolarMPPT")] {
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/electrical/devices",
            Some(json!({ "name": name, "deviceType": device_type })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(body["data"]["id"].as_str().expect("id").to_string());
    }
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/electrical/connections",
        Some(json!({
            "name": "Solar feed",
            "sourceDeviceId": ids[1],
            "targetDeviceId": ids[0],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        Method::DELETE,
        &format!("/api/electrical/devices/{}", ids[0]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["connectionsDeactivated"], 1);

    let (_, body) = call(&app, Method::GET, "/api/electrical/connections", None).await;
    assert!(body["data"].as_array().expect("connections").is_empty());
}

#[tokio::test]
async fn battery_summary_reads_simulated_channels() {
    let app = test_app().await;
    let (status, body) = call(&app, Method::GET, "/api/electrical", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Main Battery System");
    assert_eq!(body["data"]["sensorPlugin"], "Simulated Sensor Plugin");
    assert_eq!(
        body["data"]["sensorConfiguration"]["voltage_sensor"],
        "battery_voltage"
    );

    let (status, body) = call(&app, Method::POST, "/api/electrical/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    let summary = &body["data"];
    let voltage = summary["voltage"].as_f64().expect("voltage");
    let current = summary["current"].as_f64().expect("current");
    let power = summary["power"].as_f64().expect("power");
    assert!(voltage > 0.0);
    assert!((power - voltage * current).abs() < 1e-9);

    let mut system = summary.clone();
    system["name"] = json!("House Bank");
    system["sensorPlugin"] = json!("Unplugged");
    let (status, body) = call(&app, Method::PUT, "/api/electrical", Some(system)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "House Bank");

    // 插件缺失时刷新返回缓存值
    let (status, body) = call(&app, Method::POST, "/api/electrical/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["voltage"].as_f64(), Some(voltage));

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/electrical",
        Some(json!({ "name": " " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn controls_refresh_reads_every_control() {
    let app = test_app().await;
    let (_, body) = call(&app, Method::GET, "/api/controls", None).await;
    let active = body["data"].as_array().expect("controls").len();

    let (status, body) = call(&app, Method::POST, "/api/controls/refresh", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["refreshed"], active);
    assert_eq!(body["data"]["stale"], 0);
}

#[tokio::test]
async fn settings_accept_legacy_theme() {
    let app = test_app().await;
    let (status, body) = call(&app, Method::GET, "/api/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["vanModel"], "Mercedes Sprinter LWB");

    let (status, body) = call(
        &app,
        Method::PUT,
        "/api/settings",
        Some(json!({ "vanModel": "VW Crafter", "theme": "dark" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["themeMode"], "Manual");
    assert_eq!(body["data"]["manualTheme"], "Dark");
    assert!(body["data"].get("theme").is_none());

    let (_, body) = call(&app, Method::GET, "/api/settings/van-diagrams", None).await;
    assert_eq!(body["data"].as_array().expect("diagrams").len(), 5);
}

#[tokio::test]
async fn alerts_check_and_acknowledge() {
    let app = test_app().await;
    let (_, body) = call(&app, Method::GET, "/api/tanks", None).await;
    let mut tank = find_by_name(&body["data"], "Waste Water").clone();
    let id = tank["id"].as_str().expect("id").to_string();
    // 改用不存在的插件，液位保持写入的值
    tank["sensorPlugin"] = json!("Unplugged");
    tank["currentLevel"] = json!(90.0);
    let (status, _) = call(&app, Method::PUT, &format!("/api/tanks/{id}"), Some(tank)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, "/api/alerts/check", None).await;
    assert_eq!(status, StatusCode::OK);
    let alert = body["data"]
        .as_array()
        .expect("alerts")
        .iter()
        .find(|alert| alert["source"] == id.as_str())
        .expect("waste alert")
        .clone();
    assert_eq!(alert["severity"], "Warning");
    let alert_id = alert["id"].as_str().expect("alert id").to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/alerts/{alert_id}/acknowledge"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["acknowledged"], true);

    let (_, body) = call(&app, Method::GET, "/api/alerts", None).await;
    assert!(
        body["data"]
            .as_array()
            .expect("alerts")
            .iter()
            .all(|alert| alert["id"] != alert_id.as_str())
    );
    let (_, body) = call(&app, Method::GET, "/api/alerts?includeAcknowledged=true", None).await;
    assert!(
        body["data"]
            .as_array()
            .expect("alerts")
            .iter()
            .any(|alert| alert["id"] == alert_id.as_str())
    );
}

#[tokio::test]
async fn plugins_and_metrics_are_listed() {
    let app = test_app().await;
    let (status, body) = call(&app, Method::GET, "/api/plugins", None).await;
    assert_eq!(status, StatusCode::OK);
    let plugins = body["data"].as_array().expect("plugins");
    assert_eq!(plugins.len(), 2);
    assert!(plugins.iter().any(|p| p["kind"] == "Sensor"));

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/plugins/Simulated%20Control%20Plugin/test",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["connected"], true);

    let (status, body) = call(&app, Method::GET, "/api/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_object());
}

#[tokio::test]
async fn hub_commands_join_and_leave_channels() {
    let hub = TelemetryHub::new(8);
    let mut subscription = hub.subscribe();

    let reply = apply_command(&mut subscription, r#"{"action":"subscribe","channel":"Tanks"}"#);
    assert!(reply.ok);
    assert_eq!(reply.channel, "tanks");
    assert_eq!(subscription.channels().collect::<Vec<_>>(), vec![HubChannel::Tanks]);

    let reply = apply_command(&mut subscription, r#"{"action":"subscribe","channel":"weather"}"#);
    assert!(!reply.ok);
    assert_eq!(reply.action, "subscribe");

    let reply = apply_command(&mut subscription, "not json");
    assert!(!reply.ok);

    let reply = apply_command(&mut subscription, r#"{"action":"unsubscribe","channel":"tanks"}"#);
    assert!(reply.ok);
    assert_eq!(subscription.channels().count(), 0);
}

#[test]
fn dimmer_env_fills_missing_settings_only() {
    let mut configs = BTreeMap::new();
    configs.insert(
        MqttLedDimmerPlugin::NAME.to_string(),
        BTreeMap::from([("mqttBroker".to_string(), json!("broker.lan"))]),
    );
    let env = MqttDimmerConfig {
        host: "localhost".to_string(),
        port: 1884,
        username: Some("van".to_string()),
        password: None,
        base_topic: "vandaemon/leddimmer".to_string(),
        discovery_interval_seconds: 10,
        state_refresh_interval_seconds: 5,
    };
    bootstrap::merge_dimmer_config(&mut configs, &env);
    let merged = &configs[MqttLedDimmerPlugin::NAME];
    assert_eq!(merged["mqttBroker"], "broker.lan");
    assert_eq!(merged["mqttPort"], 1884);
    assert_eq!(merged["mqttUsername"], "van");
    assert!(!merged.contains_key("mqttPassword"));
}
