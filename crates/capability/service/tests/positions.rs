mod support;

use domain::{DeviceKind, DevicePosition};
use support::started;
use van_service::ServiceError;
use van_service::layout::MIN_DISTANCE;

#[tokio::test]
async fn auto_placed_devices_do_not_overlap() {
    let services = started().await;
    let mut placed = Vec::new();
    for index in 0..24 {
        let position = services
            .positions
            .place(&format!("device-{index}"), DeviceKind::ElectricalDevice)
            .await
            .expect("place");
        placed.push(position);
    }
    for (i, a) in placed.iter().enumerate() {
        for b in &placed[i + 1..] {
            let distance = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
            assert!(distance >= MIN_DISTANCE, "{a:?} vs {b:?}");
        }
    }
}

#[tokio::test]
async fn place_keeps_existing_position() {
    let services = started().await;
    let first = services
        .positions
        .place("pump", DeviceKind::Control)
        .await
        .expect("place");
    let again = services
        .positions
        .place("pump", DeviceKind::Control)
        .await
        .expect("place");
    assert_eq!((first.x, first.y), (again.x, again.y));
}

#[tokio::test]
async fn upsert_validates_and_replaces() {
    let services = started().await;
    let position = DevicePosition {
        device_id: "heater".to_string(),
        device_type: DeviceKind::Control,
        x: 30.0,
        y: 40.0,
        last_updated: 0,
    };
    services.positions.upsert(position.clone()).await.expect("upsert");
    services
        .positions
        .upsert(DevicePosition { x: 60.0, ..position.clone() })
        .await
        .expect("replace");
    let stored = services.positions.get("heater").await.expect("get");
    assert_eq!(stored.x, 60.0);

    let invalid = DevicePosition { x: 140.0, ..position };
    assert!(matches!(
        services.positions.upsert(invalid).await,
        Err(ServiceError::Validation(_))
    ));

    services.positions.delete("heater").await.expect("delete");
    assert!(matches!(
        services.positions.get("heater").await,
        Err(ServiceError::NotFound(_))
    ));
}
