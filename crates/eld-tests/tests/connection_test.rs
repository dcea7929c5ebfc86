//! EldConnectionManager over stub-backed adapters
//!
//! Run with: cargo test -p eld-tests --test connection_test

use std::sync::Arc;

use chrono::{Duration, Utc};
use eld_core::{
    Credentials, EldError, EldEventType, EldProvider, EldVendor, IftaQuarter, PageRequest,
    ProviderFeature,
};
use eld_tests::{geotab, manager_with, motive, samsara};
use serde_json::json;

fn assert_not_connected<T: std::fmt::Debug>(result: Result<T, EldError>) {
    match result {
        Err(EldError::NotConnected) => {}
        other => panic!("expected NotConnected, got {other:?}"),
    }
}

// =============================================================================
// Connection state
// =============================================================================

#[tokio::test]
async fn test_every_delegated_call_needs_a_connection() {
    let (_server, provider) = samsara::start().await;
    let manager = manager_with(vec![provider]);
    let now = Utc::now();
    let start = now - Duration::days(1);
    let page = PageRequest::default();

    assert_not_connected(manager.auth_token());
    assert_not_connected(manager.supports(ProviderFeature::Vehicles));
    assert_not_connected(manager.active_provider_info());
    assert_not_connected(manager.get_vehicle_locations(None).await);
    assert_not_connected(manager.get_vehicle_location("v-1").await);
    assert_not_connected(manager.get_location_history("v-1", start, now).await);
    assert_not_connected(manager.get_hos_clocks(None).await);
    assert_not_connected(manager.get_hos_clock("d-1").await);
    assert_not_connected(manager.get_hos_logs("d-1", start, now).await);
    assert_not_connected(manager.get_hos_violations(None, start, now).await);
    assert_not_connected(manager.get_vehicles(&page).await);
    assert_not_connected(manager.get_vehicle("v-1").await);
    assert_not_connected(manager.get_vehicle_stats("v-1").await);
    assert_not_connected(manager.get_vehicle_stats_history("v-1", start, now).await);
    assert_not_connected(manager.get_drivers(&page).await);
    assert_not_connected(manager.get_driver("d-1").await);
    assert_not_connected(manager.get_trailers(&page).await);
    assert_not_connected(manager.get_trailer("t-1").await);
    assert_not_connected(manager.get_fault_codes(None, true).await);
    assert_not_connected(manager.get_maintenance_alerts(None).await);
    assert_not_connected(manager.get_dvirs(start, now, None).await);
    assert_not_connected(manager.get_dvir("dvir-1").await);
    assert_not_connected(
        manager
            .get_ifta_summary(IftaQuarter::new(2024, 1).unwrap(), None)
            .await,
    );
    assert_not_connected(manager.get_geofences().await);
    assert_not_connected(manager.get_geofence_events(start, now, None).await);
    assert_not_connected(
        manager
            .subscribe_to_events(&[EldEventType::FaultCode], "https://hooks.example.com")
            .await,
    );
    assert_not_connected(manager.unsubscribe_from_events("wh-1").await);
}

#[tokio::test]
async fn test_connect_and_delegate() {
    let (_server, provider) = samsara::start().await;
    let manager = manager_with(vec![provider]);

    let token = manager
        .connect(EldVendor::Samsara, &samsara::credentials())
        .await
        .unwrap();

    assert!(manager.is_connected());
    assert_eq!(manager.active_vendor(), Some(EldVendor::Samsara));
    assert_eq!(manager.auth_token().unwrap(), Some(token));
    assert!(manager.test_connection(None).await.unwrap());
    assert!(manager.get_vehicle("missing-id").await.unwrap().is_none());
    assert_eq!(manager.get_vehicle_locations(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let (_server, provider) = samsara::start().await;
    let manager = manager_with(vec![provider.clone()]);

    // Nothing connected yet
    manager.disconnect().await.unwrap();

    manager
        .connect(EldVendor::Samsara, &samsara::credentials())
        .await
        .unwrap();
    manager.disconnect().await.unwrap();
    manager.disconnect().await.unwrap();

    assert!(!manager.is_connected());
    assert!(provider.auth_token().is_none());
    assert_not_connected(manager.get_vehicles(&PageRequest::default()).await);
}

#[tokio::test]
async fn test_failed_connect_leaves_state_unchanged() {
    let (_samsara, samsara_provider) = samsara::start().await;
    let (_motive, motive_provider) = motive::start().await;
    let manager = manager_with(vec![samsara_provider.clone(), motive_provider]);

    manager
        .connect(EldVendor::Samsara, &samsara::credentials())
        .await
        .unwrap();

    let err = manager
        .connect(
            EldVendor::Motive,
            &Credentials::Motive {
                api_key: "stale".to_string(),
            },
        )
        .await
        .unwrap_err();

    assert!(err.is_authentication());
    assert_eq!(manager.active_vendor(), Some(EldVendor::Samsara));
    assert!(samsara_provider.auth_token().is_some());
    assert!(manager.get_vehicle("v-1").await.unwrap().is_some());
}

#[tokio::test]
async fn test_failed_first_connect_stays_disconnected() {
    let (_server, provider) = geotab::start().await;
    let manager = manager_with(vec![provider]);

    let result = manager
        .connect(
            EldVendor::Geotab,
            &Credentials::Geotab {
                username: geotab::USERNAME.to_string(),
                password: "nope".to_string(),
                database: geotab::DATABASE.to_string(),
                server: None,
            },
        )
        .await;

    assert!(result.is_err());
    assert!(!manager.is_connected());
    assert_eq!(manager.active_vendor(), None);
}

#[tokio::test]
async fn test_switching_vendor_revokes_previous() {
    let (_samsara, samsara_provider) = samsara::start().await;
    let (_geotab, geotab_provider) = geotab::start().await;
    let manager = manager_with(vec![samsara_provider.clone(), geotab_provider.clone()]);

    manager
        .connect(EldVendor::Samsara, &samsara::credentials())
        .await
        .unwrap();
    manager
        .connect(EldVendor::Geotab, &geotab::credentials())
        .await
        .unwrap();

    assert_eq!(manager.active_vendor(), Some(EldVendor::Geotab));
    assert!(samsara_provider.auth_token().is_none());
    assert!(geotab_provider.auth_token().is_some());

    // Reads now reach Geotab
    let vehicle = manager.get_vehicle("b1").await.unwrap().unwrap();
    assert_eq!(vehicle.name, "Unit 1");
    assert!(manager.get_vehicle("v-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_reconnect_same_vendor_keeps_session() {
    let (_server, provider) = samsara::start().await;
    let manager = manager_with(vec![provider.clone()]);

    for _ in 0..2 {
        manager
            .connect(EldVendor::Samsara, &samsara::credentials())
            .await
            .unwrap();
    }

    assert_eq!(manager.active_vendor(), Some(EldVendor::Samsara));
    assert!(provider.auth_token().is_some());
}

#[tokio::test]
async fn test_mismatched_credentials_are_configuration_errors() {
    let (_server, provider) = samsara::start().await;
    let manager = manager_with(vec![provider]);

    let err = manager
        .connect(EldVendor::Samsara, &motive::credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, EldError::Configuration(_)));

    // Geotab has no adapter registered here
    let err = manager
        .connect(EldVendor::Geotab, &geotab::credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, EldError::Configuration(_)));
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn test_connection_check_reports_rejection() {
    let (_server, provider) = motive::start().await;
    let manager = manager_with(vec![provider]);

    // Registered but never authenticated
    assert!(!manager.test_connection(Some(EldVendor::Motive)).await.unwrap());

    manager
        .connect(EldVendor::Motive, &motive::credentials())
        .await
        .unwrap();
    assert!(manager.test_connection(None).await.unwrap());
}

// =============================================================================
// Capabilities & webhooks
// =============================================================================

#[tokio::test]
async fn test_supports_follows_active_vendor() {
    let (_server, provider) = motive::start().await;
    let manager = manager_with(vec![provider]);
    manager
        .connect(EldVendor::Motive, &motive::credentials())
        .await
        .unwrap();

    assert!(!manager.supports(ProviderFeature::Geofencing).unwrap());
    assert!(manager.supports(ProviderFeature::HoursOfService).unwrap());
    assert!(manager.get_geofences().await.unwrap().is_empty());
    assert_eq!(
        manager.active_provider_info().unwrap().vendor,
        EldVendor::Motive
    );
}

#[tokio::test]
async fn test_parse_webhook_without_connection() {
    let (_server, provider) = samsara::start().await;
    let manager = manager_with(vec![provider]);
    let payload = json!({
        "eventId": "evt-1",
        "eventType": "VehicleLocationUpdated",
        "eventTime": "2024-03-01T10:00:00Z",
        "data": {"vehicle": {"id": "v-1"}}
    });

    let events = manager
        .parse_webhook_payload(EldVendor::Samsara, &payload)
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].vendor, EldVendor::Samsara);
    assert_eq!(events[0].event_type, EldEventType::LocationUpdate);

    let err = manager
        .parse_webhook_payload(EldVendor::Motive, &payload)
        .unwrap_err();
    assert!(matches!(err, EldError::Configuration(_)));
}

#[tokio::test]
async fn test_registered_vendors_in_catalog_order() {
    let (_m, motive_provider) = motive::start().await;
    let (_s, samsara_provider) = samsara::start().await;
    let providers: Vec<Arc<dyn EldProvider>> = vec![motive_provider, samsara_provider];
    let manager = manager_with(providers);

    assert_eq!(
        manager.registered_vendors(),
        vec![EldVendor::Samsara, EldVendor::Motive]
    );
    assert_eq!(manager.catalog().len(), 3);
}
