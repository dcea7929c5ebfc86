//! Geotab adapter against the stub JSON-RPC endpoint
//!
//! Run with: cargo test -p eld-tests --test geotab_test

use std::collections::HashMap;

use chrono::{Duration, Utc};
use eld_core::base::is_token_expired_at;
use eld_core::{
    AssetStatus, Credentials, EldError, EldEventType, EldProvider, EldVendor, PageRequest,
};
use eld_geotab::GeotabConfig;
use eld_tests::geotab;

fn login(password: &str) -> Credentials {
    Credentials::Geotab {
        username: geotab::USERNAME.to_string(),
        password: password.to_string(),
        database: geotab::DATABASE.to_string(),
        server: None,
    }
}

// =============================================================================
// Session
// =============================================================================

#[tokio::test]
async fn test_authenticate_opens_two_week_session() {
    let (_server, provider) = geotab::start().await;

    let token = provider.authenticate(&geotab::credentials()).await.unwrap();

    assert_eq!(token.access_token, geotab::SESSION_ID);
    assert_eq!(token.token_type, "Session");
    let lifetime = token.expires_at - Utc::now();
    assert!(lifetime > Duration::days(13) && lifetime <= Duration::days(14));
    assert!(provider.test_connection().await);
}

#[tokio::test]
async fn test_session_expires_after_fourteen_days() {
    let (_server, provider) = geotab::start_authenticated().await;
    let token = provider.auth_token().unwrap();

    assert!(!provider.is_token_expired());
    let later = Utc::now() + Duration::days(14) + Duration::minutes(6);
    assert!(is_token_expired_at(Some(&token), later));
}

#[tokio::test]
async fn test_this_server_path_keeps_endpoint() {
    // "ThisServer" means later calls go to the endpoint that authenticated
    let (_server, provider) = geotab::start_authenticated().await;

    let vehicles = provider.get_vehicles(&PageRequest::default()).await.unwrap();
    assert_eq!(vehicles.data.len(), 3);
}

#[tokio::test]
async fn test_invalid_user_is_authentication_error() {
    let (_server, provider) = geotab::start().await;

    let err = provider.authenticate(&login("nope")).await.unwrap_err();

    match err {
        EldError::Authentication { vendor, message } => {
            assert_eq!(vendor, EldVendor::Geotab);
            assert_eq!(message, "Incorrect login credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(provider.auth_token().is_none());
}

#[tokio::test]
async fn test_refresh_reauthenticates() {
    let (_server, provider) = geotab::start_authenticated().await;
    let before = provider.auth_token().unwrap();

    let refreshed = provider.refresh_token().await.unwrap();

    assert_eq!(refreshed.access_token, geotab::SESSION_ID);
    assert!(refreshed.expires_at >= before.expires_at);
}

#[tokio::test]
async fn test_wrong_vendor_credentials() {
    let (_server, provider) = geotab::start().await;

    let err = provider
        .authenticate(&Credentials::Motive {
            api_key: "key".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, EldError::Configuration(_)));
}

// =============================================================================
// Devices
// =============================================================================

#[tokio::test]
async fn test_get_vehicle_missing_is_none() {
    let (_server, provider) = geotab::start_authenticated().await;

    assert!(provider.get_vehicle("missing-id").await.unwrap().is_none());

    let vehicle = provider.get_vehicle("b2").await.unwrap().unwrap();
    assert_eq!(vehicle.name, "Unit 2");
    assert_eq!(vehicle.license_plate.as_deref(), Some("ABC123"));
    assert_eq!(vehicle.license_state.as_deref(), Some("TX"));
    assert_eq!(vehicle.status, AssetStatus::Available);
}

#[tokio::test]
async fn test_device_pages_use_last_id_as_cursor() {
    let (_server, provider) = geotab::start_authenticated().await;

    let first = provider.get_vehicles(&PageRequest::first(2)).await.unwrap();
    assert_eq!(
        first.data.iter().map(|v| v.id.as_str()).collect::<Vec<_>>(),
        ["b1", "b2"]
    );
    assert!(first.has_more);
    assert_eq!(first.cursor.as_deref(), Some("b2"));

    let second = provider
        .get_vehicles(&PageRequest::after(2, "b2"))
        .await
        .unwrap();
    assert_eq!(second.data.len(), 1);
    assert_eq!(second.data[0].id, "b3");
    // Empty VINs are dropped
    assert!(second.data[0].vin.is_none());
    assert!(!second.has_more);
}

// =============================================================================
// Location
// =============================================================================

#[tokio::test]
async fn test_locations_convert_kph() {
    let (_server, provider) = geotab::start_authenticated().await;

    let locations = provider.get_vehicle_locations(None).await.unwrap();

    assert_eq!(locations.len(), 2);
    let moving = locations.iter().find(|l| l.vehicle_id == "b1").unwrap();
    assert_eq!(moving.speed_mph, 62.0);
    assert_eq!(moving.heading, 90);
    // "UnknownDriverId" is a sentinel, not a driver
    assert!(moving.driver_id.is_none());

    let parked = locations.iter().find(|l| l.vehicle_id == "b2").unwrap();
    assert_eq!(parked.speed_mph, 0.0);
    assert_eq!(parked.driver_id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn test_location_filter_by_ids() {
    let (_server, provider) = geotab::start_authenticated().await;

    let one = provider
        .get_vehicle_locations(Some(&["b2".to_string()][..]))
        .await
        .unwrap();
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].vehicle_id, "b2");

    // More than one id is filtered client-side
    let two = provider
        .get_vehicle_locations(Some(&["b1".to_string(), "zz".to_string()][..]))
        .await
        .unwrap();
    assert_eq!(two.len(), 1);
    assert_eq!(two[0].vehicle_id, "b1");
}

#[tokio::test]
async fn test_revoked_session_fails_fast() {
    let (_server, provider) = geotab::start_authenticated().await;
    provider.revoke_access().await.unwrap();

    let err = provider.get_vehicle_locations(None).await.unwrap_err();
    assert!(matches!(err, EldError::MissingSession(EldVendor::Geotab)));
}

// =============================================================================
// Subscriptions
// =============================================================================

fn rule_config() -> GeotabConfig {
    GeotabConfig {
        event_rules: HashMap::from([
            (EldEventType::GeofenceEntry, vec!["RuleYardEntry".to_string()]),
            (
                EldEventType::HosViolation,
                vec!["RuleHosDriving".to_string(), "RuleHosBreak".to_string()],
            ),
        ]),
        ..GeotabConfig::default()
    }
}

#[tokio::test]
async fn test_subscribe_attaches_configured_rules() {
    let (_server, provider, adds) = geotab::start_with_config(rule_config()).await;
    provider.authenticate(&geotab::credentials()).await.unwrap();

    let id = provider
        .subscribe_to_events(
            &[EldEventType::HosViolation, EldEventType::GeofenceEntry],
            "https://hooks.example.com/geotab",
        )
        .await
        .unwrap();
    assert_eq!(id, "b4");

    let adds = adds.lock();
    assert_eq!(adds.len(), 1);
    let entity = &adds[0]["entity"];
    assert_eq!(adds[0]["typeName"], "DistributionList");
    assert_eq!(
        entity["recipients"][0]["address"],
        "https://hooks.example.com/geotab"
    );
    let rule_ids: Vec<&str> = entity["rules"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(rule_ids, ["RuleHosDriving", "RuleHosBreak", "RuleYardEntry"]);
}

#[tokio::test]
async fn test_subscribe_rejects_types_without_rules() {
    let (_server, provider, adds) = geotab::start_with_config(rule_config()).await;
    provider.authenticate(&geotab::credentials()).await.unwrap();

    for types in [
        &[EldEventType::LocationUpdate][..],
        &[EldEventType::GeofenceEntry, EldEventType::FaultCode][..],
        &[][..],
    ] {
        let err = provider
            .subscribe_to_events(types, "https://hooks.example.com/geotab")
            .await
            .unwrap_err();
        assert!(matches!(err, EldError::InvalidRequest(_)), "{types:?}");
    }
    // Nothing was created
    assert!(adds.lock().is_empty());
}
