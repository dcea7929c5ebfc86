//! Stub of the Samsara fleet REST API

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use eld_client::testing::StubServer;
use eld_core::{Credentials, EldProvider};
use eld_samsara::{SamsaraConfig, SamsaraProvider};
use serde_json::{json, Value};

use crate::{has_bearer, not_found, rejected, start_stub, window};

/// The only API token the stub accepts
pub const API_KEY: &str = "samsara-test-key";

/// Subscription id returned by `POST /webhooks`
pub const WEBHOOK_ID: &str = "wh-1";

pub fn credentials() -> Credentials {
    Credentials::Samsara {
        api_key: API_KEY.to_string(),
    }
}

fn vehicles() -> Vec<Value> {
    vec![
        json!({"id": "v-1", "name": "Truck 1", "vin": "1FUJGLDR12LM12345", "year": 2021}),
        json!({"id": "v-2", "name": "Truck 2", "licensePlate": "7ABC123"}),
        json!({"id": "v-3", "name": "Truck 3", "make": "Freightliner", "year": "2019"}),
    ]
}

fn stats() -> Vec<Value> {
    vec![
        json!({
            "id": "v-1",
            "name": "Truck 1",
            "gps": {
                "time": "2024-03-01T12:00:00Z",
                "latitude": 37.7749,
                "longitude": -122.4194,
                "headingDegrees": 370.0,
                "speedMilesPerHour": 54.6,
                "reverseGeo": {"formattedLocation": "San Francisco, CA"}
            },
            "engineState": {"time": "2024-03-01T12:00:00Z", "value": "On"},
            "obdOdometerMeters": {"time": "2024-03-01T12:00:00Z", "value": 160934.4}
        }),
        // Parked without a fix
        json!({"id": "v-2", "name": "Truck 2"}),
    ]
}

fn clocks() -> Vec<Value> {
    vec![json!({
        "driver": {"id": "d-1", "name": "Ana Driver"},
        "currentDutyStatus": {"hosStatusType": "driving", "startTime": "2024-03-01T08:00:00Z"},
        "clocks": {
            "drive": {"driveRemainingDurationMs": 3_600_000},
            "shift": {"shiftRemainingDurationMs": 7_200_000},
            "cycle": {"cycleRemainingDurationMs": 36_000_000},
            "break": {"timeUntilBreakDurationMs": 1_800_000}
        }
    })]
}

async fn list_vehicles(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if !has_bearer(&headers, API_KEY) {
        return rejected("Invalid API token");
    }
    let limit = query
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(512);
    let offset = query
        .get("after")
        .and_then(|a| a.parse().ok())
        .unwrap_or(0);

    let all = vehicles();
    let (data, has_next) = window(&all, offset, limit);
    let end_cursor = if has_next {
        (offset + data.len()).to_string()
    } else {
        String::new()
    };
    Json(json!({
        "data": data,
        "pagination": {"endCursor": end_cursor, "hasNextPage": has_next}
    }))
    .into_response()
}

async fn get_vehicle(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !has_bearer(&headers, API_KEY) {
        return rejected("Invalid API token");
    }
    match vehicles().into_iter().find(|v| v["id"] == id.as_str()) {
        Some(vehicle) => Json(json!({ "data": vehicle })).into_response(),
        None => not_found(),
    }
}

async fn vehicle_stats(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if !has_bearer(&headers, API_KEY) {
        return rejected("Invalid API token");
    }
    let wanted: Option<Vec<String>> = query
        .get("vehicleIds")
        .map(|ids| ids.split(',').map(str::to_string).collect());
    let data: Vec<Value> = stats()
        .into_iter()
        .filter(|s| {
            wanted
                .as_ref()
                .map_or(true, |ids| ids.iter().any(|id| s["id"] == id.as_str()))
        })
        .collect();
    Json(json!({ "data": data })).into_response()
}

async fn hos_clocks(headers: HeaderMap) -> Response {
    if !has_bearer(&headers, API_KEY) {
        return rejected("Invalid API token");
    }
    Json(json!({ "data": clocks(), "pagination": {"endCursor": "", "hasNextPage": false} }))
        .into_response()
}

async fn create_webhook(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !has_bearer(&headers, API_KEY) {
        return rejected("Invalid API token");
    }
    if body["url"].as_str().is_none() || body["eventTypes"].as_array().is_none() {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "bad webhook"}))).into_response();
    }
    Json(json!({ "id": WEBHOOK_ID, "name": body["name"], "url": body["url"] })).into_response()
}

async fn delete_webhook(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !has_bearer(&headers, API_KEY) {
        return rejected("Invalid API token");
    }
    if id == WEBHOOK_ID {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found()
    }
}

/// Router serving the subset of the Samsara API the tests exercise
pub fn router() -> Router {
    Router::new()
        .route("/fleet/vehicles", get(list_vehicles))
        .route("/fleet/vehicles/stats", get(vehicle_stats))
        .route("/fleet/vehicles/{id}", get(get_vehicle))
        .route("/fleet/hos/clocks", get(hos_clocks))
        .route("/webhooks", post(create_webhook))
        .route("/webhooks/{id}", delete(delete_webhook))
}

/// Start the stub and an adapter pointed at it
pub async fn start() -> (StubServer, Arc<dyn EldProvider>) {
    let server = start_stub(router()).await;
    let provider: Arc<dyn EldProvider> = Arc::new(
        SamsaraProvider::new(SamsaraConfig::with_base_url(&server.base_url()))
            .expect("valid stub URL"),
    );
    (server, provider)
}

/// Start the stub and return an authenticated adapter
pub async fn start_authenticated() -> (StubServer, Arc<dyn EldProvider>) {
    let (server, provider) = start().await;
    provider
        .authenticate(&credentials())
        .await
        .expect("stub accepts the test key");
    (server, provider)
}
