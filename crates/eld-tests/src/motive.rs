//! Stub of the Motive (KeepTruckin) v1 API

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use eld_client::testing::StubServer;
use eld_core::{Credentials, EldProvider};
use eld_motive::{MotiveConfig, MotiveProvider};
use serde_json::{json, Value};

use crate::{has_header, not_found, rejected, start_stub, window};

pub const API_KEY: &str = "motive-test-key";

pub fn credentials() -> Credentials {
    Credentials::Motive {
        api_key: API_KEY.to_string(),
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    has_header(headers, "x-api-key", API_KEY)
}

fn vehicles() -> Vec<Value> {
    vec![
        json!({"id": 101, "number": "T-101", "status": "active", "vin": "3AKJHHDR5JSJV1234", "year": "2018"}),
        json!({"id": 102, "number": "T-102", "status": "deactivated"}),
        json!({"id": 103, "number": "T-103", "status": "active", "make": "Volvo"}),
    ]
}

fn users() -> Vec<Value> {
    vec![
        json!({"id": 7, "first_name": "Lee", "last_name": "Driver", "username": "lee", "status": "active"}),
        json!({"id": 8, "first_name": "Sam", "last_name": "Hauler", "status": "deactivated"}),
    ]
}

fn located_vehicles() -> Vec<Value> {
    vec![
        json!({
            "id": 101,
            "number": "T-101",
            "current_location": {
                "id": "loc-1",
                "located_at": "2024-03-01T12:00:00Z",
                "lat": 32.7767,
                "lon": -96.7970,
                "bearing": 359.6,
                "speed": 100.0,
                "odometer": 160.9344,
                "engine_hours": 1234.567,
                "description": "Dallas, TX"
            },
            "current_driver": {"id": 7, "first_name": "Lee", "last_name": "Driver"}
        }),
        json!({"id": 103, "number": "T-103", "current_location": null}),
    ]
}

fn page_params(query: &HashMap<String, String>) -> (usize, usize) {
    let per_page = query
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(25);
    let page_no = query
        .get("page_no")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1usize)
        .max(1);
    (per_page, page_no)
}

/// `{<list>: [{<item>: ...}], pagination}` envelope for one page
fn paged(list: &str, item: &str, records: &[Value], query: &HashMap<String, String>) -> Response {
    let (per_page, page_no) = page_params(query);
    let (data, _) = window(records, (page_no - 1) * per_page, per_page);
    let entries: Vec<Value> = data.into_iter().map(|r| json!({ item: r })).collect();
    Json(json!({
        list: entries,
        "pagination": {"per_page": per_page, "page_no": page_no, "total": records.len()}
    }))
    .into_response()
}

async fn list_vehicles(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return rejected("Unauthorized");
    }
    paged("vehicles", "vehicle", &vehicles(), &query)
}

async fn get_vehicle(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return rejected("Unauthorized");
    }
    match vehicles().into_iter().find(|v| v["id"].to_string() == id) {
        Some(vehicle) => Json(json!({ "vehicle": vehicle })).into_response(),
        None => not_found(),
    }
}

async fn list_users(headers: HeaderMap, Query(query): Query<HashMap<String, String>>) -> Response {
    if !authorized(&headers) {
        return rejected("Unauthorized");
    }
    paged("users", "user", &users(), &query)
}

async fn vehicle_locations(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return rejected("Unauthorized");
    }
    paged("vehicles", "vehicle", &located_vehicles(), &query)
}

pub fn router() -> Router {
    Router::new()
        .route("/v1/vehicles", get(list_vehicles))
        .route("/v1/vehicles/{id}", get(get_vehicle))
        .route("/v1/users", get(list_users))
        .route("/v1/vehicle_locations", get(vehicle_locations))
}

pub async fn start() -> (StubServer, Arc<dyn EldProvider>) {
    let server = start_stub(router()).await;
    let provider: Arc<dyn EldProvider> = Arc::new(
        MotiveProvider::new(MotiveConfig::with_base_url(&server.url("/v1")))
            .expect("valid stub URL"),
    );
    (server, provider)
}

pub async fn start_authenticated() -> (StubServer, Arc<dyn EldProvider>) {
    let (server, provider) = start().await;
    provider
        .authenticate(&credentials())
        .await
        .expect("stub accepts the test key");
    (server, provider)
}
