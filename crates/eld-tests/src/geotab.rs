//! Stub of the MyGeotab JSON-RPC endpoint
//!
//! Every call is a `POST /apiv1` with `{"method", "params"}`. Errors come
//! back with HTTP 200 and an `error` member, as MyGeotab does.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use eld_client::testing::StubServer;
use eld_core::{Credentials, EldProvider};
use eld_geotab::{GeotabConfig, GeotabProvider};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::start_stub;

pub const USERNAME: &str = "ops@example.com";
pub const PASSWORD: &str = "geotab-test-password";
pub const DATABASE: &str = "fleet_db";
/// Session id issued by `Authenticate`
pub const SESSION_ID: &str = "sess-1";

/// `params` of every `Add` call the stub answered, oldest first
pub type AddLog = Arc<Mutex<Vec<Value>>>;

pub fn credentials() -> Credentials {
    Credentials::Geotab {
        username: USERNAME.to_string(),
        password: PASSWORD.to_string(),
        database: DATABASE.to_string(),
        server: None,
    }
}

fn devices() -> Vec<Value> {
    vec![
        json!({"id": "b1", "name": "Unit 1", "vehicleIdentificationNumber": "1HGBH41JXMN109186", "serialNumber": "G9A1"}),
        json!({"id": "b2", "name": "Unit 2", "licensePlate": "ABC123", "licenseState": "TX"}),
        json!({"id": "b3", "name": "Unit 3", "vehicleIdentificationNumber": ""}),
    ]
}

fn device_statuses() -> Vec<Value> {
    vec![
        json!({
            "device": {"id": "b1"},
            "driver": "UnknownDriverId",
            "latitude": 43.6532,
            "longitude": -79.3832,
            "bearing": 90.4,
            "speed": 100.0,
            "dateTime": "2024-03-01T12:00:00.000Z",
            "isDriving": true
        }),
        json!({
            "device": {"id": "b2", "name": "Unit 2"},
            "driver": {"id": "u1"},
            "latitude": 45.5017,
            "longitude": -73.5673,
            "bearing": 0.0,
            "speed": 0.0,
            "dateTime": "2024-03-01T11:58:00.000Z",
            "isDriving": false
        }),
    ]
}

fn rpc_error(exception: &str, message: &str) -> Response {
    Json(json!({
        "error": {
            "name": "JSONRPCError",
            "message": message,
            "errors": [{"name": exception, "message": message}]
        },
        "jsonrpc": "2.0"
    }))
    .into_response()
}

fn rpc_result(result: Value) -> Response {
    Json(json!({ "result": result, "jsonrpc": "2.0" })).into_response()
}

fn authenticate(params: &Value) -> Response {
    let accepted = params["userName"] == USERNAME
        && params["password"] == PASSWORD
        && params["database"] == DATABASE;
    if !accepted {
        return rpc_error("InvalidUserException", "Incorrect login credentials");
    }
    rpc_result(json!({
        "credentials": {"userName": USERNAME, "database": DATABASE, "sessionId": SESSION_ID},
        "path": "ThisServer"
    }))
}

/// `Get` with id search, `resultsLimit` and id-ordered `sort.offset`
fn get(params: &Value) -> Response {
    let records = match params["typeName"].as_str() {
        Some("Device") => devices(),
        Some("DeviceStatusInfo") => device_statuses(),
        Some(other) => return rpc_error("MissingMethodException", &format!("no stub for {}", other)),
        None => return rpc_error("ArgumentException", "typeName is required"),
    };

    let search = &params["search"];
    let device_id = search["deviceSearch"]["id"].as_str();
    let id = search["id"].as_str();
    let offset = params["sort"]["offset"].as_str();
    let limit = params["resultsLimit"].as_u64().map_or(usize::MAX, |l| l as usize);

    let found: Vec<Value> = records
        .into_iter()
        .filter(|r| id.map_or(true, |id| r["id"] == id))
        .filter(|r| device_id.map_or(true, |id| r["device"]["id"] == id))
        .filter(|r| offset.map_or(true, |after| r["id"].as_str().is_some_and(|rid| rid > after)))
        .take(limit)
        .collect();
    rpc_result(Value::Array(found))
}

async fn rpc(State(adds): State<AddLog>, Json(request): Json<Value>) -> Response {
    let params = &request["params"];
    match request["method"].as_str() {
        Some("Authenticate") => authenticate(params),
        Some(method) => {
            if params["credentials"]["sessionId"] != SESSION_ID {
                return rpc_error("InvalidUserException", "Session expired");
            }
            match method {
                "Get" => get(params),
                "Add" => {
                    adds.lock().push(params.clone());
                    rpc_result(json!("b4"))
                }
                "Remove" => rpc_result(Value::Null),
                other => rpc_error("MissingMethodException", &format!("unknown method {}", other)),
            }
        }
        None => rpc_error("JSONRPCError", "method is required"),
    }
}

pub fn router(adds: AddLog) -> Router {
    Router::new().route("/apiv1", post(rpc)).with_state(adds)
}

pub async fn start() -> (StubServer, Arc<dyn EldProvider>) {
    let (server, provider, _) = start_with_config(GeotabConfig::default()).await;
    (server, provider)
}

/// Stub plus an adapter built from `config` (its `base_url` is replaced)
pub async fn start_with_config(
    config: GeotabConfig,
) -> (StubServer, Arc<dyn EldProvider>, AddLog) {
    let adds = AddLog::default();
    let server = start_stub(router(adds.clone())).await;
    let config = GeotabConfig {
        base_url: server.url("/apiv1"),
        ..config
    };
    let provider: Arc<dyn EldProvider> =
        Arc::new(GeotabProvider::new(config).expect("valid stub URL"));
    (server, provider, adds)
}

pub async fn start_authenticated() -> (StubServer, Arc<dyn EldProvider>) {
    let (server, provider) = start().await;
    provider
        .authenticate(&credentials())
        .await
        .expect("stub accepts the test login");
    (server, provider)
}
