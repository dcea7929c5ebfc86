//! GeotabProvider - EldProvider over the MyGeotab JSON-RPC API

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eld_client::{ClientError, RequestAuth, RestClient};
use eld_core::base::{format_timestamp, parse_timestamp};
use eld_core::{
    AuthToken, Credentials, Driver, Dvir, EldError, EldEvent, EldEventType, EldProvider,
    EldResult, EldVendor, FaultCode, Geofence, GeofenceEvent, HosClock, HosLog, HosViolation,
    IftaQuarter, IftaSummary, MaintenanceAlert, PageRequest, PaginatedResponse, Trailer, Vehicle,
    VehicleLocation, VehicleStats,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{server_endpoint, GeotabConfig};
use crate::mapping;
use crate::rpc::{AuthenticateResult, RpcRequest, RpcResponse, SessionCredentials};
use crate::types::*;

const VENDOR: EldVendor = EldVendor::Geotab;

/// MyGeotab sessions stay valid for 14 days
const SESSION_LIFETIME_DAYS: i64 = 14;

/// Window searched for the driver's current duty status
const CURRENT_STATUS_LOOKBACK_DAYS: i64 = 8;

/// Login retained so an expired session can be re-established
#[derive(Clone)]
struct Login {
    username: String,
    password: String,
    database: String,
    server: Option<String>,
}

#[derive(Clone)]
struct Session {
    login: Login,
    credentials: SessionCredentials,
    endpoint: Url,
    token: AuthToken,
}

/// `EldProvider` implementation for Geotab.
///
/// `Authenticate` yields a session id that is echoed in the `credentials`
/// of every subsequent call. When the response names another federation
/// server in `path`, later calls go there.
pub struct GeotabProvider {
    client: RestClient,
    config: GeotabConfig,
    session: RwLock<Option<Session>>,
}

impl GeotabProvider {
    /// Create an unauthenticated provider
    pub fn new(config: GeotabConfig) -> EldResult<Self> {
        let client = RestClient::with_config(
            &config.base_url,
            config.timeout(),
            config.connect_timeout(),
        )
        .map_err(Self::map_err)?;

        Ok(Self {
            client,
            config,
            session: RwLock::new(None),
        })
    }

    fn map_err(e: ClientError) -> EldError {
        e.into_eld_error(VENDOR)
    }

    fn session(&self) -> EldResult<Session> {
        self.session
            .read()
            .clone()
            .ok_or(EldError::MissingSession(VENDOR))
    }

    fn login_endpoint(&self, login: &Login) -> EldResult<Url> {
        match &login.server {
            Some(server) => Url::parse(&server_endpoint(server))
                .map_err(|e| EldError::Configuration(format!("invalid Geotab server: {}", e))),
            None => Ok(self.client.base_url().clone()),
        }
    }

    /// POST one JSON-RPC call and unwrap `result`/`error`
    async fn rpc<T: DeserializeOwned>(
        &self,
        endpoint: Url,
        method: &str,
        params: Value,
    ) -> EldResult<Option<T>> {
        let request = RpcRequest { method, params };
        let response: RpcResponse<T> = self
            .client
            .post_json_url(endpoint, &request, RequestAuth::None)
            .await
            .map_err(Self::map_err)?;
        response.into_result().map_err(|e| e.into_eld_error())
    }

    /// Exchange a login for a session, following any server redirect
    async fn open_session(&self, login: Login) -> EldResult<Session> {
        let endpoint = self.login_endpoint(&login)?;
        let params = json!({
            "userName": login.username,
            "password": login.password,
            "database": login.database,
        });

        let result: AuthenticateResult = self
            .rpc(endpoint.clone(), "Authenticate", params)
            .await?
            .ok_or_else(|| EldError::Parse {
                vendor: VENDOR,
                message: "Authenticate returned no result".to_string(),
            })?;

        let endpoint = match result.redirect() {
            Some(server) => {
                debug!(server, "Geotab redirected session");
                Url::parse(&server_endpoint(server)).map_err(|e| EldError::Parse {
                    vendor: VENDOR,
                    message: format!("invalid redirect path {:?}: {}", server, e),
                })?
            }
            None => endpoint,
        };

        let token = AuthToken {
            access_token: result.credentials.session_id.clone(),
            token_type: "Session".to_string(),
            expires_at: Utc::now() + Duration::days(SESSION_LIFETIME_DAYS),
            refresh_token: None,
        };

        Ok(Session {
            login,
            credentials: result.credentials,
            endpoint,
            token,
        })
    }

    /// Authenticated call: session credentials are added to `params`
    async fn call<T: DeserializeOwned>(&self, method: &str, mut params: Value) -> EldResult<Option<T>> {
        let session = self.session()?;
        if let Value::Object(map) = &mut params {
            map.insert(
                "credentials".to_string(),
                serde_json::to_value(&session.credentials).map_err(|e| EldError::Parse {
                    vendor: VENDOR,
                    message: e.to_string(),
                })?,
            );
        }
        self.rpc(session.endpoint, method, params).await
    }

    /// `Get` of one entity type
    async fn get<T: DeserializeOwned>(
        &self,
        type_name: &str,
        search: Option<Value>,
        results_limit: Option<u32>,
    ) -> EldResult<Vec<T>> {
        let mut params = json!({ "typeName": type_name });
        if let Some(search) = search {
            params["search"] = search;
        }
        if let Some(limit) = results_limit {
            params["resultsLimit"] = json!(limit);
        }
        Ok(self.call("Get", params).await?.unwrap_or_default())
    }

    /// First entity matching `{id}`, if any
    async fn get_by_id<T: DeserializeOwned>(&self, type_name: &str, id: &str) -> EldResult<Option<T>> {
        let found: Vec<T> = self
            .get(type_name, Some(json!({ "id": id })), Some(1))
            .await?;
        Ok(found.into_iter().next())
    }

    /// One id-ordered page; the cursor is the last id returned
    async fn get_page<T, F>(
        &self,
        type_name: &str,
        search: Option<Value>,
        page: &PageRequest,
        id_of: F,
    ) -> EldResult<PaginatedResponse<T>>
    where
        T: DeserializeOwned + Send,
        F: Fn(&T) -> &str + Send,
    {
        let limit = page.page_size();
        let mut params = json!({
            "typeName": type_name,
            "resultsLimit": limit,
            "sort": { "sortBy": "id", "sortDirection": "asc" },
        });
        if let Some(search) = search {
            params["search"] = search;
        }
        if let Some(cursor) = &page.cursor {
            params["sort"]["offset"] = json!(cursor);
        }

        let records: Vec<T> = self.call("Get", params).await?.unwrap_or_default();
        let next = if records.len() as u32 >= limit {
            records.last().map(|r| id_of(r).to_string())
        } else {
            None
        };
        Ok(PaginatedResponse::new(records, next, limit))
    }

    /// Display names of every driver
    async fn driver_names(&self) -> EldResult<HashMap<String, String>> {
        let users: Vec<User> = self
            .get("User", Some(json!({ "isDriver": true })), None)
            .await?;
        Ok(users
            .iter()
            .map(|u| (u.id.clone(), mapping::user_display_name(u)))
            .collect())
    }

    async fn driver_name(&self, driver_id: &str) -> EldResult<String> {
        let user: Option<User> = self.get_by_id("User", driver_id).await?;
        Ok(user
            .as_ref()
            .map(mapping::user_display_name)
            .unwrap_or_default())
    }

    async fn status_data(
        &self,
        vehicle_id: &str,
        diagnostic: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EldResult<Vec<StatusData>> {
        let search = json!({
            "deviceSearch": { "id": vehicle_id },
            "diagnosticSearch": { "id": diagnostic },
            "fromDate": format_timestamp(from),
            "toDate": format_timestamp(to),
        });
        self.get("StatusData", Some(search), None).await
    }
}

/// Geotab searches take one device; narrow server-side only for a single id
fn device_search(ids: Option<&[String]>) -> Option<Value> {
    match ids {
        Some([id]) => Some(json!({ "id": id })),
        _ => None,
    }
}

fn wanted(ids: Option<&[String]>, id: &str) -> bool {
    ids.map_or(true, |ids| ids.iter().any(|wanted| wanted == id))
}

fn date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Value {
    json!({
        "fromDate": format_timestamp(start),
        "toDate": format_timestamp(end),
    })
}

#[async_trait]
impl EldProvider for GeotabProvider {
    fn vendor(&self) -> EldVendor {
        VENDOR
    }

    fn auth_token(&self) -> Option<AuthToken> {
        self.session.read().as_ref().map(|s| s.token.clone())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    async fn authenticate(&self, credentials: &Credentials) -> EldResult<AuthToken> {
        let Credentials::Geotab {
            username,
            password,
            database,
            server,
        } = credentials
        else {
            return Err(EldError::Configuration(format!(
                "expected geotab credentials, got {}",
                credentials.vendor()
            )));
        };

        let login = Login {
            username: username.clone(),
            password: password.clone(),
            database: database.clone(),
            server: server.clone(),
        };
        let session = match self.open_session(login).await {
            Ok(session) => session,
            Err(e) => {
                warn!(database = %database, error = %e, "Geotab authentication failed");
                return Err(e);
            }
        };

        let token = session.token.clone();
        info!(
            database = %database,
            endpoint = %session.endpoint,
            expires_at = %token.expires_at,
            "Authenticated with Geotab"
        );
        *self.session.write() = Some(session);
        Ok(token)
    }

    /// Geotab has no refresh grant; re-authenticate with the retained login
    async fn refresh_token(&self) -> EldResult<AuthToken> {
        let login = self.session()?.login;
        let session = self.open_session(login).await?;
        let token = session.token.clone();
        *self.session.write() = Some(session);
        debug!("Geotab session renewed");
        Ok(token)
    }

    async fn test_connection(&self) -> bool {
        if self.session.read().is_none() {
            return false;
        }
        match self.get::<Value>("Device", None, Some(1)).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Geotab connection test failed");
                false
            }
        }
    }

    async fn revoke_access(&self) -> EldResult<()> {
        if self.session.write().take().is_some() {
            info!("Geotab session dropped");
        }
        Ok(())
    }

    // =========================================================================
    // Location
    // =========================================================================

    async fn get_vehicle_locations(
        &self,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<Vec<VehicleLocation>> {
        let search = device_search(vehicle_ids).map(|device| json!({ "deviceSearch": device }));
        let statuses: Vec<DeviceStatusInfo> = self.get("DeviceStatusInfo", search, None).await?;
        Ok(statuses
            .into_iter()
            .filter_map(mapping::location)
            .filter(|l| wanted(vehicle_ids, &l.vehicle_id))
            .collect())
    }

    async fn get_location_history(
        &self,
        vehicle_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<VehicleLocation>> {
        let mut search = date_range(start, end);
        search["deviceSearch"] = json!({ "id": vehicle_id });

        let records: Vec<LogRecord> = self.get("LogRecord", Some(search), None).await?;
        let mut trail: Vec<VehicleLocation> =
            records.into_iter().filter_map(mapping::log_record).collect();
        trail.sort_by_key(|l| l.timestamp);
        Ok(trail)
    }

    // =========================================================================
    // Hours of Service
    // =========================================================================

    async fn get_hos_clocks(&self, driver_ids: Option<&[String]>) -> EldResult<Vec<HosClock>> {
        let user_search = device_search(driver_ids);
        let availability: Vec<DutyStatusAvailability> = self
            .get(
                "DutyStatusAvailability",
                user_search.clone().map(|u| json!({ "userSearch": u })),
                None,
            )
            .await?;

        let now = Utc::now();
        let mut status_search = date_range(now - Duration::days(CURRENT_STATUS_LOOKBACK_DAYS), now);
        if let Some(user) = user_search {
            status_search["userSearch"] = user;
        }
        let recent: Vec<DutyStatusLog> = self
            .get("DutyStatusLog", Some(status_search), None)
            .await?;

        let mut current: HashMap<String, DutyStatusLog> = HashMap::new();
        for log in recent {
            let at = parse_timestamp(&log.date_time);
            let newer = current
                .get(log.driver.id())
                .map_or(true, |seen| parse_timestamp(&seen.date_time) < at);
            if newer {
                current.insert(log.driver.id().to_string(), log);
            }
        }

        let names = self.driver_names().await?;
        Ok(availability
            .into_iter()
            .filter(|a| wanted(driver_ids, a.driver.id()))
            .map(|a| {
                let id = a.driver.id().to_string();
                mapping::hos_clock(
                    a,
                    names.get(&id).map(String::as_str),
                    current.get(&id),
                    now,
                )
            })
            .collect())
    }

    async fn get_hos_logs(
        &self,
        driver_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<HosLog>> {
        let mut search = date_range(start, end);
        search["userSearch"] = json!({ "id": driver_id });

        let logs: Vec<DutyStatusLog> = self.get("DutyStatusLog", Some(search), None).await?;
        let logs: Vec<DutyStatusLog> = logs
            .into_iter()
            .filter(|l| l.driver.id() == driver_id)
            .collect();
        let name = self.driver_name(driver_id).await?;
        Ok(mapping::hos_logs(logs, &name, end.min(Utc::now())))
    }

    async fn get_hos_violations(
        &self,
        driver_ids: Option<&[String]>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<HosViolation>> {
        let mut search = date_range(start, end);
        if let Some(user) = device_search(driver_ids) {
            search["userSearch"] = user;
        }

        let violations: Vec<DutyStatusViolation> = self
            .get("DutyStatusViolation", Some(search), None)
            .await?;
        Ok(violations
            .into_iter()
            .filter_map(mapping::hos_violation)
            .filter(|v| wanted(driver_ids, &v.driver_id))
            .collect())
    }

    // =========================================================================
    // Vehicles, Drivers, Trailers
    // =========================================================================

    async fn get_vehicles(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Vehicle>> {
        let page = self
            .get_page("Device", None, page, |d: &Device| d.id.as_str())
            .await?;
        let now = Utc::now();
        Ok(page.map(|d| mapping::vehicle(d, now)))
    }

    async fn get_vehicle(&self, vehicle_id: &str) -> EldResult<Option<Vehicle>> {
        let device: Option<Device> = self.get_by_id("Device", vehicle_id).await?;
        Ok(device.map(|d| mapping::vehicle(d, Utc::now())))
    }

    async fn get_vehicle_stats(&self, vehicle_id: &str) -> EldResult<Option<VehicleStats>> {
        // Equal from/to dates return the latest record of each diagnostic.
        let now = Utc::now();
        let mut records = Vec::new();
        for diagnostic in mapping::STATS_DIAGNOSTICS {
            records.extend(self.status_data(vehicle_id, diagnostic, now, now).await?);
        }
        Ok(mapping::latest_vehicle_stats(vehicle_id, &records))
    }

    async fn get_vehicle_stats_history(
        &self,
        vehicle_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<VehicleStats>> {
        let mut records = Vec::new();
        for diagnostic in mapping::STATS_DIAGNOSTICS {
            records.extend(self.status_data(vehicle_id, diagnostic, start, end).await?);
        }
        Ok(mapping::vehicle_stats_history(vehicle_id, &records))
    }

    async fn get_drivers(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Driver>> {
        let page = self
            .get_page(
                "User",
                Some(json!({ "isDriver": true })),
                page,
                |u: &User| u.id.as_str(),
            )
            .await?;
        let now = Utc::now();
        Ok(page.map(|u| mapping::driver(u, now)))
    }

    async fn get_driver(&self, driver_id: &str) -> EldResult<Option<Driver>> {
        let user: Option<User> = self.get_by_id("User", driver_id).await?;
        Ok(user.map(|u| mapping::driver(u, Utc::now())))
    }

    async fn get_trailers(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Trailer>> {
        let page = self
            .get_page("Trailer", None, page, |t: &GeotabTrailer| t.id.as_str())
            .await?;
        Ok(page.map(mapping::trailer))
    }

    async fn get_trailer(&self, trailer_id: &str) -> EldResult<Option<Trailer>> {
        let trailer: Option<GeotabTrailer> = self.get_by_id("Trailer", trailer_id).await?;
        Ok(trailer.map(mapping::trailer))
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    async fn get_fault_codes(
        &self,
        vehicle_ids: Option<&[String]>,
        active_only: bool,
    ) -> EldResult<Vec<FaultCode>> {
        let now = Utc::now();
        let mut search = date_range(mapping::lookback(now, self.config.fault_lookback_days), now);
        if let Some(device) = device_search(vehicle_ids) {
            search["deviceSearch"] = device;
        }

        let faults: Vec<FaultData> = self.get("FaultData", Some(search), None).await?;
        Ok(faults
            .into_iter()
            .filter_map(mapping::fault_code)
            .filter(|f| wanted(vehicle_ids, &f.vehicle_id))
            .filter(|f| !active_only || f.is_active())
            .collect())
    }

    async fn get_maintenance_alerts(
        &self,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<Vec<MaintenanceAlert>> {
        let search = device_search(vehicle_ids).map(|device| json!({ "deviceSearch": device }));
        let reminders: Vec<MaintenanceReminder> =
            self.get("MaintenanceReminder", search, None).await?;
        Ok(reminders
            .into_iter()
            .map(mapping::maintenance_alert)
            .filter(|a| wanted(vehicle_ids, &a.vehicle_id))
            .collect())
    }

    // =========================================================================
    // Inspections
    // =========================================================================

    async fn get_dvirs(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<Vec<Dvir>> {
        let mut search = date_range(start, end);
        if let Some(device) = device_search(vehicle_ids) {
            search["deviceSearch"] = device;
        }

        let logs: Vec<DvirLog> = self.get("DVIRLog", Some(search), None).await?;
        Ok(logs
            .into_iter()
            .filter_map(mapping::dvir)
            .filter(|d| wanted(vehicle_ids, &d.vehicle_id))
            .collect())
    }

    async fn get_dvir(&self, dvir_id: &str) -> EldResult<Option<Dvir>> {
        let log: Option<DvirLog> = self.get_by_id("DVIRLog", dvir_id).await?;
        Ok(log.and_then(mapping::dvir))
    }

    // =========================================================================
    // Fuel Tax
    // =========================================================================

    async fn get_ifta_summary(
        &self,
        quarter: IftaQuarter,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<IftaSummary> {
        let mut search = date_range(quarter.start(), quarter.end());
        if let Some(device) = device_search(vehicle_ids) {
            search["deviceSearch"] = device;
        }

        let details: Vec<FuelTaxDetail> = self
            .get("FuelTaxDetail", Some(search.clone()), None)
            .await?;
        let fuel: Vec<FuelTransaction> = self
            .get("FuelTransaction", Some(search), None)
            .await?;

        let details: Vec<FuelTaxDetail> = details
            .into_iter()
            .filter(|d| wanted(vehicle_ids, d.device.id()))
            .collect();
        let fuel: Vec<FuelTransaction> = fuel
            .into_iter()
            .filter(|f| {
                vehicle_ids.is_none()
                    || f.device
                        .as_ref()
                        .is_some_and(|d| wanted(vehicle_ids, d.id()))
            })
            .collect();
        Ok(mapping::ifta_summary(&quarter, &details, &fuel))
    }

    // =========================================================================
    // Geofencing
    // =========================================================================

    async fn get_geofences(&self) -> EldResult<Vec<Geofence>> {
        let zones: Vec<Zone> = self.get("Zone", None, None).await?;
        Ok(zones.into_iter().map(mapping::geofence).collect())
    }

    async fn get_geofence_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        geofence_id: Option<&str>,
    ) -> EldResult<Vec<GeofenceEvent>> {
        let zones: Vec<Zone> = self.get("Zone", None, None).await?;
        let zone_names: HashMap<String, String> =
            zones.into_iter().map(|z| (z.id, z.name)).collect();

        let mut search = date_range(start, end);
        if let Some(id) = geofence_id {
            search["ruleSearch"] = json!({ "id": id });
        }

        let exceptions: Vec<ExceptionEvent> =
            self.get("ExceptionEvent", Some(search), None).await?;
        Ok(exceptions
            .into_iter()
            .filter(|e| match geofence_id {
                Some(id) => e.rule.id() == id,
                None => zone_names.contains_key(e.rule.id()),
            })
            .flat_map(|e| mapping::geofence_events(e, &zone_names))
            .collect())
    }

    // =========================================================================
    // Webhooks
    // =========================================================================

    /// Registers a distribution list with a web-request recipient, attached
    /// to the exception rules configured for the requested event types.
    async fn subscribe_to_events(
        &self,
        event_types: &[EldEventType],
        callback_url: &str,
    ) -> EldResult<String> {
        let rules: Vec<Value> = self
            .config
            .rules_for(event_types)?
            .into_iter()
            .map(|id| json!({ "id": id }))
            .collect();
        let labels: Vec<String> = event_types.iter().map(|t| format!("{:?}", t)).collect();
        let params = json!({
            "typeName": "DistributionList",
            "entity": {
                "name": format!("eld-integration {}", labels.join(",")),
                "recipients": [{
                    "recipientType": "WebRequest",
                    "address": callback_url,
                }],
                "rules": rules,
            },
        });

        let id: String = self.call("Add", params).await?.ok_or_else(|| EldError::Parse {
            vendor: VENDOR,
            message: "Add DistributionList returned no id".to_string(),
        })?;
        info!(subscription_id = %id, "Geotab distribution list created");
        Ok(id)
    }

    async fn unsubscribe_from_events(&self, subscription_id: &str) -> EldResult<()> {
        let params = json!({
            "typeName": "DistributionList",
            "entity": { "id": subscription_id },
        });
        let _: Option<Value> = self.call("Remove", params).await?;
        info!(subscription_id, "Geotab distribution list removed");
        Ok(())
    }

    fn parse_webhook_payload(&self, payload: &serde_json::Value) -> Vec<EldEvent> {
        mapping::webhook_events(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_search_only_for_single_id() {
        assert_eq!(device_search(None), None);
        let one = vec!["b1".to_string()];
        assert_eq!(device_search(Some(&one)), Some(json!({"id": "b1"})));
        let two = vec!["b1".to_string(), "b2".to_string()];
        assert_eq!(device_search(Some(&two)), None);
    }

    #[tokio::test]
    async fn test_unauthenticated_provider() {
        let provider = GeotabProvider::new(GeotabConfig::default()).unwrap();
        assert!(provider.auth_token().is_none());
        assert!(!provider.test_connection().await);
        assert!(matches!(
            provider.refresh_token().await,
            Err(EldError::MissingSession(EldVendor::Geotab))
        ));
        assert!(matches!(
            provider.get_vehicle("b1").await,
            Err(EldError::MissingSession(EldVendor::Geotab))
        ));
    }

    #[tokio::test]
    async fn test_wrong_credentials_kind() {
        let provider = GeotabProvider::new(GeotabConfig::default()).unwrap();
        let err = provider
            .authenticate(&Credentials::Samsara {
                api_key: "k".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EldError::Configuration(_)));
    }
}
