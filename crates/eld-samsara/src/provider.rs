//! SamsaraProvider - EldProvider over the Samsara REST API

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eld_client::{encode_path_segment, ClientError, RequestAuth, RestClient};
use eld_core::base::format_timestamp;
use eld_core::{
    AuthToken, Credentials, Driver, Dvir, EldError, EldEvent, EldEventType, EldProvider,
    EldResult, EldVendor, FaultCode, Geofence, GeofenceEvent, HosClock, HosLog, HosViolation,
    IftaQuarter, IftaSummary, MaintenanceAlert, PageRequest, PaginatedResponse, Trailer, Vehicle,
    VehicleLocation, VehicleStats,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::SamsaraConfig;
use crate::mapping;
use crate::types::*;

const VENDOR: EldVendor = EldVendor::Samsara;

/// Samsara list endpoints accept at most this many records per page
const MAX_PAGE_SIZE: u32 = 512;

/// Upper bound on pages walked by a full-collection read
const MAX_PAGES: usize = 50;

/// Samsara keys never expire server-side; tokens get a one-year soft expiry
const SOFT_EXPIRY_DAYS: i64 = 365;

const LOCATION_TYPES: &str = "gps,engineStates,obdOdometerMeters";
const STATS_TYPES: &str = "obdOdometerMeters,engineStates,fuelPercents,obdEngineSeconds,ecuSpeedMph";

#[derive(Clone)]
struct Session {
    api_key: String,
    token: AuthToken,
}

/// `EldProvider` implementation for Samsara.
///
/// The API key is validated with a one-record vehicle list and then sent
/// as a bearer token on every request.
pub struct SamsaraProvider {
    client: RestClient,
    session: RwLock<Option<Session>>,
}

impl SamsaraProvider {
    /// Create an unauthenticated provider
    pub fn new(config: SamsaraConfig) -> EldResult<Self> {
        let client = RestClient::with_config(
            &config.base_url,
            config.timeout(),
            config.connect_timeout(),
        )
        .map_err(Self::map_err)?;

        Ok(Self {
            client,
            session: RwLock::new(None),
        })
    }

    /// Map client errors to provider errors
    fn map_err(e: ClientError) -> EldError {
        e.into_eld_error(VENDOR)
    }

    fn api_key(&self) -> EldResult<String> {
        self.session
            .read()
            .as_ref()
            .map(|s| s.api_key.clone())
            .ok_or(EldError::MissingSession(VENDOR))
    }

    fn issue_token(api_key: &str) -> AuthToken {
        AuthToken {
            access_token: api_key.to_string(),
            token_type: "Bearer".to_string(),
            expires_at: Utc::now() + Duration::days(SOFT_EXPIRY_DAYS),
            refresh_token: None,
        }
    }

    /// Issue the cheapest authenticated call there is
    async fn validate_key(&self, api_key: &str) -> EldResult<()> {
        self.client
            .get_json::<ListResponse<serde_json::Value>>(
                "/fleet/vehicles",
                &[("limit", "1".to_string())],
                RequestAuth::Bearer(api_key),
            )
            .await
            .map(|_| ())
            .map_err(Self::map_err)
    }

    // =========================================================================
    // Request helpers
    // =========================================================================

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> EldResult<T> {
        let api_key = self.api_key()?;
        self.client
            .get_json(path, query, RequestAuth::Bearer(&api_key))
            .await
            .map_err(Self::map_err)
    }

    async fn get_item<T: DeserializeOwned>(&self, path: &str) -> EldResult<Option<T>> {
        let api_key = self.api_key()?;
        self.client
            .get_optional::<ItemResponse<T>>(path, RequestAuth::Bearer(&api_key))
            .await
            .map(|r| r.map(|item| item.data))
            .map_err(Self::map_err)
    }

    /// One page of a list endpoint; `after` carries the vendor cursor
    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: &PageRequest,
    ) -> EldResult<PaginatedResponse<T>> {
        let limit = page.page_size().min(MAX_PAGE_SIZE);
        let mut query = vec![("limit", limit.to_string())];
        if let Some(cursor) = &page.cursor {
            query.push(("after", cursor.clone()));
        }

        let response: ListResponse<T> = self.get(path, &query).await?;
        let next = response.pagination.as_ref().and_then(Pagination::next_cursor);
        Ok(PaginatedResponse::new(response.data, next, limit))
    }

    /// Every record of a list endpoint, following cursors
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> EldResult<Vec<T>> {
        let mut records = Vec::new();
        let mut after: Option<String> = None;

        for page in 1..=MAX_PAGES {
            let mut page_query = query.to_vec();
            if let Some(cursor) = after.take() {
                page_query.push(("after", cursor));
            }

            let response: ListResponse<T> = self.get(path, &page_query).await?;
            records.extend(response.data);

            match response.pagination.as_ref().and_then(Pagination::next_cursor) {
                Some(cursor) => {
                    debug!(path, page, "Following Samsara cursor");
                    after = Some(cursor);
                }
                None => return Ok(records),
            }
        }

        warn!(path, max_pages = MAX_PAGES, "Page limit reached, result truncated");
        Ok(records)
    }
}

fn id_list(ids: &[String]) -> String {
    ids.join(",")
}

fn wanted(ids: Option<&[String]>, id: &str) -> bool {
    ids.map_or(true, |ids| ids.iter().any(|wanted| wanted == id))
}

fn time_range(start: DateTime<Utc>, end: DateTime<Utc>) -> [(&'static str, String); 2] {
    [
        ("startTime", format_timestamp(start)),
        ("endTime", format_timestamp(end)),
    ]
}

#[async_trait]
impl EldProvider for SamsaraProvider {
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
        let Credentials::Samsara { api_key } = credentials else {
            return Err(EldError::Configuration(format!(
                "expected samsara credentials, got {}",
                credentials.vendor()
            )));
        };
        if api_key.trim().is_empty() {
            return Err(EldError::authentication(VENDOR, "API key is empty"));
        }

        if let Err(e) = self.validate_key(api_key).await {
            warn!(error = %e, "Samsara rejected API key");
            return Err(e);
        }

        let token = Self::issue_token(api_key);
        *self.session.write() = Some(Session {
            api_key: api_key.clone(),
            token: token.clone(),
        });
        info!(expires_at = %token.expires_at, "Authenticated with Samsara");
        Ok(token)
    }

    async fn refresh_token(&self) -> EldResult<AuthToken> {
        let api_key = self.api_key()?;
        self.validate_key(&api_key).await?;

        let token = Self::issue_token(&api_key);
        if let Some(session) = self.session.write().as_mut() {
            session.token = token.clone();
        }
        debug!("Samsara token soft expiry extended");
        Ok(token)
    }

    async fn test_connection(&self) -> bool {
        let Ok(api_key) = self.api_key() else {
            return false;
        };
        match self.validate_key(&api_key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Samsara connection test failed");
                false
            }
        }
    }

    async fn revoke_access(&self) -> EldResult<()> {
        if self.session.write().take().is_some() {
            info!("Samsara session cleared");
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
        let mut query = vec![("types", LOCATION_TYPES.to_string())];
        if let Some(ids) = vehicle_ids {
            query.push(("vehicleIds", id_list(ids)));
        }

        let snapshots: Vec<VehicleStatsSnapshot> =
            self.get_all("/fleet/vehicles/stats", &query).await?;
        Ok(snapshots.iter().filter_map(mapping::location).collect())
    }

    async fn get_location_history(
        &self,
        vehicle_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<VehicleLocation>> {
        let mut query = vec![
            ("types", "gps".to_string()),
            ("vehicleIds", vehicle_id.to_string()),
        ];
        query.extend(time_range(start, end));

        let series: Vec<VehicleStatsSeries> =
            self.get_all("/fleet/vehicles/stats/history", &query).await?;
        Ok(series
            .iter()
            .filter(|s| s.id == vehicle_id)
            .flat_map(mapping::location_history)
            .collect())
    }

    // =========================================================================
    // Hours of Service
    // =========================================================================

    async fn get_hos_clocks(&self, driver_ids: Option<&[String]>) -> EldResult<Vec<HosClock>> {
        let mut query = Vec::new();
        if let Some(ids) = driver_ids {
            query.push(("driverIds", id_list(ids)));
        }

        let clocks: Vec<WireHosClock> = self.get_all("/fleet/hos/clocks", &query).await?;
        let now = Utc::now();
        Ok(clocks
            .into_iter()
            .map(|c| mapping::hos_clock(c, now))
            .collect())
    }

    async fn get_hos_logs(
        &self,
        driver_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<HosLog>> {
        let mut query = vec![("driverIds", driver_id.to_string())];
        query.extend(time_range(start, end));

        let drivers: Vec<DriverHosLogs> = self.get_all("/fleet/hos/logs", &query).await?;
        let mut logs: Vec<HosLog> = drivers
            .into_iter()
            .filter(|d| d.driver.id == driver_id)
            .flat_map(mapping::hos_logs)
            .collect();
        logs.sort_by_key(|l| l.start_time);
        Ok(logs)
    }

    async fn get_hos_violations(
        &self,
        driver_ids: Option<&[String]>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<HosViolation>> {
        let mut query = time_range(start, end).to_vec();
        if let Some(ids) = driver_ids {
            query.push(("driverIds", id_list(ids)));
        }

        let drivers: Vec<DriverViolations> =
            self.get_all("/fleet/hos/violations", &query).await?;
        Ok(drivers
            .into_iter()
            .flat_map(mapping::hos_violations)
            .collect())
    }

    // =========================================================================
    // Vehicles, Drivers, Trailers
    // =========================================================================

    async fn get_vehicles(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Vehicle>> {
        let page = self.get_page("/fleet/vehicles", page).await?;
        Ok(page.map(mapping::vehicle))
    }

    async fn get_vehicle(&self, vehicle_id: &str) -> EldResult<Option<Vehicle>> {
        let path = format!("/fleet/vehicles/{}", encode_path_segment(vehicle_id));
        let vehicle: Option<WireVehicle> = self.get_item(&path).await?;
        Ok(vehicle.map(mapping::vehicle))
    }

    async fn get_vehicle_stats(&self, vehicle_id: &str) -> EldResult<Option<VehicleStats>> {
        let query = [
            ("types", STATS_TYPES.to_string()),
            ("vehicleIds", vehicle_id.to_string()),
        ];
        let response: ListResponse<VehicleStatsSnapshot> =
            self.get("/fleet/vehicles/stats", &query).await?;
        Ok(response
            .data
            .iter()
            .find(|s| s.id == vehicle_id)
            .and_then(mapping::vehicle_stats))
    }

    async fn get_vehicle_stats_history(
        &self,
        vehicle_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<VehicleStats>> {
        let mut query = vec![
            ("types", STATS_TYPES.to_string()),
            ("vehicleIds", vehicle_id.to_string()),
        ];
        query.extend(time_range(start, end));

        let series: Vec<VehicleStatsSeries> =
            self.get_all("/fleet/vehicles/stats/history", &query).await?;
        Ok(series
            .iter()
            .filter(|s| s.id == vehicle_id)
            .flat_map(mapping::vehicle_stats_history)
            .collect())
    }

    async fn get_drivers(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Driver>> {
        let page = self.get_page("/fleet/drivers", page).await?;
        Ok(page.map(mapping::driver))
    }

    async fn get_driver(&self, driver_id: &str) -> EldResult<Option<Driver>> {
        let path = format!("/fleet/drivers/{}", encode_path_segment(driver_id));
        let driver: Option<WireDriver> = self.get_item(&path).await?;
        Ok(driver.map(mapping::driver))
    }

    async fn get_trailers(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Trailer>> {
        let page = self.get_page("/fleet/trailers", page).await?;
        Ok(page.map(mapping::trailer))
    }

    async fn get_trailer(&self, trailer_id: &str) -> EldResult<Option<Trailer>> {
        let path = format!("/fleet/trailers/{}", encode_path_segment(trailer_id));
        let trailer: Option<WireTrailer> = self.get_item(&path).await?;
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
        let mut query = vec![("types", "faultCodes".to_string())];
        if let Some(ids) = vehicle_ids {
            query.push(("vehicleIds", id_list(ids)));
        }

        let snapshots: Vec<VehicleStatsSnapshot> =
            self.get_all("/fleet/vehicles/stats", &query).await?;
        Ok(snapshots
            .iter()
            .flat_map(mapping::fault_codes)
            .filter(|f| !active_only || f.is_active())
            .collect())
    }

    async fn get_maintenance_alerts(
        &self,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<Vec<MaintenanceAlert>> {
        let query = [("isResolved", "false".to_string())];
        let defects: Vec<WireDefect> = self.get_all("/fleet/defects/stream", &query).await?;
        Ok(defects
            .into_iter()
            .filter_map(mapping::maintenance_alert)
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
        let query = time_range(start, end);
        let dvirs: Vec<WireDvir> = self.get_all("/fleet/dvirs/history", &query).await?;
        Ok(dvirs
            .into_iter()
            .filter_map(mapping::dvir)
            .filter(|d| wanted(vehicle_ids, &d.vehicle_id))
            .collect())
    }

    async fn get_dvir(&self, dvir_id: &str) -> EldResult<Option<Dvir>> {
        let path = format!("/fleet/dvirs/{}", encode_path_segment(dvir_id));
        let dvir: Option<WireDvir> = self.get_item(&path).await?;
        Ok(dvir.and_then(mapping::dvir))
    }

    // =========================================================================
    // Fuel Tax
    // =========================================================================

    async fn get_ifta_summary(
        &self,
        quarter: IftaQuarter,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<IftaSummary> {
        let mut query = vec![
            ("year", quarter.year().to_string()),
            ("quarter", format!("Q{}", quarter.quarter())),
        ];
        if let Some(ids) = vehicle_ids {
            query.push(("vehicleIds", id_list(ids)));
        }

        let report: ItemResponse<IftaReport> = self
            .get("/fleet/reports/ifta/jurisdiction", &query)
            .await?;
        let rows = report
            .data
            .jurisdiction_reports
            .into_iter()
            .map(mapping::jurisdiction)
            .collect();
        Ok(IftaSummary::from_jurisdictions(&quarter, rows))
    }

    // =========================================================================
    // Geofencing
    // =========================================================================

    async fn get_geofences(&self) -> EldResult<Vec<Geofence>> {
        let addresses: Vec<WireAddress> = self.get_all("/addresses", &[]).await?;
        Ok(addresses.into_iter().filter_map(mapping::geofence).collect())
    }

    async fn get_geofence_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        geofence_id: Option<&str>,
    ) -> EldResult<Vec<GeofenceEvent>> {
        let mut query = vec![("types", "geofenceEntry,geofenceExit".to_string())];
        query.extend(time_range(start, end));

        let events: Vec<WireFleetEvent> = self.get_all("/fleet/events", &query).await?;
        Ok(events
            .into_iter()
            .filter_map(mapping::geofence_event)
            .filter(|e| geofence_id.map_or(true, |id| e.geofence_id == id))
            .collect())
    }

    // =========================================================================
    // Webhooks
    // =========================================================================

    async fn subscribe_to_events(
        &self,
        event_types: &[EldEventType],
        callback_url: &str,
    ) -> EldResult<String> {
        let names: Vec<&'static str> = event_types
            .iter()
            .filter_map(|t| mapping::event_type_name(*t))
            .collect();
        if names.is_empty() {
            return Err(EldError::InvalidRequest(
                "no Samsara webhook event types requested".to_string(),
            ));
        }

        let body = CreateWebhook {
            name: format!("eld-integration-{}", Utc::now().timestamp()),
            url: callback_url,
            event_types: names,
        };
        let api_key = self.api_key()?;
        let created: WebhookCreated = self
            .client
            .post_json("/webhooks", &body, RequestAuth::Bearer(&api_key))
            .await
            .map_err(Self::map_err)?;

        info!(subscription_id = %created.id, "Samsara webhook created");
        Ok(created.id)
    }

    async fn unsubscribe_from_events(&self, subscription_id: &str) -> EldResult<()> {
        let api_key = self.api_key()?;
        let path = format!("/webhooks/{}", encode_path_segment(subscription_id));
        self.client
            .delete(&path, RequestAuth::Bearer(&api_key))
            .await
            .map_err(Self::map_err)?;

        info!(subscription_id, "Samsara webhook removed");
        Ok(())
    }

    fn parse_webhook_payload(&self, payload: &serde_json::Value) -> Vec<EldEvent> {
        mapping::webhook_event(payload).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> SamsaraProvider {
        SamsaraProvider::new(SamsaraConfig::default()).unwrap()
    }

    #[test]
    fn test_new_provider_is_unauthenticated() {
        let provider = provider();
        assert_eq!(provider.vendor(), EldVendor::Samsara);
        assert!(provider.auth_token().is_none());
        assert!(provider.is_token_expired());
    }

    #[tokio::test]
    async fn test_calls_before_authenticate_fail() {
        let provider = provider();
        let err = provider.get_vehicle("1").await.unwrap_err();
        assert!(matches!(err, EldError::MissingSession(EldVendor::Samsara)));
        assert!(!provider.test_connection().await);
    }

    #[tokio::test]
    async fn test_wrong_credentials_kind() {
        let err = provider()
            .authenticate(&Credentials::Motive {
                api_key: "k".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EldError::Configuration(_)));
    }

    #[test]
    fn test_issued_token_expires_in_a_year() {
        let token = SamsaraProvider::issue_token("k");
        let days = (token.expires_at - Utc::now()).num_days();
        assert!((364..=365).contains(&days));
        assert_eq!(token.access_token, "k");
    }

    #[test]
    fn test_parse_webhook_yields_one_event() {
        let events = provider().parse_webhook_payload(&serde_json::json!({
            "eventId": "e1",
            "eventTime": "2024-05-01T00:00:00Z",
            "eventType": "VehicleUpdated",
            "data": {}
        }));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EldEventType::VehicleUpdated);
    }
}
