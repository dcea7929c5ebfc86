//! MotiveProvider - EldProvider over the Motive v1 REST API

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use eld_client::{encode_path_segment, ClientError, RequestAuth, RestClient};
use eld_core::base::format_date;
use eld_core::{
    AuthToken, Credentials, Driver, Dvir, EldError, EldEvent, EldEventType, EldProvider,
    EldResult, EldVendor, FaultCode, Geofence, GeofenceEvent, HosClock, HosLog, HosViolation,
    IftaQuarter, IftaSummary, MaintenanceAlert, PageRequest, PaginatedResponse, Trailer, Vehicle,
    VehicleLocation, VehicleStats,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::MotiveConfig;
use crate::mapping;
use crate::types::*;

const VENDOR: EldVendor = EldVendor::Motive;

const API_KEY_HEADER: &str = "X-Api-Key";

/// Motive list endpoints accept at most this many records per page
const MAX_PAGE_SIZE: u32 = 100;

/// Upper bound on pages walked by a full-collection read
const MAX_PAGES: u32 = 50;

/// API keys carry no server-side expiry; tokens get a one-year soft expiry
const SOFT_EXPIRY_DAYS: i64 = 365;

#[derive(Clone)]
struct Session {
    api_key: String,
    token: AuthToken,
}

/// `EldProvider` implementation for Motive.
///
/// Authenticates with an API key sent in the `X-Api-Key` header.
pub struct MotiveProvider {
    client: RestClient,
    session: RwLock<Option<Session>>,
}

impl MotiveProvider {
    pub fn new(config: MotiveConfig) -> EldResult<Self> {
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

    fn key_auth(api_key: &str) -> RequestAuth<'_> {
        RequestAuth::Header {
            name: API_KEY_HEADER,
            value: api_key,
        }
    }

    async fn validate_key(&self, api_key: &str) -> EldResult<()> {
        self.client
            .get_json::<UsersPage>(
                "/users",
                &[("per_page", "1".to_string())],
                Self::key_auth(api_key),
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
            .get_json(path, query, Self::key_auth(&api_key))
            .await
            .map_err(Self::map_err)
    }

    async fn get_item<T: DeserializeOwned>(&self, path: &str) -> EldResult<Option<T>> {
        let api_key = self.api_key()?;
        self.client
            .get_optional(path, Self::key_auth(&api_key))
            .await
            .map_err(Self::map_err)
    }

    /// One page; the cursor is the next `page_no`
    async fn get_page<P>(
        &self,
        path: &str,
        query: &[(&str, String)],
        page: &PageRequest,
    ) -> EldResult<PaginatedResponse<P::Item>>
    where
        P: ListPage + DeserializeOwned,
    {
        let per_page = page.page_size().min(MAX_PAGE_SIZE);
        let page_no = match &page.cursor {
            Some(cursor) => cursor.parse::<u32>().map_err(|_| {
                EldError::InvalidRequest(format!("invalid Motive page cursor: {:?}", cursor))
            })?,
            None => 1,
        };

        let mut page_query = query.to_vec();
        page_query.push(("per_page", per_page.to_string()));
        page_query.push(("page_no", page_no.to_string()));

        let response: P = self.get(path, &page_query).await?;
        let (records, pagination) = response.into_parts();
        let next = pagination
            .and_then(|p| p.next_page())
            .map(|n| n.to_string());
        let total = pagination.map(|p| p.total);

        let page = PaginatedResponse::new(records, next, per_page);
        Ok(match total {
            Some(total) => page.with_total(total),
            None => page,
        })
    }

    /// Every record, walking `page_no` until the total is reached
    async fn get_all<P>(&self, path: &str, query: &[(&str, String)]) -> EldResult<Vec<P::Item>>
    where
        P: ListPage + DeserializeOwned,
    {
        let mut records = Vec::new();
        let mut page = PageRequest::first(MAX_PAGE_SIZE);

        for _ in 0..MAX_PAGES {
            let response = self.get_page::<P>(path, query, &page).await?;
            records.extend(response.data);
            match response.cursor {
                Some(next) => {
                    debug!(path, page_no = %next, "Following Motive page");
                    page = PageRequest::after(MAX_PAGE_SIZE, next);
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

fn date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> [(&'static str, String); 2] {
    [("start_date", format_date(start)), ("end_date", format_date(end))]
}

#[async_trait]
impl EldProvider for MotiveProvider {
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
        let Credentials::Motive { api_key } = credentials else {
            return Err(EldError::Configuration(format!(
                "expected motive credentials, got {}",
                credentials.vendor()
            )));
        };
        if api_key.trim().is_empty() {
            return Err(EldError::authentication(VENDOR, "API key is empty"));
        }

        if let Err(e) = self.validate_key(api_key).await {
            warn!(error = %e, "Motive rejected API key");
            return Err(e);
        }

        let token = AuthToken {
            access_token: api_key.clone(),
            token_type: "ApiKey".to_string(),
            expires_at: Utc::now() + Duration::days(SOFT_EXPIRY_DAYS),
            refresh_token: None,
        };
        *self.session.write() = Some(Session {
            api_key: api_key.clone(),
            token: token.clone(),
        });
        info!(expires_at = %token.expires_at, "Authenticated with Motive");
        Ok(token)
    }

    /// API keys have nothing to refresh; the OAuth2 flow would plug in here
    async fn refresh_token(&self) -> EldResult<AuthToken> {
        self.auth_token().ok_or(EldError::MissingSession(VENDOR))
    }

    async fn test_connection(&self) -> bool {
        let Ok(api_key) = self.api_key() else {
            return false;
        };
        match self.validate_key(&api_key).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Motive connection test failed");
                false
            }
        }
    }

    async fn revoke_access(&self) -> EldResult<()> {
        if self.session.write().take().is_some() {
            info!("Motive session cleared");
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
        let mut query = Vec::new();
        if let Some(ids) = vehicle_ids {
            query.push(("vehicle_ids", id_list(ids)));
        }

        let vehicles = self
            .get_all::<VehicleLocationsPage>("/vehicle_locations", &query)
            .await?;
        Ok(vehicles
            .into_iter()
            .filter(|v| wanted(vehicle_ids, &v.id))
            .filter_map(mapping::current_location)
            .collect())
    }

    async fn get_location_history(
        &self,
        vehicle_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<VehicleLocation>> {
        let path = format!("/vehicle_locations/{}", encode_path_segment(vehicle_id));
        let points = self
            .get_all::<LocationHistoryPage>(&path, &date_range(start, end))
            .await?;
        let mut trail: Vec<VehicleLocation> = points
            .into_iter()
            .filter_map(|p| mapping::location_point(vehicle_id, None, p))
            .filter(|l| l.timestamp >= start && l.timestamp <= end)
            .collect();
        trail.sort_by_key(|l| l.timestamp);
        Ok(trail)
    }

    // =========================================================================
    // Hours of Service
    // =========================================================================

    async fn get_hos_clocks(&self, driver_ids: Option<&[String]>) -> EldResult<Vec<HosClock>> {
        let mut query = Vec::new();
        if let Some(ids) = driver_ids {
            query.push(("driver_ids", id_list(ids)));
        }

        let drivers = self
            .get_all::<AvailableTimePage>("/hos_available_time", &query)
            .await?;
        let now = Utc::now();
        Ok(drivers
            .into_iter()
            .filter(|d| wanted(driver_ids, &d.id))
            .map(|d| mapping::hos_clock(d, now))
            .collect())
    }

    async fn get_hos_logs(
        &self,
        driver_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<HosLog>> {
        let mut query = date_range(start, end).to_vec();
        query.push(("driver_ids", driver_id.to_string()));

        let logs = self.get_all::<HosLogsPage>("/hos_logs", &query).await?;
        let mut logs: Vec<HosLog> = logs
            .into_iter()
            .filter_map(mapping::hos_log)
            .filter(|l| l.driver_id == driver_id)
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
        let mut query = date_range(start, end).to_vec();
        if let Some(ids) = driver_ids {
            query.push(("driver_ids", id_list(ids)));
        }

        let violations = self
            .get_all::<HosViolationsPage>("/hos_violations", &query)
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
        let page = self.get_page::<VehiclesPage>("/vehicles", &[], page).await?;
        Ok(page.map(mapping::vehicle))
    }

    async fn get_vehicle(&self, vehicle_id: &str) -> EldResult<Option<Vehicle>> {
        let path = format!("/vehicles/{}", encode_path_segment(vehicle_id));
        let entry: Option<VehicleEntry> = self.get_item(&path).await?;
        Ok(entry.map(|e| mapping::vehicle(e.vehicle)))
    }

    async fn get_vehicle_stats(&self, vehicle_id: &str) -> EldResult<Option<VehicleStats>> {
        let query = [("vehicle_ids", vehicle_id.to_string())];
        let response: VehicleLocationsPage = self.get("/vehicle_locations", &query).await?;
        let (vehicles, _) = response.into_parts();
        Ok(vehicles
            .into_iter()
            .find(|v| v.id == vehicle_id)
            .and_then(mapping::vehicle_stats))
    }

    async fn get_vehicle_stats_history(
        &self,
        vehicle_id: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> EldResult<Vec<VehicleStats>> {
        self.api_key()?;
        debug!(vehicle_id, "Motive has no stats history endpoint");
        Ok(Vec::new())
    }

    async fn get_drivers(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Driver>> {
        let query = [("role", "driver".to_string())];
        let page = self.get_page::<UsersPage>("/users", &query, page).await?;
        Ok(page.map(mapping::driver))
    }

    async fn get_driver(&self, driver_id: &str) -> EldResult<Option<Driver>> {
        let path = format!("/users/{}", encode_path_segment(driver_id));
        let entry: Option<UserEntry> = self.get_item(&path).await?;
        Ok(entry.map(|e| mapping::driver(e.user)))
    }

    async fn get_trailers(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Trailer>> {
        let page = self.get_page::<AssetsPage>("/assets", &[], page).await?;
        Ok(page.map(mapping::trailer))
    }

    async fn get_trailer(&self, trailer_id: &str) -> EldResult<Option<Trailer>> {
        let path = format!("/assets/{}", encode_path_segment(trailer_id));
        let entry: Option<AssetEntry> = self.get_item(&path).await?;
        Ok(entry.map(|e| mapping::trailer(e.asset)))
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    async fn get_fault_codes(
        &self,
        vehicle_ids: Option<&[String]>,
        active_only: bool,
    ) -> EldResult<Vec<FaultCode>> {
        let mut query = Vec::new();
        if let Some(ids) = vehicle_ids {
            query.push(("vehicle_ids", id_list(ids)));
        }
        if active_only {
            query.push(("status", "open".to_string()));
        }

        let faults = self.get_all::<FaultCodesPage>("/fault_codes", &query).await?;
        Ok(faults
            .into_iter()
            .filter_map(mapping::fault_code)
            .filter(|f| wanted(vehicle_ids, &f.vehicle_id))
            .filter(|f| !active_only || f.is_active())
            .collect())
    }

    async fn get_maintenance_alerts(
        &self,
        _vehicle_ids: Option<&[String]>,
    ) -> EldResult<Vec<MaintenanceAlert>> {
        self.api_key()?;
        debug!("Motive has no maintenance alerts endpoint");
        Ok(Vec::new())
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
        let mut query = date_range(start, end).to_vec();
        if let Some(ids) = vehicle_ids {
            query.push(("vehicle_ids", id_list(ids)));
        }

        let reports = self
            .get_all::<InspectionsPage>("/inspection_reports", &query)
            .await?;
        Ok(reports
            .into_iter()
            .filter_map(mapping::dvir)
            .filter(|d| wanted(vehicle_ids, &d.vehicle_id))
            .collect())
    }

    async fn get_dvir(&self, dvir_id: &str) -> EldResult<Option<Dvir>> {
        let path = format!("/inspection_reports/{}", encode_path_segment(dvir_id));
        let entry: Option<InspectionEntry> = self.get_item(&path).await?;
        Ok(entry.and_then(|e| mapping::dvir(e.inspection_report)))
    }

    // =========================================================================
    // Fuel Tax
    // =========================================================================

    async fn get_ifta_summary(
        &self,
        quarter: IftaQuarter,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<IftaSummary> {
        // end_date is inclusive on Motive's side
        let last_day = quarter.end() - Duration::days(1);
        let mut query = date_range(quarter.start(), last_day).to_vec();
        if let Some(ids) = vehicle_ids {
            query.push(("vehicle_ids", id_list(ids)));
        }

        let response: IftaSummaryResponse = self.get("/ifta/summary", &query).await?;
        Ok(mapping::ifta_summary(&quarter, response.ifta_summary))
    }

    // =========================================================================
    // Geofencing
    // =========================================================================

    async fn get_geofences(&self) -> EldResult<Vec<Geofence>> {
        self.api_key()?;
        debug!("Motive integration does not expose geofences");
        Ok(Vec::new())
    }

    async fn get_geofence_events(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _geofence_id: Option<&str>,
    ) -> EldResult<Vec<GeofenceEvent>> {
        self.api_key()?;
        debug!("Motive integration does not expose geofence events");
        Ok(Vec::new())
    }

    // =========================================================================
    // Webhooks
    // =========================================================================

    async fn subscribe_to_events(
        &self,
        event_types: &[EldEventType],
        callback_url: &str,
    ) -> EldResult<String> {
        let mut actions: Vec<&'static str> = event_types
            .iter()
            .filter_map(|t| mapping::webhook_action(*t))
            .collect();
        actions.sort_unstable();
        actions.dedup();
        if actions.is_empty() {
            return Err(EldError::InvalidRequest(
                "no Motive webhook actions requested".to_string(),
            ));
        }

        let body = CreateWebhook {
            url: callback_url,
            format: "json",
            actions,
            enabled: true,
        };
        let api_key = self.api_key()?;
        let created: CompanyWebhookEntry = self
            .client
            .post_json("/company_webhooks", &body, Self::key_auth(&api_key))
            .await
            .map_err(Self::map_err)?;

        let id = created.company_webhook.id;
        info!(subscription_id = %id, "Motive webhook created");
        Ok(id)
    }

    async fn unsubscribe_from_events(&self, subscription_id: &str) -> EldResult<()> {
        let api_key = self.api_key()?;
        let path = format!("/company_webhooks/{}", encode_path_segment(subscription_id));
        self.client
            .delete(&path, Self::key_auth(&api_key))
            .await
            .map_err(Self::map_err)?;

        info!(subscription_id, "Motive webhook removed");
        Ok(())
    }

    fn parse_webhook_payload(&self, payload: &serde_json::Value) -> Vec<EldEvent> {
        mapping::webhook_event(payload).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MotiveProvider {
        MotiveProvider::new(MotiveConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_unauthenticated_provider() {
        let provider = provider();
        assert!(provider.auth_token().is_none());
        assert!(provider.is_token_expired());
        assert!(!provider.test_connection().await);
        assert!(matches!(
            provider.refresh_token().await,
            Err(EldError::MissingSession(EldVendor::Motive))
        ));
    }

    #[tokio::test]
    async fn test_gaps_still_require_a_session() {
        let provider = provider();
        assert!(matches!(
            provider.get_geofences().await,
            Err(EldError::MissingSession(EldVendor::Motive))
        ));
        assert!(matches!(
            provider.get_maintenance_alerts(None).await,
            Err(EldError::MissingSession(EldVendor::Motive))
        ));
    }

    #[tokio::test]
    async fn test_wrong_credentials_kind() {
        let err = provider()
            .authenticate(&Credentials::Samsara {
                api_key: "k".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EldError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_empty_key_rejected_without_request() {
        let err = provider()
            .authenticate(&Credentials::Motive {
                api_key: "   ".into(),
            })
            .await
            .unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn test_webhook_yields_one_event() {
        let events = provider().parse_webhook_payload(&serde_json::json!({
            "action": "fault_code_opened",
            "id": 1,
            "vehicle": {"id": 1001}
        }));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EldEventType::FaultCode);
        assert_eq!(events[0].vehicle_id.as_deref(), Some("1001"));
    }
}
