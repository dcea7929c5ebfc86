//! EldConnectionManager - single-active-vendor facade over the adapters

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use eld_core::{
    provider_catalog, AuthToken, Credentials, Driver, Dvir, EldError, EldEvent, EldEventType,
    EldProvider, EldResult, EldVendor, FaultCode, Geofence, GeofenceEvent, HosClock, HosLog,
    HosViolation, IftaQuarter, IftaSummary, MaintenanceAlert, PageRequest, PaginatedResponse,
    ProviderFeature, ProviderInfo, Trailer, Vehicle, VehicleLocation, VehicleStats,
};
use eld_geotab::GeotabProvider;
use eld_motive::MotiveProvider;
use eld_samsara::SamsaraProvider;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::EldConfig;

/// Facade over the registered ELD adapters.
///
/// At most one vendor is active. Reads go to the active adapter and fail
/// with [`EldError::NotConnected`] when there is none. `connect` and
/// `disconnect` are serialized so a switch between vendors never leaves
/// two live sessions behind.
pub struct EldConnectionManager {
    /// Registered adapters by vendor
    providers: HashMap<EldVendor, Arc<dyn EldProvider>>,
    /// Vendor whose adapter currently holds a session
    active: RwLock<Option<EldVendor>>,
    /// Serializes connect/disconnect
    transition: Mutex<()>,
}

impl Default for EldConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EldConnectionManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            active: RwLock::new(None),
            transition: Mutex::new(()),
        }
    }

    /// Create a manager with the given adapters registered
    pub fn with_providers(providers: impl IntoIterator<Item = Arc<dyn EldProvider>>) -> Self {
        let mut manager = Self::new();
        for provider in providers {
            manager.register_provider(provider);
        }
        manager
    }

    /// Create a manager with an adapter for every supported vendor
    pub fn from_config(config: &EldConfig) -> EldResult<Self> {
        let providers: Vec<Arc<dyn EldProvider>> = vec![
            Arc::new(SamsaraProvider::new(config.samsara.clone())?),
            Arc::new(GeotabProvider::new(config.geotab.clone())?),
            Arc::new(MotiveProvider::new(config.motive.clone())?),
        ];
        Ok(Self::with_providers(providers))
    }

    /// Register an adapter, replacing any previous one for the same vendor
    pub fn register_provider(&mut self, provider: Arc<dyn EldProvider>) {
        let vendor = provider.vendor();
        info!(vendor = %vendor, "Registering ELD provider");
        self.providers.insert(vendor, provider);
    }

    /// Vendors with a registered adapter, in catalog order
    pub fn registered_vendors(&self) -> Vec<EldVendor> {
        let mut vendors: Vec<EldVendor> = self.providers.keys().copied().collect();
        vendors.sort();
        vendors
    }

    /// Registered adapter for `vendor`
    pub fn provider(&self, vendor: EldVendor) -> Option<Arc<dyn EldProvider>> {
        self.providers.get(&vendor).cloned()
    }

    /// Static descriptors of every known provider
    pub fn catalog(&self) -> &'static [ProviderInfo] {
        provider_catalog()
    }

    fn registered(&self, vendor: EldVendor) -> EldResult<Arc<dyn EldProvider>> {
        self.provider(vendor).ok_or_else(|| {
            EldError::Configuration(format!("no provider registered for {}", vendor))
        })
    }

    fn active_provider(&self) -> EldResult<Arc<dyn EldProvider>> {
        let vendor = (*self.active.read()).ok_or(EldError::NotConnected)?;
        self.provider(vendor).ok_or(EldError::NotConnected)
    }

    // =========================================================================
    // Connection state
    // =========================================================================

    /// Authenticate with `vendor` and make it the active connection.
    ///
    /// On failure the previous connection, if any, stays active. On
    /// success a different previously active vendor has its session
    /// revoked.
    pub async fn connect(
        &self,
        vendor: EldVendor,
        credentials: &Credentials,
    ) -> EldResult<AuthToken> {
        if credentials.vendor() != vendor {
            return Err(EldError::Configuration(format!(
                "{} credentials cannot connect to {}",
                credentials.vendor(),
                vendor
            )));
        }
        let provider = self.registered(vendor)?;

        let _guard = self.transition.lock().await;
        let token = provider.authenticate(credentials).await?;

        let previous = self.active.write().replace(vendor);
        if let Some(previous) = previous.filter(|p| *p != vendor) {
            if let Some(old) = self.provider(previous) {
                if let Err(e) = old.revoke_access().await {
                    warn!(vendor = %previous, error = %e, "Failed to revoke replaced session");
                }
            }
            info!(from = %previous, to = %vendor, "Switched ELD connection");
        } else {
            info!(vendor = %vendor, expires_at = %token.expires_at, "Connected to ELD provider");
        }
        Ok(token)
    }

    /// Drop the active connection. Does nothing when disconnected.
    pub async fn disconnect(&self) -> EldResult<()> {
        let _guard = self.transition.lock().await;
        let Some(vendor) = self.active.write().take() else {
            debug!("Disconnect requested with no active ELD connection");
            return Ok(());
        };

        if let Some(provider) = self.provider(vendor) {
            if let Err(e) = provider.revoke_access().await {
                warn!(vendor = %vendor, error = %e, "Failed to revoke session on disconnect");
            }
        }
        info!(vendor = %vendor, "Disconnected from ELD provider");
        Ok(())
    }

    /// Probe `vendor`, or the active vendor when `None`
    pub async fn test_connection(&self, vendor: Option<EldVendor>) -> EldResult<bool> {
        let vendor = vendor.or_else(|| self.active_vendor()).ok_or_else(|| {
            EldError::Configuration("no vendor given and no active connection".to_string())
        })?;
        let provider = self.registered(vendor)?;
        Ok(provider.test_connection().await)
    }

    pub fn active_vendor(&self) -> Option<EldVendor> {
        *self.active.read()
    }

    pub fn is_connected(&self) -> bool {
        self.active.read().is_some()
    }

    /// Token of the active session
    pub fn auth_token(&self) -> EldResult<Option<AuthToken>> {
        Ok(self.active_provider()?.auth_token())
    }

    /// Whether the active vendor declares `feature`
    pub fn supports(&self, feature: ProviderFeature) -> EldResult<bool> {
        Ok(self.active_provider()?.supports(feature))
    }

    /// Catalog entry of the active vendor
    pub fn active_provider_info(&self) -> EldResult<&'static ProviderInfo> {
        Ok(self.active_provider()?.provider_info())
    }

    // =========================================================================
    // Location
    // =========================================================================

    pub async fn get_vehicle_locations(
        &self,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<Vec<VehicleLocation>> {
        self.active_provider()?
            .get_vehicle_locations(vehicle_ids)
            .await
    }

    pub async fn get_vehicle_location(
        &self,
        vehicle_id: &str,
    ) -> EldResult<Option<VehicleLocation>> {
        self.active_provider()?.get_vehicle_location(vehicle_id).await
    }

    pub async fn get_location_history(
        &self,
        vehicle_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<VehicleLocation>> {
        self.active_provider()?
            .get_location_history(vehicle_id, start, end)
            .await
    }

    // =========================================================================
    // Hours of Service
    // =========================================================================

    pub async fn get_hos_clocks(&self, driver_ids: Option<&[String]>) -> EldResult<Vec<HosClock>> {
        self.active_provider()?.get_hos_clocks(driver_ids).await
    }

    pub async fn get_hos_clock(&self, driver_id: &str) -> EldResult<Option<HosClock>> {
        self.active_provider()?.get_hos_clock(driver_id).await
    }

    pub async fn get_hos_logs(
        &self,
        driver_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<HosLog>> {
        self.active_provider()?
            .get_hos_logs(driver_id, start, end)
            .await
    }

    pub async fn get_hos_violations(
        &self,
        driver_ids: Option<&[String]>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<HosViolation>> {
        self.active_provider()?
            .get_hos_violations(driver_ids, start, end)
            .await
    }

    // =========================================================================
    // Vehicles, Drivers, Trailers
    // =========================================================================

    pub async fn get_vehicles(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Vehicle>> {
        self.active_provider()?.get_vehicles(page).await
    }

    pub async fn get_vehicle(&self, vehicle_id: &str) -> EldResult<Option<Vehicle>> {
        self.active_provider()?.get_vehicle(vehicle_id).await
    }

    pub async fn get_vehicle_stats(&self, vehicle_id: &str) -> EldResult<Option<VehicleStats>> {
        self.active_provider()?.get_vehicle_stats(vehicle_id).await
    }

    pub async fn get_vehicle_stats_history(
        &self,
        vehicle_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<VehicleStats>> {
        self.active_provider()?
            .get_vehicle_stats_history(vehicle_id, start, end)
            .await
    }

    pub async fn get_drivers(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Driver>> {
        self.active_provider()?.get_drivers(page).await
    }

    pub async fn get_driver(&self, driver_id: &str) -> EldResult<Option<Driver>> {
        self.active_provider()?.get_driver(driver_id).await
    }

    pub async fn get_trailers(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Trailer>> {
        self.active_provider()?.get_trailers(page).await
    }

    pub async fn get_trailer(&self, trailer_id: &str) -> EldResult<Option<Trailer>> {
        self.active_provider()?.get_trailer(trailer_id).await
    }

    // =========================================================================
    // Diagnostics & Inspections
    // =========================================================================

    pub async fn get_fault_codes(
        &self,
        vehicle_ids: Option<&[String]>,
        active_only: bool,
    ) -> EldResult<Vec<FaultCode>> {
        self.active_provider()?
            .get_fault_codes(vehicle_ids, active_only)
            .await
    }

    pub async fn get_maintenance_alerts(
        &self,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<Vec<MaintenanceAlert>> {
        self.active_provider()?
            .get_maintenance_alerts(vehicle_ids)
            .await
    }

    pub async fn get_dvirs(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<Vec<Dvir>> {
        self.active_provider()?
            .get_dvirs(start, end, vehicle_ids)
            .await
    }

    pub async fn get_dvir(&self, dvir_id: &str) -> EldResult<Option<Dvir>> {
        self.active_provider()?.get_dvir(dvir_id).await
    }

    // =========================================================================
    // Fuel Tax & Geofencing
    // =========================================================================

    pub async fn get_ifta_summary(
        &self,
        quarter: IftaQuarter,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<IftaSummary> {
        self.active_provider()?
            .get_ifta_summary(quarter, vehicle_ids)
            .await
    }

    pub async fn get_geofences(&self) -> EldResult<Vec<Geofence>> {
        self.active_provider()?.get_geofences().await
    }

    pub async fn get_geofence_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        geofence_id: Option<&str>,
    ) -> EldResult<Vec<GeofenceEvent>> {
        self.active_provider()?
            .get_geofence_events(start, end, geofence_id)
            .await
    }

    // =========================================================================
    // Webhooks
    // =========================================================================

    pub async fn subscribe_to_events(
        &self,
        event_types: &[EldEventType],
        callback_url: &str,
    ) -> EldResult<String> {
        self.active_provider()?
            .subscribe_to_events(event_types, callback_url)
            .await
    }

    pub async fn unsubscribe_from_events(&self, subscription_id: &str) -> EldResult<()> {
        self.active_provider()?
            .unsubscribe_from_events(subscription_id)
            .await
    }

    /// Parse a webhook body delivered by `vendor`; needs no connection
    pub fn parse_webhook_payload(
        &self,
        vendor: EldVendor,
        payload: &serde_json::Value,
    ) -> EldResult<Vec<EldEvent>> {
        Ok(self.registered(vendor)?.parse_webhook_payload(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> EldConnectionManager {
        EldConnectionManager::from_config(&EldConfig::default()).unwrap()
    }

    #[test]
    fn test_registry_covers_every_vendor() {
        let manager = manager();
        assert_eq!(manager.registered_vendors(), EldVendor::ALL.to_vec());
        assert_eq!(manager.catalog().len(), 3);
        assert!(!manager.is_connected());
        assert_eq!(manager.active_vendor(), None);
    }

    #[tokio::test]
    async fn test_reads_require_connection() {
        let manager = manager();
        assert!(matches!(
            manager.get_vehicles(&PageRequest::default()).await,
            Err(EldError::NotConnected)
        ));
        assert!(matches!(
            manager.supports(ProviderFeature::Geofencing),
            Err(EldError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_mismatched_credentials() {
        let manager = manager();
        let err = manager
            .connect(
                EldVendor::Geotab,
                &Credentials::Motive {
                    api_key: "k".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EldError::Configuration(_)));
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_unregistered_vendor() {
        let manager = EldConnectionManager::new();
        let err = manager
            .connect(
                EldVendor::Samsara,
                &Credentials::Samsara {
                    api_key: "k".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EldError::Configuration(_)));
        assert!(matches!(
            manager.parse_webhook_payload(EldVendor::Samsara, &serde_json::json!({})),
            Err(EldError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_disconnect_twice() {
        let manager = manager();
        manager.disconnect().await.unwrap();
        manager.disconnect().await.unwrap();
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_test_connection_needs_a_vendor() {
        let manager = manager();
        assert!(matches!(
            manager.test_connection(None).await,
            Err(EldError::Configuration(_))
        ));
        assert!(!manager.test_connection(Some(EldVendor::Motive)).await.unwrap());
    }

    #[test]
    fn test_webhook_parsing_without_connection() {
        let manager = manager();
        let events = manager
            .parse_webhook_payload(
                EldVendor::Samsara,
                &serde_json::json!({
                    "eventId": "evt-1",
                    "eventTime": "2024-05-01T12:00:00Z",
                    "eventType": "GeofenceEntry",
                    "data": {}
                }),
            )
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EldEventType::GeofenceEntry);
    }
}
