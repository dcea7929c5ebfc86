//! EldProvider trait - the capability contract every vendor adapter implements

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::base;
use crate::catalog::{self, ProviderFeature, ProviderInfo};
use crate::error::EldResult;
use crate::models::{
    AuthToken, Credentials, Driver, Dvir, EldEvent, EldEventType, EldVendor, FaultCode, Geofence,
    GeofenceEvent, HosClock, HosLog, HosViolation, IftaQuarter, IftaSummary, MaintenanceAlert,
    PageRequest, PaginatedResponse, Trailer, Vehicle, VehicleLocation, VehicleStats,
};

/// The core trait that all ELD vendor adapters implement.
///
/// Adapters own their session state (API key, RPC session id) behind
/// interior mutability, so every method takes `&self` and one adapter can
/// serve concurrent calls once authenticated.
///
/// Conventions:
/// - Single-entity lookups return `Ok(None)` when the entity does not
///   exist; absence is never an error.
/// - Range operations forward `start`/`end` to the vendor unchanged.
/// - Operations a vendor cannot serve return an empty result; check
///   [`EldProvider::supports`] to tell "unsupported" from "no data".
#[async_trait]
pub trait EldProvider: Send + Sync {
    // =========================================================================
    // Identity & Session
    // =========================================================================

    /// Vendor served by this adapter
    fn vendor(&self) -> EldVendor;

    /// Catalog descriptor for this vendor
    fn provider_info(&self) -> &'static ProviderInfo {
        catalog::provider_info(self.vendor())
    }

    /// Whether this vendor declares `feature`
    fn supports(&self, feature: ProviderFeature) -> bool {
        self.provider_info().supports(feature)
    }

    /// Token of the current session, if authenticated
    fn auth_token(&self) -> Option<AuthToken>;

    /// Whether the current token is missing or within the expiry buffer
    fn is_token_expired(&self) -> bool {
        base::is_token_expired_at(self.auth_token().as_ref(), Utc::now())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange credentials for a session.
    ///
    /// Fails with `EldError::Authentication` when the vendor rejects the
    /// credentials. The previous session, if any, is kept on failure.
    async fn authenticate(&self, credentials: &Credentials) -> EldResult<AuthToken>;

    /// Renew the current session
    async fn refresh_token(&self) -> EldResult<AuthToken>;

    /// Probe the vendor with the current session. Never fails.
    async fn test_connection(&self) -> bool;

    /// Drop the current session
    async fn revoke_access(&self) -> EldResult<()>;

    // =========================================================================
    // Location
    // =========================================================================

    /// Latest location of every vehicle (or the listed ones)
    async fn get_vehicle_locations(
        &self,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<Vec<VehicleLocation>>;

    /// Latest location of one vehicle
    async fn get_vehicle_location(&self, vehicle_id: &str) -> EldResult<Option<VehicleLocation>> {
        let ids = [vehicle_id.to_string()];
        let locations = self.get_vehicle_locations(Some(&ids[..])).await?;
        Ok(locations.into_iter().find(|l| l.vehicle_id == vehicle_id))
    }

    /// Breadcrumb trail of one vehicle between `start` and `end`
    async fn get_location_history(
        &self,
        vehicle_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<VehicleLocation>>;

    // =========================================================================
    // Hours of Service
    // =========================================================================

    /// Current HOS clocks of every driver (or the listed ones)
    async fn get_hos_clocks(&self, driver_ids: Option<&[String]>) -> EldResult<Vec<HosClock>>;

    /// Current HOS clock of one driver
    async fn get_hos_clock(&self, driver_id: &str) -> EldResult<Option<HosClock>> {
        let ids = [driver_id.to_string()];
        let clocks = self.get_hos_clocks(Some(&ids[..])).await?;
        Ok(clocks.into_iter().find(|c| c.driver_id == driver_id))
    }

    /// Duty-status intervals of one driver between `start` and `end`
    async fn get_hos_logs(
        &self,
        driver_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<HosLog>>;

    /// Violations recorded between `start` and `end`
    async fn get_hos_violations(
        &self,
        driver_ids: Option<&[String]>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<HosViolation>>;

    // =========================================================================
    // Vehicles, Drivers, Trailers
    // =========================================================================

    /// One page of vehicles
    async fn get_vehicles(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Vehicle>>;

    /// One vehicle by id
    async fn get_vehicle(&self, vehicle_id: &str) -> EldResult<Option<Vehicle>>;

    /// Latest engine/odometer statistics of one vehicle
    async fn get_vehicle_stats(&self, vehicle_id: &str) -> EldResult<Option<VehicleStats>>;

    /// Statistics samples of one vehicle between `start` and `end`
    async fn get_vehicle_stats_history(
        &self,
        vehicle_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EldResult<Vec<VehicleStats>>;

    /// One page of drivers
    async fn get_drivers(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Driver>>;

    /// One driver by id
    async fn get_driver(&self, driver_id: &str) -> EldResult<Option<Driver>>;

    /// One page of trailers
    async fn get_trailers(&self, page: &PageRequest) -> EldResult<PaginatedResponse<Trailer>>;

    /// One trailer by id
    async fn get_trailer(&self, trailer_id: &str) -> EldResult<Option<Trailer>>;

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Fault codes for every vehicle (or the listed ones)
    async fn get_fault_codes(
        &self,
        vehicle_ids: Option<&[String]>,
        active_only: bool,
    ) -> EldResult<Vec<FaultCode>>;

    /// Open maintenance items
    async fn get_maintenance_alerts(
        &self,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<Vec<MaintenanceAlert>>;

    // =========================================================================
    // Inspections
    // =========================================================================

    /// DVIRs submitted between `start` and `end`
    async fn get_dvirs(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<Vec<Dvir>>;

    /// One DVIR by id
    async fn get_dvir(&self, dvir_id: &str) -> EldResult<Option<Dvir>>;

    // =========================================================================
    // Fuel Tax
    // =========================================================================

    /// Per-jurisdiction distance and fuel for one quarter
    async fn get_ifta_summary(
        &self,
        quarter: IftaQuarter,
        vehicle_ids: Option<&[String]>,
    ) -> EldResult<IftaSummary>;

    // =========================================================================
    // Geofencing
    // =========================================================================

    /// All geofences
    async fn get_geofences(&self) -> EldResult<Vec<Geofence>>;

    /// Enter/exit events between `start` and `end`
    async fn get_geofence_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        geofence_id: Option<&str>,
    ) -> EldResult<Vec<GeofenceEvent>>;

    // =========================================================================
    // Webhooks
    // =========================================================================

    /// Register `callback_url` for `event_types`; returns the subscription id
    async fn subscribe_to_events(
        &self,
        event_types: &[EldEventType],
        callback_url: &str,
    ) -> EldResult<String>;

    /// Remove a subscription created by [`EldProvider::subscribe_to_events`]
    async fn unsubscribe_from_events(&self, subscription_id: &str) -> EldResult<()>;

    /// Translate a vendor webhook body into canonical events.
    ///
    /// Pure: performs no I/O. Assumes the payload follows the vendor's
    /// documented webhook schema; fields that are missing are skipped.
    fn parse_webhook_payload(&self, payload: &serde_json::Value) -> Vec<EldEvent>;
}
