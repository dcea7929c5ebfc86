//! Static provider catalog
//!
//! Descriptor list consumed by integration-selection screens. Metadata
//! only; the feature tags are also what [`crate::EldProvider::supports`]
//! answers from.

use std::fmt;

use serde::Serialize;

use crate::models::EldVendor;

/// How a vendor authenticates API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// Long-lived API key / bearer token
    ApiKey,
    /// Username/password exchanged for an expiring session
    Session,
    /// OAuth2 authorization-code flow
    OAuth2,
}

/// Feature tags a provider can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFeature {
    Locations,
    LocationHistory,
    HoursOfService,
    Vehicles,
    VehicleStats,
    VehicleStatsHistory,
    Drivers,
    Trailers,
    FaultCodes,
    MaintenanceAlerts,
    Inspections,
    FuelTax,
    Geofencing,
    Webhooks,
}

impl fmt::Display for ProviderFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderFeature::Locations => "locations",
            ProviderFeature::LocationHistory => "location_history",
            ProviderFeature::HoursOfService => "hours_of_service",
            ProviderFeature::Vehicles => "vehicles",
            ProviderFeature::VehicleStats => "vehicle_stats",
            ProviderFeature::VehicleStatsHistory => "vehicle_stats_history",
            ProviderFeature::Drivers => "drivers",
            ProviderFeature::Trailers => "trailers",
            ProviderFeature::FaultCodes => "fault_codes",
            ProviderFeature::MaintenanceAlerts => "maintenance_alerts",
            ProviderFeature::Inspections => "inspections",
            ProviderFeature::FuelTax => "fuel_tax",
            ProviderFeature::Geofencing => "geofencing",
            ProviderFeature::Webhooks => "webhooks",
        };
        f.write_str(s)
    }
}

/// Descriptor of an ELD integration
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub vendor: EldVendor,
    pub name: &'static str,
    pub auth_type: AuthType,
    pub features: &'static [ProviderFeature],
    pub docs_url: &'static str,
    pub sandbox_available: bool,
}

impl ProviderInfo {
    /// Whether the provider declares `feature`
    pub fn supports(&self, feature: ProviderFeature) -> bool {
        self.features.contains(&feature)
    }
}

const FULL_FEATURES: &[ProviderFeature] = &[
    ProviderFeature::Locations,
    ProviderFeature::LocationHistory,
    ProviderFeature::HoursOfService,
    ProviderFeature::Vehicles,
    ProviderFeature::VehicleStats,
    ProviderFeature::VehicleStatsHistory,
    ProviderFeature::Drivers,
    ProviderFeature::Trailers,
    ProviderFeature::FaultCodes,
    ProviderFeature::MaintenanceAlerts,
    ProviderFeature::Inspections,
    ProviderFeature::FuelTax,
    ProviderFeature::Geofencing,
    ProviderFeature::Webhooks,
];

const MOTIVE_FEATURES: &[ProviderFeature] = &[
    ProviderFeature::Locations,
    ProviderFeature::LocationHistory,
    ProviderFeature::HoursOfService,
    ProviderFeature::Vehicles,
    ProviderFeature::VehicleStats,
    ProviderFeature::Drivers,
    ProviderFeature::Trailers,
    ProviderFeature::FaultCodes,
    ProviderFeature::Inspections,
    ProviderFeature::FuelTax,
    ProviderFeature::Webhooks,
];

static CATALOG: [ProviderInfo; 3] = [
    ProviderInfo {
        vendor: EldVendor::Samsara,
        name: "Samsara",
        auth_type: AuthType::ApiKey,
        features: FULL_FEATURES,
        docs_url: "https://developers.samsara.com/docs",
        sandbox_available: true,
    },
    ProviderInfo {
        vendor: EldVendor::Geotab,
        name: "Geotab",
        auth_type: AuthType::Session,
        features: FULL_FEATURES,
        docs_url: "https://developers.geotab.com/myGeotab/apiReference",
        sandbox_available: true,
    },
    ProviderInfo {
        vendor: EldVendor::Motive,
        name: "Motive (KeepTruckin)",
        auth_type: AuthType::OAuth2,
        features: MOTIVE_FEATURES,
        docs_url: "https://developer.gomotive.com/docs",
        sandbox_available: false,
    },
];

/// All known providers
pub fn provider_catalog() -> &'static [ProviderInfo] {
    &CATALOG
}

/// Catalog entry for `vendor`
pub fn provider_info(vendor: EldVendor) -> &'static ProviderInfo {
    match vendor {
        EldVendor::Samsara => &CATALOG[0],
        EldVendor::Geotab => &CATALOG[1],
        EldVendor::Motive => &CATALOG[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_every_vendor() {
        for vendor in EldVendor::ALL {
            assert_eq!(provider_info(vendor).vendor, vendor);
        }
        assert_eq!(provider_catalog().len(), EldVendor::ALL.len());
    }

    #[test]
    fn test_motive_declares_its_gaps() {
        let motive = provider_info(EldVendor::Motive);
        assert!(motive.supports(ProviderFeature::HoursOfService));
        assert!(!motive.supports(ProviderFeature::Geofencing));
        assert!(!motive.supports(ProviderFeature::MaintenanceAlerts));
        assert!(!motive.supports(ProviderFeature::VehicleStatsHistory));
    }

    #[test]
    fn test_full_feature_vendors() {
        for vendor in [EldVendor::Samsara, EldVendor::Geotab] {
            assert!(provider_info(vendor).supports(ProviderFeature::Geofencing));
        }
        assert_eq!(provider_info(EldVendor::Geotab).auth_type, AuthType::Session);
    }
}
