//! Unit normalization
//!
//! The domain model is imperial: miles, miles per hour, US gallons.
//! Distances and speeds round to whole units, volumes to two decimals.

const MILES_PER_KM: f64 = 0.621371;
const MPH_PER_MPS: f64 = 2.236936;
const GALLONS_PER_LITER: f64 = 0.264172;

/// Round to the nearest whole unit
pub fn round_whole(value: f64) -> f64 {
    value.round()
}

/// Round to two decimal places
pub fn round_2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Kilometers to whole miles
pub fn km_to_miles(km: f64) -> f64 {
    round_whole(km * MILES_PER_KM)
}

/// Meters to whole miles
pub fn meters_to_miles(meters: f64) -> f64 {
    km_to_miles(meters / 1000.0)
}

/// Kilometers per hour to whole miles per hour
pub fn kph_to_mph(kph: f64) -> f64 {
    round_whole(kph * MILES_PER_KM)
}

/// Meters per second to whole miles per hour
pub fn mps_to_mph(mps: f64) -> f64 {
    round_whole(mps * MPH_PER_MPS)
}

/// Liters to US gallons, two decimals
pub fn liters_to_gallons(liters: f64) -> f64 {
    round_2(liters * GALLONS_PER_LITER)
}

/// Normalize a compass bearing to an integer in 0..=359
pub fn normalize_heading(degrees: f64) -> u16 {
    if !degrees.is_finite() {
        return 0;
    }
    (degrees.round() as i64).rem_euclid(360) as u16
}
