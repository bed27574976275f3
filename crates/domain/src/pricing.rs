//! Delivery distance, tiered delivery cost and service-hours gating.

use chrono::NaiveTime;
use common::Money;
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the great-circle distance.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle (haversine) distance between two coordinates, in km.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// A computed delivery offer for one location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub distance_km: f64,
    pub fee: Money,
}

/// Operator-configured delivery fee schedule.
///
/// The base fee covers the first kilometer; every *started* kilometer
/// beyond that adds one per-block fee. Locations beyond the radius are not
/// served at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingConfig {
    pub base_fee: Money,
    pub per_km_fee: Money,
    pub max_radius_km: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fee: Money::new(5_000),
            per_km_fee: Money::new(5_000),
            max_radius_km: 10.0,
        }
    }
}

impl PricingConfig {
    /// Quotes the delivery fee for a distance.
    ///
    /// Returns `None` beyond the service radius — a hard cutoff, there is
    /// no partial service past it.
    pub fn quote(&self, distance_km: f64) -> Option<DeliveryQuote> {
        if distance_km > self.max_radius_km {
            return None;
        }

        let fee = if distance_km <= 1.0 {
            self.base_fee
        } else {
            let extra_blocks = (distance_km - 1.0).ceil() as u32;
            self.base_fee + self.per_km_fee.multiply(extra_blocks)
        };

        Some(DeliveryQuote { distance_km, fee })
    }
}

/// Daily open/close window gating order placement.
///
/// Wall-clock times only, no dates. A window with `start > end` spans
/// midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ServiceWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Returns true when `now` falls inside the window (inclusive at both
    /// ends).
    pub fn is_open(&self, now: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= now && now <= self.end
        } else {
            now >= self.start || now <= self.end
        }
    }
}

impl Default for ServiceWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            end: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default(),
        }
    }
}
