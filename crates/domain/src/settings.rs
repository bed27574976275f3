//! Restaurant-level configuration loaded from environment variables.

use chrono::NaiveTime;
use common::Money;
use store::GeoPoint;

use crate::pricing::{PricingConfig, ServiceWindow};

/// Operator configuration for pricing, gating and the venue location.
///
/// Reads from environment variables, falling back to the defaults in
/// parentheses:
/// - `VENUE_LAT` / `VENUE_LON` — restaurant coordinates
/// - `DELIVERY_BASE_FEE` (5000) — fee covering the first kilometer
/// - `DELIVERY_PER_KM_FEE` (5000) — fee per started kilometer beyond 1 km
/// - `DELIVERY_MAX_RADIUS_KM` (10.0) — hard service-radius cutoff
/// - `MIN_ORDER_TOTAL` (15000) — products-subtotal floor at checkout
/// - `SERVICE_OPEN` / `SERVICE_CLOSE` (`09:00` / `22:00`) — daily window
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub venue_location: GeoPoint,
    pub pricing: PricingConfig,
    pub window: ServiceWindow,
    pub minimum_order: Money,
}

impl Settings {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            venue_location: GeoPoint {
                latitude: env_parse("VENUE_LAT").unwrap_or(defaults.venue_location.latitude),
                longitude: env_parse("VENUE_LON").unwrap_or(defaults.venue_location.longitude),
            },
            pricing: PricingConfig {
                base_fee: env_parse("DELIVERY_BASE_FEE")
                    .map(Money::new)
                    .unwrap_or(defaults.pricing.base_fee),
                per_km_fee: env_parse("DELIVERY_PER_KM_FEE")
                    .map(Money::new)
                    .unwrap_or(defaults.pricing.per_km_fee),
                max_radius_km: env_parse("DELIVERY_MAX_RADIUS_KM")
                    .unwrap_or(defaults.pricing.max_radius_km),
            },
            window: ServiceWindow {
                start: env_time("SERVICE_OPEN").unwrap_or(defaults.window.start),
                end: env_time("SERVICE_CLOSE").unwrap_or(defaults.window.end),
            },
            minimum_order: env_parse("MIN_ORDER_TOTAL")
                .map(Money::new)
                .unwrap_or(defaults.minimum_order),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            venue_location: GeoPoint {
                latitude: 40.665236,
                longitude: 72.563908,
            },
            pricing: PricingConfig::default(),
            window: ServiceWindow::default(),
            minimum_order: Money::new(15_000),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_time(key: &str) -> Option<NaiveTime> {
    std::env::var(key)
        .ok()
        .and_then(|v| NaiveTime::parse_from_str(&v, "%H:%M").ok())
}
