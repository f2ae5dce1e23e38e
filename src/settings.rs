//! Per-operation settings, resolved from `setting` rows over deployment config over constants.

use std::{collections::HashMap, str::FromStr};

use chrono::NaiveTime;
use serde::Serialize;
use tracing::warn;

use crate::{consts, entity::setting, geofence::{GeoPoint, Geofence}, penalty::RateTable, store::Store};

pub const GEOFENCE_LATITUDE: &str = "geofence.latitude";
pub const GEOFENCE_LONGITUDE: &str = "geofence.longitude";
pub const GEOFENCE_RADIUS: &str = "geofence.radius_m";
pub const LATE_PER_MINUTE: &str = "rates.late_per_minute";
pub const EARLY_LEAVE_PER_MINUTE: &str = "rates.early_leave_per_minute";
pub const OVERTIME_PER_MINUTE: &str = "rates.overtime_per_minute";
pub const GRACE_MINUTES: &str = "attendance.grace_minutes";
pub const DEFAULT_START: &str = "attendance.default_start";
pub const DEFAULT_END: &str = "attendance.default_end";
pub const CHILD_PAYMENT_DEFAULT: &str = "child_payment.default_amount";

/// Deployment-level fallbacks coming from the environment
#[derive(Debug, Clone, Default)]
pub struct Defaults {
    pub reference: Option<GeoPoint>,
    pub radius_m: Option<f64>,
    pub child_payment_default: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub geofence: Option<Geofence>,
    pub rates: RateTable,
    pub grace_minutes: i64,
    pub default_shift: (NaiveTime, NaiveTime),
    pub child_payment_default: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(&[], &Defaults::default())
    }
}

impl Settings {
    pub fn resolve(rows: &[setting::Model], defaults: &Defaults) -> Self {
        let rows = rows.iter()
            .map(|row| (row.key.as_str(), row.value.as_str()))
            .collect::<HashMap<_, _>>();

        let reference = match (parse::<f64>(&rows, GEOFENCE_LATITUDE), parse::<f64>(&rows, GEOFENCE_LONGITUDE)) {
            (Some(latitude), Some(longitude)) => match GeoPoint::new(latitude, longitude) {
                Ok(point) => Some(point),
                Err(err) => {
                    warn!(error = %err, "Ignoring configured geofence reference point");
                    defaults.reference
                }
            },
            _ => defaults.reference,
        };
        let radius_m = parse(&rows, GEOFENCE_RADIUS).or(defaults.radius_m);

        let (default_start, default_end) = consts::default_shift();

        Self {
            geofence: reference.map(|center| Geofence::new(center, radius_m)),
            rates: RateTable {
                late_penalty_per_minute: parse(&rows, LATE_PER_MINUTE).unwrap_or(consts::LATE_PENALTY_PER_MINUTE),
                early_leave_penalty_per_minute: parse(&rows, EARLY_LEAVE_PER_MINUTE).unwrap_or(consts::EARLY_LEAVE_PENALTY_PER_MINUTE),
                overtime_bonus_per_minute: parse(&rows, OVERTIME_PER_MINUTE).unwrap_or(consts::OVERTIME_BONUS_PER_MINUTE),
            },
            grace_minutes: parse(&rows, GRACE_MINUTES).unwrap_or(consts::LATE_GRACE_MINUTES),
            default_shift: (
                parse(&rows, DEFAULT_START).unwrap_or(default_start),
                parse(&rows, DEFAULT_END).unwrap_or(default_end),
            ),
            child_payment_default: parse(&rows, CHILD_PAYMENT_DEFAULT)
                .or(defaults.child_payment_default)
                .unwrap_or(consts::CHILD_PAYMENT_DEFAULT),
        }
    }
}

fn parse<T: FromStr>(rows: &HashMap<&str, &str>, key: &str) -> Option<T> {
    let value = rows.get(key)?;

    match value.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value, "Ignoring unparseable setting");
            None
        }
    }
}

/// Loads settings for one operation, degrading to defaults when the store cannot be read
pub async fn load<S: Store>(store: &S, defaults: &Defaults) -> Settings {
    let rows = match store.settings().await {
        Ok(rows) => rows,
        Err(err) => {
            warn!(error = %err, "Settings unavailable, falling back to defaults");
            Vec::new()
        }
    };

    let settings = Settings::resolve(&rows, defaults);
    if settings.geofence.is_none() {
        warn!("No geofence reference point configured, clock locations are not enforced");
    }

    settings
}

#[cfg(test)]
mod tests {
    use crate::store::memory::MemoryStore;

    use super::*;

    #[test]
    fn test_documented_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.geofence, None);
        assert_eq!(settings.rates, RateTable {
            late_penalty_per_minute: 500,
            early_leave_penalty_per_minute: 500,
            overtime_bonus_per_minute: 750,
        });
        assert_eq!(settings.grace_minutes, 15);
        assert_eq!(settings.child_payment_default, 35_000);
        assert_eq!(settings.default_shift, consts::default_shift());
    }

    #[actix_web::test]
    async fn test_rows_override_config() {
        let store = MemoryStore::new();
        store.put_setting(LATE_PER_MINUTE, "300");
        store.put_setting(GEOFENCE_RADIUS, "250");
        store.put_setting(GRACE_MINUTES, "ten");
        store.put_setting(DEFAULT_START, "08:30:00");

        let defaults = Defaults {
            reference: Some(GeoPoint::new(43.0, 76.0).unwrap()),
            radius_m: Some(150.0),
            child_payment_default: Some(40_000),
        };

        let settings = load(&store, &defaults).await;

        assert_eq!(settings.rates.late_penalty_per_minute, 300);
        assert_eq!(settings.rates.overtime_bonus_per_minute, 750);
        assert_eq!(settings.geofence.unwrap().radius_m, 250.0);
        assert_eq!(settings.grace_minutes, 15);
        assert_eq!(settings.default_shift.0, NaiveTime::from_hms_opt(8, 30, 0).unwrap());
        assert_eq!(settings.child_payment_default, 40_000);
    }

    #[actix_web::test]
    async fn test_unavailable_store_degrades() {
        let store = MemoryStore::new();
        store.put_setting(LATE_PER_MINUTE, "300");
        store.break_settings();

        let settings = load(&store, &Defaults::default()).await;
        assert_eq!(settings, Settings::default());
    }
}
