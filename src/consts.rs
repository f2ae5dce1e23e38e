use chrono::NaiveTime;

/// Default scheduled shift as `(start_hour, end_hour)` when a staff member has no shift for the day
pub const WORKING_HOUR: (u32, u32) = (9, 18);

pub const GEOFENCE_RADIUS_METERS: f64 = 100.0;

pub const LATE_PENALTY_PER_MINUTE: i64 = 500;
pub const EARLY_LEAVE_PENALTY_PER_MINUTE: i64 = 500;
pub const OVERTIME_BONUS_PER_MINUTE: i64 = 750;

pub const LATE_GRACE_MINUTES: i64 = 15;

pub const CHILD_PAYMENT_DEFAULT: i64 = 35_000;

pub const MINUTES_PER_DAY: i64 = 24 * 60;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

pub fn default_shift() -> (NaiveTime, NaiveTime) {
    (
        NaiveTime::from_hms_opt(WORKING_HOUR.0, 0, 0).unwrap_or(NaiveTime::MIN),
        NaiveTime::from_hms_opt(WORKING_HOUR.1, 0, 0).unwrap_or(NaiveTime::MIN),
    )
}
