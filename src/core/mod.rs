pub mod compliance;
pub mod error;
pub mod forgot_timeout;
pub mod geofence;
pub mod hours;
pub mod recorder;
pub mod schedule;

/// Earned hours are stored with two decimal places.
pub(crate) fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}
