use serde::{Deserialize, Serialize};
use std::fmt;

const BYTES_PER_GIGABYTE: f64 = 1024.0 * 1024.0 * 1024.0;

/// Convert a byte count to gigabytes (GiB), rounded to two decimal places.
pub fn bytes_to_gigabytes(bytes: f64) -> f64 {
    round_two_places(bytes / BYTES_PER_GIGABYTE)
}

/// Round to two decimal places.
pub fn round_two_places(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A duration broken down into whole days, hours and minutes.
///
/// Displays as `1d 1h 1m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uptime {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
}

impl Uptime {
    /// Build from a field value in seconds. Fractional seconds are truncated; negative and
    /// non-finite values have no uptime.
    pub fn from_seconds(seconds: f64) -> Option<Self> {
        if seconds.is_finite() && seconds >= 0.0 {
            Some(seconds_to_duration(seconds as u64))
        } else {
            None
        }
    }
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
    }
}

pub fn seconds_to_duration(seconds: u64) -> Uptime {
    Uptime {
        days: seconds / 86_400,
        hours: (seconds % 86_400) / 3_600,
        minutes: (seconds % 3_600) / 60,
    }
}
