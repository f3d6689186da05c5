use crate::constants::{MINUTES_PER_DEGREE, SECONDS_PER_DAY};

pub fn days_to_seconds(days: f64) -> f64 {
    days * SECONDS_PER_DAY
}

pub fn seconds_to_days(seconds: f64) -> f64 {
    seconds / SECONDS_PER_DAY
}

pub fn minutes_to_degrees(minutes: f64) -> f64 {
    minutes / MINUTES_PER_DEGREE
}

/// Degrees and minutes of arc as decimal degrees
pub fn decimal_degrees(degrees: f64, minutes: f64) -> f64 {
    degrees + minutes_to_degrees(minutes)
}

#[cfg(test)]
pub(crate) fn assert_approx_eq_slice(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (i, e) in a.iter().enumerate() {
        approx::assert_abs_diff_eq!(*e, b[i], epsilon = 1.0E-12);
    }
}
