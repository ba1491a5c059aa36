//! Time utilities

/// Number of nanoseconds in one second.
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a chrono duration into seconds, returning `None` if it cannot be represented in
/// nanoseconds.
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|n| n as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a period in seconds into a non-zero `std::time::Duration`.
///
/// Returns `None` for negative, non-finite or unrepresentably large values, and for values which
/// round to zero nanoseconds.
pub fn seconds_to_period(seconds: f64) -> Option<std::time::Duration> {
    std::time::Duration::try_from_secs_f64(seconds)
        .ok()
        .filter(|d| !d.is_zero())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
        assert_eq!(duration_to_seconds(chrono::Duration::zero()), Some(0.0));
        assert_eq!(duration_to_seconds(chrono::Duration::max_value()), None);
    }

    #[test]
    fn test_seconds_to_period() {
        assert_eq!(
            seconds_to_period(0.05),
            Some(std::time::Duration::from_millis(50))
        );

        assert_eq!(seconds_to_period(0.0), None);
        assert_eq!(seconds_to_period(1e-12), None);
        assert_eq!(seconds_to_period(-0.5), None);
        assert_eq!(seconds_to_period(std::f64::NAN), None);
        assert_eq!(seconds_to_period(std::f64::INFINITY), None);
        assert_eq!(seconds_to_period(1e20), None);
    }
}
