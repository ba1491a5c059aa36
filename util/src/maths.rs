//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Clamp a value into the range `[min, max]`.
///
/// Returns the clamped value and a flag which is `true` if the value had to be limited.
pub fn clamp<T>(value: T, min: T, max: T) -> (T, bool)
where
    T: Float
{
    if value > max {
        (max, true)
    }
    else if value < min {
        (min, true)
    }
    else {
        (value, false)
    }
}

/// Clamp a value into the symmetric range `[-limit, +limit]`.
///
/// `limit` is expected to be non-negative.
pub fn clamp_sym<T>(value: T, limit: T) -> (T, bool)
where
    T: Float
{
    clamp(value, -limit, limit)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(0.5f64, -1.0, 1.0), (0.5, false));
        assert_eq!(clamp(1.5f64, -1.0, 1.0), (1.0, true));
        assert_eq!(clamp(-1.5f64, -1.0, 1.0), (-1.0, true));

        // Bounds themselves are not considered limited
        assert_eq!(clamp(1.0f64, -1.0, 1.0), (1.0, false));
    }

    #[test]
    fn test_clamp_sym_idempotent() {
        for v in &[-12.0f64, -0.86, -0.85, 0.0, 0.3, 0.85, 1.2, 40.0] {
            let (once, _) = clamp_sym(*v, 0.85);
            let (twice, limited) = clamp_sym(once, 0.85);

            assert_eq!(once, twice);
            assert!(!limited);
            assert!(once.abs() <= 0.85);
        }
    }
}
