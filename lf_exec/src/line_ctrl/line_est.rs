//! # Line position estimation
//!
//! The line sensor array reports a reflectance per sensor, where a small value means the sensor is
//! over the line. Readings are inverted so that the line carries the weight, and each sensor is
//! given an integer offset from the centre of the array. The line position is then the weighted
//! mean of those offsets.
//!
//! The centre offset uses truncating integer division, so an even number of sensors places the
//! array centre half a sensor to the left of the true middle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Minimum total inverted signal for the line to be considered detected.
pub const DETECTION_THRESHOLD: f64 = 0.01;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Estimate of where the line is relative to the centre of the sensor array.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct LineEstimate {
    /// `true` if enough signal was present to locate the line.
    pub line_detected: bool,

    /// Position of the line, positive to the right of centre. Zero if no line was detected.
    ///
    /// Units: sensor spacings
    pub position: f64,

    /// Sum of the inverted readings.
    pub sum: f64,

    /// Sum of the inverted readings weighted by their offset from centre.
    pub weighted_sum: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Estimate the line position from one snapshot of raw sensor readings.
pub fn estimate(values: &[f64]) -> LineEstimate {
    let count = values.len();

    if count == 0 {
        return LineEstimate::default();
    }

    let centre = (count as i64 - 1) / 2;

    let mut sum = 0.0;
    let mut weighted_sum = 0.0;

    for (i, raw) in values.iter().enumerate() {
        let value = 1.0 - raw;
        let pos = (i as i64 - centre) as f64;

        sum += value;
        weighted_sum += pos * value;
    }

    let line_detected = sum > DETECTION_THRESHOLD;

    LineEstimate {
        line_detected,
        position: if line_detected { weighted_sum / sum } else { 0.0 },
        sum,
        weighted_sum,
    }
}
