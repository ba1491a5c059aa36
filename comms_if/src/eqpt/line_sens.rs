//! # Line Sensor Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// One reading of the whole line sensor array.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SensorFrame {
    /// Raw reflectance of each sensor, ordered left to right.
    ///
    /// Units: normalised, 0.0 (line) to 1.0 (background)
    pub values: Vec<f64>
}
