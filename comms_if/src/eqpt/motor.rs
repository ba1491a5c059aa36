//! # Motor Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands sent to the differential drive motors.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct MotorDems {
    /// Left wheel speed demand.
    ///
    /// Units: normalised, between -max_speed and +max_speed
    pub left: f64,

    /// Right wheel speed demand.
    ///
    /// Units: normalised, between -max_speed and +max_speed
    pub right: f64
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotorDems {
    /// Demands which bring both wheels to a stop.
    pub fn stop() -> Self {
        Self::default()
    }

    /// Returns `true` if both wheels are demanded to be stationary.
    pub fn is_stop(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}
