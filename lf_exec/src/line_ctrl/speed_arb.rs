//! # Speed arbiter
//!
//! Chooses the forward speed and steering correction for the cycle and mixes them into wheel
//! demands. While the line is lost the controller output is ignored and the robot turns towards
//! the side the line was last seen on.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use comms_if::eqpt::MotorDems;
use util::maths::clamp_sym;
use super::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Speed demands chosen by the arbiter.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct SpeedDemand {
    /// Forward speed before mixing
    pub forward: f64,

    /// Steering correction before mixing, positive turns left
    pub correction: f64,

    /// Wheel demands after mixing and limiting
    pub dems: MotorDems,

    pub left_limited: bool,
    pub right_limited: bool,

    /// `true` if the search behaviour was used
    pub searching: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Arbitrate the speed demands for one cycle.
///
/// `prev_last_error` must be the controller's last error from before this cycle's update.
pub fn arbitrate(
    line_detected: bool,
    pid_correction: f64,
    prev_last_error: f64,
    params: &Params
) -> SpeedDemand {
    let (forward, correction) = if line_detected {
        (params.base_speed, pid_correction)
    }
    else if prev_last_error >= 0.0 {
        (params.search_speed, params.search_correction)
    }
    else {
        (params.search_speed, -params.search_correction)
    };

    let (dems, left_limited, right_limited) = mix(forward, correction, params.max_speed);

    SpeedDemand {
        forward,
        correction,
        dems,
        left_limited,
        right_limited,
        searching: !line_detected,
    }
}

/// Mix a forward speed and correction into differential wheel demands.
///
/// Each wheel is limited on its own, saturating one wheel does not scale the other.
pub fn mix(forward: f64, correction: f64, max_speed: f64) -> (MotorDems, bool, bool) {
    let (left, left_limited) = clamp_sym(forward - correction, max_speed);
    let (right, right_limited) = clamp_sym(forward + correction, max_speed);

    (MotorDems { left, right }, left_limited, right_limited)
}
