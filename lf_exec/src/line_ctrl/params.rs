//! Parameters structure for LineCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::Duration;
use serde::{Deserialize, Serialize};

use util::time::seconds_to_period;
use super::LineCtrlError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for line control.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Params {

    // ---- CONTROLLER ----

    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Period of one control cycle, also used as the controller timestep.
    ///
    /// Units: seconds
    pub dt_s: f64,

    /// Limit on the magnitude of the integral accumulation (anti-windup).
    pub integral_limit: f64,

    /// Weight of the newest raw derivative in the derivative low-pass filter. Must be in the open
    /// range (0, 1).
    pub d_filter_alpha: f64,

    /// Limit on the magnitude of the steering correction.
    pub max_correction: f64,

    // ---- SPEEDS ----

    /// Forward speed while the line is detected.
    pub base_speed: f64,

    /// Limit on the magnitude of each wheel's speed demand.
    pub max_speed: f64,

    /// Forward speed while searching for a lost line.
    #[serde(default = "default_search_speed")]
    pub search_speed: f64,

    /// Magnitude of the steering correction while searching for a lost line.
    #[serde(default = "default_search_correction")]
    pub search_correction: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            k_p: 0.9,
            k_i: 0.05,
            k_d: 0.18,
            dt_s: 0.05,
            integral_limit: 2.0,
            d_filter_alpha: 0.5,
            max_correction: 0.85,
            base_speed: 0.80,
            max_speed: 1.00,
            search_speed: default_search_speed(),
            search_correction: default_search_correction(),
        }
    }
}

impl Params {
    /// The control cycle period, or `None` if `dt_s` is not a usable period.
    pub fn cycle_period(&self) -> Option<Duration> {
        seconds_to_period(self.dt_s)
    }

    /// Check that the parameters describe a usable controller.
    pub fn validate(&self) -> Result<(), LineCtrlError> {
        let finite = [
            ("k_p", self.k_p),
            ("k_i", self.k_i),
            ("k_d", self.k_d),
            ("base_speed", self.base_speed),
            ("search_speed", self.search_speed),
            ("search_correction", self.search_correction),
        ];
        for (name, value) in finite.iter() {
            if !value.is_finite() {
                return Err(LineCtrlError::InvalidParam(*name, format!("{} is not finite", value)));
            }
        }

        if self.cycle_period().is_none() {
            return Err(LineCtrlError::InvalidParam(
                "dt_s",
                format!("expected a positive representable timestep, found {}", self.dt_s)
            ));
        }

        if !(self.d_filter_alpha > 0.0 && self.d_filter_alpha < 1.0) {
            return Err(LineCtrlError::InvalidParam(
                "d_filter_alpha",
                format!("expected a value in (0, 1), found {}", self.d_filter_alpha)
            ));
        }

        let limits = [
            ("integral_limit", self.integral_limit),
            ("max_correction", self.max_correction),
            ("max_speed", self.max_speed),
        ];
        for (name, value) in limits.iter() {
            if !(value.is_finite() && *value >= 0.0) {
                return Err(LineCtrlError::InvalidParam(
                    *name,
                    format!("expected a non-negative limit, found {}", value)
                ));
            }
        }

        Ok(())
    }
}

fn default_search_speed() -> f64 {
    0.55
}

fn default_search_correction() -> f64 {
    0.35
}
