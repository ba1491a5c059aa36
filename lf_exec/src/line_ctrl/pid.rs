//! # PID controller
//!
//! Fixed timestep PID controller with a clamped integral and a first order low-pass filter on the
//! derivative term.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use util::maths::clamp_sym;
use super::Params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Timestep between calls to `get`
    dt_s: f64,

    /// Filter weight given to the newest derivative
    alpha: f64,

    integral_limit: f64,
    max_correction: f64,

    /// The integral accumulation
    integral: f64,

    /// Error passed in on the previous call
    last_error: f64,

    /// Filtered derivative from the previous call
    last_derivative: f64,
}

/// Result of one controller update.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct PidOutput {
    /// Clamped controller output
    pub correction: f64,

    /// Filtered derivative used in this update
    pub derivative: f64,

    /// Integral accumulation after clamping
    pub integral: f64,

    /// `true` if the integral hit its limit this update
    pub integral_limited: bool,

    /// `true` if the correction hit its limit this update
    pub correction_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {

    /// Create a new controller from the line control parameters, with zeroed state.
    pub fn new(params: &Params) -> Self {
        Self {
            k_p: params.k_p,
            k_i: params.k_i,
            k_d: params.k_d,
            dt_s: params.dt_s,
            alpha: params.d_filter_alpha,
            integral_limit: params.integral_limit,
            max_correction: params.max_correction,
            integral: 0.0,
            last_error: 0.0,
            last_derivative: 0.0,
        }
    }

    /// Get the value of the controller for the given error.
    pub fn get(&mut self, error: f64) -> PidOutput {
        // Integral is clamped before it is used in this update's output
        let (integral, integral_limited) = clamp_sym(
            self.integral + error * self.dt_s,
            self.integral_limit
        );
        self.integral = integral;

        let raw_derivative = (error - self.last_error) / self.dt_s;
        let derivative = self.alpha * raw_derivative + (1.0 - self.alpha) * self.last_derivative;

        let (correction, correction_limited) = clamp_sym(
            self.k_p * error + self.k_i * self.integral + self.k_d * derivative,
            self.max_correction
        );

        self.last_error = error;
        self.last_derivative = derivative;

        PidOutput {
            correction,
            derivative,
            integral,
            integral_limited,
            correction_limited,
        }
    }

    /// The error passed into the most recent update.
    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    /// The current integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// The filtered derivative from the most recent update.
    pub fn last_derivative(&self) -> f64 {
        self.last_derivative
    }

    /// Reset the controller's state, keeping its gains and limits.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = 0.0;
        self.last_derivative = 0.0;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_first_update() {
        let params = Params::default();
        let mut pid = PidController::new(&params);

        let out = pid.get(1.0);

        // integral = 1.0 * 0.05, raw derivative = 1.0 / 0.05 = 20, filtered = 0.5 * 20
        assert!((out.integral - 0.05).abs() < EPS);
        assert!((out.derivative - 10.0).abs() < EPS);

        // 0.9 + 0.05 * 0.05 + 0.18 * 10 is well over the limit
        assert_eq!(out.correction, params.max_correction);
        assert!(out.correction_limited);
        assert!(!out.integral_limited);

        assert_eq!(pid.last_error(), 1.0);
        assert!((pid.last_derivative() - 10.0).abs() < EPS);
    }

    #[test]
    fn test_derivative_filter() {
        let params = Params {
            k_p: 0.0,
            k_i: 0.0,
            k_d: 1.0,
            max_correction: 1000.0,
            ..Default::default()
        };
        let mut pid = PidController::new(&params);

        // Raw derivative of 2, half of which passes the filter
        let out = pid.get(0.1);
        assert!((out.derivative - 1.0).abs() < EPS);

        // No change in error, so the filtered derivative halves
        let out = pid.get(0.1);
        assert!((out.derivative - 0.5).abs() < EPS);
        assert!((out.correction - 0.5).abs() < EPS);
    }

    #[test]
    fn test_anti_windup() {
        let params = Params::default();
        let mut pid = PidController::new(&params);

        // Unclamped the integral would reach 2.0 * 0.05 * 100 = 10
        for _ in 0..100 {
            let out = pid.get(2.0);
            assert!(out.integral.abs() <= params.integral_limit);
        }
        assert_eq!(pid.integral(), params.integral_limit);

        for _ in 0..200 {
            pid.get(-2.0);
            assert!(pid.integral().abs() <= params.integral_limit);
        }
        assert_eq!(pid.integral(), -params.integral_limit);
    }

    #[test]
    fn test_integral_clamped_before_use() {
        let params = Params {
            k_p: 0.0,
            k_i: 1.0,
            k_d: 0.0,
            integral_limit: 0.1,
            max_correction: 1000.0,
            ..Default::default()
        };
        let mut pid = PidController::new(&params);

        // Unclamped integral would be 0.5, the output must only see the clamped 0.1
        let out = pid.get(10.0);
        assert!(out.integral_limited);
        assert!((out.correction - 0.1).abs() < EPS);
    }

    #[test]
    fn test_reset() {
        let mut pid = PidController::new(&Params::default());
        pid.get(1.5);
        pid.reset();

        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.last_error(), 0.0);
        assert_eq!(pid.last_derivative(), 0.0);
    }
}
