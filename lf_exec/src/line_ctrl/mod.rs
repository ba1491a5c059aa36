//! # Line control module
//!
//! Line control keeps the robot on the line. Each cycle it:
//!
//! 1. Estimates the position of the line under the sensor array ([`line_est`]).
//! 2. Passes that position, as an error from the array centre, through a PID controller with a
//!    low-pass filtered derivative term ([`pid`]).
//! 3. Arbitrates a forward speed and steering correction, switching to a fixed search turn when
//!    the line is lost, and splits them into left and right wheel demands ([`speed_arb`]).
//!
//! If there is no telemetry at all the module demands a full stop rather than continuing with the
//! last known good demands.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod line_est;
pub mod params;
pub mod pid;
pub mod speed_arb;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use line_est::LineEstimate;
pub use params::Params;
pub use pid::{PidController, PidOutput};
pub use speed_arb::SpeedDemand;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LineCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LineCtrlError {
    #[error("Invalid parameter `{0}`: {1}")]
    InvalidParam(&'static str, String),

    #[error("LineCtrl has not been initialised")]
    NotInit,
}
