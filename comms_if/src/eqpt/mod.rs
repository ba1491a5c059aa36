//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged over the telemetry link
//! between the line follower executable and the robot (or the simulation standing in for it).

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod line_sens;
pub mod motor;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

pub use line_sens::SensorFrame;
pub use motor::MotorDems;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A single message carried by the telemetry link.
///
/// Sensor frames travel from the robot to the executable, motor demands travel the other way.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum LinkMsg {
    Sensors(SensorFrame),
    Motor(MotorDems)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LinkMsg {
    /// Serialize the message into its JSON wire form.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a message from its JSON wire form.
    pub fn from_wire(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
