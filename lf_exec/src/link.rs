//! # Telemetry link interface
//!
//! The telemetry link carries sensor frames from the robot and motor demands back to it. The
//! control session only talks to the link through the traits defined here, the concrete
//! ZeroMQ implementation lives in [`crate::sim_client`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{eqpt::MotorDems, net::{MonitoredSocketError, zmq}};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// An established telemetry link.
///
/// The link is shared between the ingestion and control threads, so all operations take `&self`.
pub trait TelemetryLink: Send + Sync {
    /// Receive the next sensor frame.
    ///
    /// Blocks for no longer than the link's receive timeout, returning `Ok(None)` if no frame
    /// arrived in that time.
    fn recv_sensors(&self) -> Result<Option<Vec<f64>>, LinkError>;

    /// Send demands to the motors. The demands must already be limited.
    fn send_motor_dems(&self, dems: &MotorDems) -> Result<(), LinkError>;

    /// Release the link. Calling this more than once has no further effect.
    fn disconnect(&self);
}

/// Something able to establish a [`TelemetryLink`].
pub trait LinkConnector {
    type Link: TelemetryLink + 'static;

    /// Connect to the robot at the given address and port.
    fn connect(&self, address: &str, port: u16) -> Result<Self::Link, ConnectionError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which end a session while the link is in use.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("The link is not connected")]
    NotConnected,

    #[error("Could not send demands over the link: {0}")]
    SendError(zmq::Error),

    #[error("Could not receive a message from the link: {0}")]
    RecvError(zmq::Error),

    #[error("Could not serialize the message: {0}")]
    SerializationError(serde_json::Error),

    #[error("The link was closed by the robot")]
    Closed
}

/// Errors which prevent a link from being established.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Connection to {0} refused")]
    Refused(String)
}

// ------------------------------------------------------------------------------------------------
// MOCKS
// ------------------------------------------------------------------------------------------------
