//! # Simulation Client
//!
//! The SimClient is the telemetry link to the line follower simulation. A single ZeroMQ `PAIR`
//! socket carries [`LinkMsg`]s both ways: sensor frames arrive from the simulation as quickly as
//! it produces them, and motor demands are sent back once per control cycle.
//!
//! The socket is shared by the ingestion and control threads and is guarded by a mutex, so the
//! receive timeout also bounds how long a send can be delayed by a waiting receive.
//!
//! If the simulation disconnects, receives fail with [`LinkError::Closed`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use comms_if::{
    eqpt::{LinkMsg, MotorDems},
    net::{MonitoredSocket, SocketOptions, zmq}
};
use crate::link::{ConnectionError, LinkConnector, LinkError, TelemetryLink};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Socket parameters for the link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkParams {
    /// Time allowed for the first connection to the simulation.
    ///
    /// Units: milliseconds
    pub connect_timeout_ms: i32,

    /// Maximum time a receive waits for a frame.
    ///
    /// Units: milliseconds
    pub recv_timeout_ms: i32,

    /// Maximum time a send waits before failing.
    ///
    /// Units: milliseconds
    pub send_timeout_ms: i32,

    /// Interval between ZMTP heartbeats, zero to disable.
    ///
    /// Units: milliseconds
    #[serde(default)]
    pub heartbeat_ivl_ms: i32,
}

/// Creates [`SimClient`]s.
pub struct SimConnector {
    ctx: zmq::Context,
    params: LinkParams
}

/// Telemetry link to the simulation.
pub struct SimClient {
    socket: Mutex<Option<MonitoredSocket>>,
    endpoint: String
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for LinkParams {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 1000,
            recv_timeout_ms: 10,
            send_timeout_ms: 10,
            heartbeat_ivl_ms: 0,
        }
    }
}

impl SimConnector {
    pub fn new(ctx: zmq::Context, params: LinkParams) -> Self {
        Self { ctx, params }
    }
}

impl LinkConnector for SimConnector {
    type Link = SimClient;

    fn connect(&self, address: &str, port: u16) -> Result<SimClient, ConnectionError> {
        let endpoint = format!("tcp://{}:{}", address, port);

        let socket_options = SocketOptions {
            connect_timeout: self.params.connect_timeout_ms,
            heartbeat_ivl: self.params.heartbeat_ivl_ms,
            heartbeat_ttl: self.params.heartbeat_ivl_ms * 2,
            heartbeat_timeout: self.params.heartbeat_ivl_ms * 2,
            linger: 1,
            recv_timeout: self.params.recv_timeout_ms,
            send_timeout: self.params.send_timeout_ms,
            ..Default::default()
        };

        debug!("Connecting SimClient to {}", endpoint);

        let socket = MonitoredSocket::new(&self.ctx, zmq::PAIR, socket_options, &endpoint)
            .map_err(ConnectionError::SocketError)?;

        info!("SimClient connected to {}", endpoint);

        Ok(SimClient {
            socket: Mutex::new(Some(socket)),
            endpoint
        })
    }
}

impl SimClient {
    /// The endpoint this client was connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn lock(&self) -> MutexGuard<'_, Option<MonitoredSocket>> {
        self.socket.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TelemetryLink for SimClient {
    fn recv_sensors(&self) -> Result<Option<Vec<f64>>, LinkError> {
        let guard = self.lock();
        let socket = guard.as_ref().ok_or(LinkError::NotConnected)?;

        // The simulation going away is fatal, even if zmq has since reconnected underneath us
        if socket.num_disconnects() > 0 || !socket.connected() {
            return Err(LinkError::Closed)
        }

        let msg = match socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                warn!("Non UTF-8 message received from the simulation, ignoring");
                return Ok(None)
            },
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(zmq::Error::ETERM) => return Err(LinkError::Closed),
            Err(e) => return Err(LinkError::RecvError(e))
        };

        match LinkMsg::from_wire(&msg) {
            Ok(LinkMsg::Sensors(frame)) => Ok(Some(frame.values)),
            Ok(LinkMsg::Motor(_)) => {
                warn!("Motor demands received from the simulation, ignoring");
                Ok(None)
            },
            Err(e) => {
                warn!("Malformed message received from the simulation, ignoring: {}", e);
                Ok(None)
            }
        }
    }

    fn send_motor_dems(&self, dems: &MotorDems) -> Result<(), LinkError> {
        let msg = LinkMsg::Motor(*dems)
            .to_wire()
            .map_err(LinkError::SerializationError)?;

        let guard = self.lock();
        let socket = guard.as_ref().ok_or(LinkError::NotConnected)?;

        socket.send(msg.as_str(), 0).map_err(LinkError::SendError)
    }

    fn disconnect(&self) {
        if self.lock().take().is_some() {
            info!("SimClient disconnected from {}", self.endpoint);
        }
    }
}
