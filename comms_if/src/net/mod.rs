//! # Network Module
//!
//! ZeroMQ plumbing shared by the telemetry link and its test server. The main item is the
//! [`MonitoredSocket`], a socket which knows whether its peer is currently attached.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{Arc, atomic::{AtomicBool, AtomicUsize, Ordering}},
    thread,
    time::{Duration, Instant}
};
use zmq::{Socket, Context, SocketType, SocketEvent};
use log::{debug, trace, warn};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

/// Apply a list of `(setter, value)` options to a socket, naming the failing setter in the error.
macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| MonitoredSocketError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Receive timeout on the event socket. The event thread checks for shutdown at least this often.
const EVENT_POLL_MS: i32 = 50;

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

/// Counter giving each event endpoint a unique name within the process.
static NEXT_EVENT_ID: AtomicUsize = AtomicUsize::new(0);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A zmq socket with a background thread watching its connection events.
///
/// Dereferences to the underlying [`zmq::Socket`] for sending and receiving.
pub struct MonitoredSocket {
    socket: Socket,

    event_jh: Option<thread::JoinHandle<()>>,

    shutdown: Arc<AtomicBool>,

    connected: Arc<AtomicBool>,

    disconnects: Arc<AtomicUsize>
}

/// Options applied to a [`MonitoredSocket`].
///
/// Apart from `bind` and `block_on_first_connect` these map directly onto the `ZMQ_*` socket
/// options of the same name, with times in milliseconds.
pub struct SocketOptions {
    /// Bind to the endpoint instead of connecting. Servers bind.
    pub bind: bool,

    /// Wait in `MonitoredSocket::new()` until the peer is connected, failing once
    /// `connect_timeout` has passed. A zero timeout waits forever.
    pub block_on_first_connect: bool,

    pub linger: i32,
    pub reconnect_ivl: i32,
    pub reconnect_ivl_max: i32,
    pub connect_timeout: i32,

    /// Receives return `EAGAIN` after this long, `-1` blocks
    pub recv_timeout: i32,

    /// Sends return `EAGAIN` after this long, `-1` blocks
    pub send_timeout: i32,

    pub heartbeat_ivl: i32,
    pub heartbeat_timeout: i32,
    pub heartbeat_ttl: i32
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum MonitoredSocketError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Error enabling monitoring for the socket: {0}")]
    MonitoringEnableError(zmq::Error),

    #[error("Could not connect the socket: {0:?}")]
    CouldNotConnect(Option<zmq::Error>),

    #[error("Could not read event from monitor socket: {0}")]
    EventReadError(zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),

    #[error("Could not start the socket monitor thread: {0}")]
    MonitorThreadError(std::io::Error)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MonitoredSocket {
    /// Create a socket of the given type on `endpoint` (e.g. `"tcp://127.0.0.1:50002"`) and start
    /// watching its events.
    pub fn new(
        ctx: &Context,
        socket_type: SocketType,
        socket_options: SocketOptions,
        endpoint: &str
    ) -> Result<Self, MonitoredSocketError> {
        let socket = ctx.socket(socket_type)
            .map_err(MonitoredSocketError::CreateSocketError)?;

        // Events are published on an inproc endpoint which we read with a PAIR socket
        let event_endpoint = format!(
            "inproc://events_{}",
            NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed)
        );
        socket.monitor(&event_endpoint, SocketEvent::ALL as i32)
            .map_err(MonitoredSocketError::MonitoringEnableError)?;

        let events = ctx.socket(zmq::PAIR)
            .map_err(MonitoredSocketError::CreateSocketError)?;
        set_sockopts!(events, (set_rcvtimeo, EVENT_POLL_MS));
        events.connect(&event_endpoint)
            .map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        socket_options.set(&socket)?;

        let attached = match socket_options.bind {
            true => socket.bind(endpoint),
            false => socket.connect(endpoint)
        };
        attached.map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        let connected = Arc::new(AtomicBool::new(false));

        if socket_options.block_on_first_connect {
            wait_for_connect(&events, endpoint, socket_options.connect_timeout)?;
            connected.store(true, Ordering::SeqCst);
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let disconnects = Arc::new(AtomicUsize::new(0));

        let event_jh = {
            let shutdown = shutdown.clone();
            let connected = connected.clone();
            let disconnects = disconnects.clone();

            thread::Builder::new()
                .name(event_endpoint.trim_start_matches("inproc://").into())
                .spawn(move || event_thread(events, shutdown, connected, disconnects))
                .map_err(MonitoredSocketError::MonitorThreadError)?
        };

        Ok(Self {
            socket,
            event_jh: Some(event_jh),
            shutdown,
            connected,
            disconnects
        })
    }

    /// Returns `true` if the peer is currently connected.
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of times the peer has disconnected since the socket was created.
    pub fn num_disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl Drop for MonitoredSocket {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);

        if let Some(jh) = self.event_jh.take() {
            if jh.join().is_err() {
                warn!("Socket event thread panicked");
            }
        }
    }
}

impl std::ops::Deref for MonitoredSocket {
    type Target = Socket;

    fn deref(&self) -> &Self::Target {
        &self.socket
    }
}

impl std::ops::DerefMut for MonitoredSocket {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.socket
    }
}

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), MonitoredSocketError> {
        set_sockopts!(
            socket,
            (set_connect_timeout, self.connect_timeout),
            (set_heartbeat_ivl, self.heartbeat_ivl),
            (set_heartbeat_timeout, self.heartbeat_timeout),
            (set_heartbeat_ttl, self.heartbeat_ttl),
            (set_linger, self.linger),
            (set_reconnect_ivl, self.reconnect_ivl),
            (set_reconnect_ivl_max, self.reconnect_ivl_max),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        Ok(())
    }
}

impl Default for SocketOptions {
    /// zmq's own defaults, connecting and blocking until connected.
    fn default() -> Self {
        Self {
            bind: false,
            block_on_first_connect: true,
            connect_timeout: 0,
            heartbeat_ivl: 0,
            heartbeat_timeout: 0,
            heartbeat_ttl: 0,
            linger: 30_000,
            reconnect_ivl: 100,
            reconnect_ivl_max: 0,
            recv_timeout: -1,
            send_timeout: 0
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Block until the socket reports a connection, or the timeout passes.
fn wait_for_connect(
    events: &Socket,
    endpoint: &str,
    timeout_ms: i32
) -> Result<(), MonitoredSocketError> {
    let deadline = match timeout_ms {
        t if t > 0 => Some(Instant::now() + Duration::from_millis(t as u64)),
        _ => None
    };

    loop {
        if let Some(d) = deadline {
            if Instant::now() > d {
                return Err(MonitoredSocketError::CouldNotConnect(None))
            }
        }

        match read_event(events).map_err(MonitoredSocketError::EventReadError)? {
            Some(SocketEvent::CONNECTED) => return Ok(()),
            Some(SocketEvent::CONNECT_DELAYED) | None => (),
            Some(e) => {
                debug!("{:?} while connecting to {}", e, endpoint);
                return Err(MonitoredSocketError::CouldNotConnect(None))
            }
        }
    }
}

/// Read one event, returning `None` if none arrived within the poll period.
fn read_event(events: &Socket) -> Result<Option<SocketEvent>, zmq::Error> {
    let msg = match events.recv_msg(0) {
        Ok(m) => m,
        Err(zmq::Error::EAGAIN) => return Ok(None),
        Err(e) => return Err(e)
    };

    // First frame is a 16 bit event ID followed by a 32 bit value
    if msg.len() < 2 {
        return Err(zmq::Error::EINVAL)
    }
    let id = u16::from_ne_bytes([msg[0], msg[1]]);

    // Second frame is the peer address, not needed
    if events.get_rcvmore()? {
        events.recv_msg(0)?;
    }

    Ok(Some(SocketEvent::from_raw(id)))
}

fn event_thread(
    events: Socket,
    shutdown: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
    disconnects: Arc<AtomicUsize>
) {
    while !shutdown.load(Ordering::SeqCst) {
        let event = match read_event(&events) {
            Ok(Some(e)) => e,
            Ok(None) => continue,
            Err(e) => {
                warn!("Could not read socket event, connection state no longer tracked: {}", e);
                break
            }
        };

        trace!("Socket event: {:?}", event);

        match event {
            SocketEvent::CONNECTED | SocketEvent::ACCEPTED => {
                connected.store(true, Ordering::SeqCst);
            },
            SocketEvent::DISCONNECTED => {
                connected.store(false, Ordering::SeqCst);
                disconnects.fetch_add(1, Ordering::SeqCst);
            },
            _ => ()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_connect_and_disconnect() {
        let ctx = zmq::Context::new();

        let server = MonitoredSocket::new(
            &ctx,
            zmq::PAIR,
            SocketOptions {
                bind: true,
                block_on_first_connect: false,
                linger: 0,
                ..Default::default()
            },
            "tcp://127.0.0.1:51010"
        ).unwrap();
        assert!(!server.connected());

        let client = MonitoredSocket::new(
            &ctx,
            zmq::PAIR,
            SocketOptions {
                connect_timeout: 1000,
                linger: 0,
                ..Default::default()
            },
            "tcp://127.0.0.1:51010"
        ).unwrap();
        assert!(client.connected());

        drop(client);

        // The server sees the peer leave within a few event polls
        let deadline = Instant::now() + Duration::from_secs(2);
        while server.num_disconnects() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(server.num_disconnects(), 1);
        assert!(!server.connected());
    }

    #[test]
    fn test_connect_timeout() {
        let ctx = zmq::Context::new();

        let start = Instant::now();
        let res = MonitoredSocket::new(
            &ctx,
            zmq::PAIR,
            SocketOptions {
                connect_timeout: 200,
                linger: 0,
                ..Default::default()
            },
            "tcp://127.0.0.1:51011"
        );

        assert!(matches!(res, Err(MonitoredSocketError::CouldNotConnect(None))));
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
