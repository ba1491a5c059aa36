//! # Session supervisor
//!
//! The supervisor owns the lifecycle of a control session:
//!
//! ```text
//! Disconnected --start--> Running --stop/link error--> Stopping --joined--> Disconnected
//! ```
//!
//! On start it connects the telemetry link and spawns the ingestion and control threads, which
//! share an `Arc<ControlSession>`. While running it monitors the session, handling operator stop
//! requests and errors reported by the activities. The supervisor is the only writer of the
//! session's running flag. On the way out both activities are joined before the link is released.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod activities;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    path::PathBuf,
    sync::{Arc, mpsc::{self, Receiver, RecvTimeoutError, Sender}},
    thread::{self, JoinHandle},
    time::{Duration, Instant}
};
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::{
    line_ctrl::{self, LineCtrl, LineCtrlError},
    link::{ConnectionError, LinkConnector, LinkError, TelemetryLink},
    telem::{ControlSession, SensorSnapshot}
};
use activities::{CtrlContext, CtrlStats, IngestStats};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Supervises one control session at a time.
pub struct Supervisor {
    params: SupervisorParams,

    state: LifecycleState,

    session: Arc<ControlSession>,
    link: Option<Arc<dyn TelemetryLink>>,

    ctrl_jh: Option<JoinHandle<CtrlStats>>,
    ingest_jh: Option<JoinHandle<IngestStats>>,

    events_tx: Sender<SupervisorEvent>,
    events_rx: Receiver<SupervisorEvent>,

    stop_cause: Option<StopCause>,
    start_time: Option<Instant>,
    summary: Option<SessionSummary>,

    monitor_period: Duration,

    /// Name of an activity whose thread will fail to spawn.
    #[cfg(test)]
    fail_spawn: Option<&'static str>,
}

/// Parameters of a supervised session.
#[derive(Debug, Clone)]
pub struct SupervisorParams {
    pub line_ctrl: line_ctrl::Params,

    /// Trace to write, or `None` to run without one.
    pub trace: Option<TraceConfig>,

    /// Path of the LineCtrl status report archive, or `None` to run without one.
    pub archive_path: Option<PathBuf>,

    /// Time without a sensor frame after which telemetry is treated as unavailable.
    ///
    /// Units: seconds
    pub sensor_timeout_s: f64,

    /// Period at which the supervisor checks on the session.
    ///
    /// Units: seconds
    pub monitor_period_s: f64,
}

/// Where and how to write the trajectory trace.
#[derive(Debug, Clone)]
pub struct TraceConfig {
    pub path: PathBuf,
    pub task: String,
    pub team_id: String,
}

/// Requests a running supervisor to stop. Can be moved into a signal handler.
#[derive(Clone)]
pub struct StopHandle {
    events: Sender<SupervisorEvent>
}

/// Summary of a finished session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSummary {
    /// Number of control cycles run
    pub ticks: u64,
    pub line_ticks: u64,
    pub line_lost_ticks: u64,
    pub safety_stop_ticks: u64,

    /// Number of control cycles which took longer than their period
    pub overruns: u64,

    pub trace_samples: usize,

    pub frames_received: u64,
    pub sensor_timeouts: u64,

    /// Time between start and the activities being joined.
    ///
    /// Units: seconds
    pub duration_s: f64,

    pub stop_cause: Option<StopCause>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Lifecycle state of the supervised session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    Disconnected,
    Running,
    Stopping
}

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StopCause {
    Operator,
    LinkError(String),
    ActivityPanic(String)
}

/// Messages sent to the supervisor.
#[derive(Debug)]
pub(crate) enum SupervisorEvent {
    StopRequested,
    ActivityError {
        activity: &'static str,
        error: LinkError
    },
    ActivityExited {
        activity: &'static str,
        panicked: bool
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("A session is already in progress")]
    AlreadyStarted,

    #[error("No session is running")]
    NotRunning,

    #[error("Invalid line control parameters: {0}")]
    InvalidParams(LineCtrlError),

    #[error("Invalid supervisor parameter `{0}`: {1}")]
    InvalidPeriod(&'static str, f64),

    #[error("Could not connect the telemetry link: {0}")]
    Connection(ConnectionError),

    #[error("Could not spawn the {0} thread: {1}")]
    SpawnError(&'static str, std::io::Error)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SupervisorParams {
    fn default() -> Self {
        Self {
            line_ctrl: line_ctrl::Params::default(),
            trace: None,
            archive_path: None,
            sensor_timeout_s: 0.5,
            monitor_period_s: 0.2,
        }
    }
}

impl StopHandle {
    /// Ask the supervisor to stop the session.
    pub fn stop(&self) {
        if self.events.send(SupervisorEvent::StopRequested).is_err() {
            debug!("Stop requested after the supervisor was dropped");
        }
    }
}

impl Supervisor {
    /// Create a new supervisor in the `Disconnected` state.
    pub fn new(params: SupervisorParams) -> Self {
        let (events_tx, events_rx) = mpsc::channel();

        Self {
            params,
            state: LifecycleState::Disconnected,
            session: Arc::new(ControlSession::new()),
            link: None,
            ctrl_jh: None,
            ingest_jh: None,
            events_tx,
            events_rx,
            stop_cause: None,
            start_time: None,
            summary: None,
            monitor_period: Duration::from_millis(200),
            #[cfg(test)]
            fail_spawn: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Get a handle which can stop the session from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle { events: self.events_tx.clone() }
    }

    /// Copy of the latest sensor readings of the current session.
    pub fn snapshot(&self) -> SensorSnapshot {
        self.session.snapshot()
    }

    /// Summary of the last finished session.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Connect the link and start the session's activities.
    ///
    /// If this fails no session exists and the supervisor stays `Disconnected`.
    pub fn start<C: LinkConnector>(
        &mut self,
        connector: &C,
        address: &str,
        port: u16
    ) -> Result<(), SupervisorError> {
        if self.state != LifecycleState::Disconnected {
            return Err(SupervisorError::AlreadyStarted)
        }

        // Check everything before touching the link
        let sensor_timeout = period("sensor_timeout_s", self.params.sensor_timeout_s)?;
        let monitor_period = period("monitor_period_s", self.params.monitor_period_s)?;
        let line_ctrl = LineCtrl::new(self.params.line_ctrl.clone())
            .map_err(SupervisorError::InvalidParams)?;
        let cycle_period = line_ctrl.params()
            .cycle_period()
            .ok_or(SupervisorError::InvalidPeriod("dt_s", self.params.line_ctrl.dt_s))?;

        let link: Arc<dyn TelemetryLink> = Arc::new(
            connector.connect(address, port).map_err(SupervisorError::Connection)?
        );
        info!("Telemetry link connected to {}:{}", address, port);

        // Events left over from a previous session are irrelevant now
        while self.events_rx.try_recv().is_ok() {}

        let session = Arc::new(ControlSession::new());
        session.set_running(true);

        self.session = session.clone();
        self.link = Some(link.clone());
        self.stop_cause = None;
        self.summary = None;
        self.start_time = Some(Instant::now());
        self.monitor_period = monitor_period;
        self.state = LifecycleState::Running;

        // Ingestion
        let ingest = {
            let session = session.clone();
            let link = link.clone();
            let events = self.events_tx.clone();

            self.spawn("ingest", move || {
                activities::ingest_task(session, link, events, sensor_timeout)
            })
        };
        match ingest {
            Ok(jh) => self.ingest_jh = Some(jh),
            Err(e) => {
                self.abort_start();
                return Err(SupervisorError::SpawnError("ingest", e))
            }
        }

        // Control
        let ctx = CtrlContext {
            session,
            link,
            events: self.events_tx.clone(),
            line_ctrl,
            cycle_period,
            trace: self.params.trace.clone(),
            archive_path: self.params.archive_path.clone(),
        };
        let ctrl = self.spawn("ctrl", move || activities::ctrl_task(ctx));
        match ctrl {
            Ok(jh) => self.ctrl_jh = Some(jh),
            Err(e) => {
                self.abort_start();
                return Err(SupervisorError::SpawnError("ctrl", e))
            }
        }

        info!("Session started");

        Ok(())
    }

    /// Monitor the session until it stops, then tear it down.
    pub fn run(&mut self) -> Result<SessionSummary, SupervisorError> {
        if self.state != LifecycleState::Running {
            return Err(SupervisorError::NotRunning)
        }

        while self.session.is_running() {
            match self.events_rx.recv_timeout(self.monitor_period) {
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) => {
                    let snapshot = self.session.snapshot();
                    if snapshot.is_empty() {
                        debug!("No telemetry");
                    }
                    else {
                        debug!("Sensors: {:.3?}", snapshot.values());
                    }
                },
                // We hold a sender so this cannot happen, stop rather than spin
                Err(RecvTimeoutError::Disconnected) => self.begin_stop(StopCause::Operator)
            }
        }

        self.finish()
    }

    /// Stop the session and tear it down.
    ///
    /// If the session has already been torn down the last summary is returned again.
    pub fn shutdown(&mut self) -> Result<SessionSummary, SupervisorError> {
        match self.state {
            LifecycleState::Disconnected => self.summary
                .clone()
                .ok_or(SupervisorError::NotRunning),
            _ => {
                self.begin_stop(StopCause::Operator);
                self.finish()
            }
        }
    }

    fn handle_event(&mut self, event: SupervisorEvent) {
        match event {
            SupervisorEvent::StopRequested => {
                info!("Stop requested by the operator");
                self.begin_stop(StopCause::Operator);
            },
            SupervisorEvent::ActivityError { activity, error } => {
                error!("Link error in the {} activity: {}", activity, error);
                self.begin_stop(StopCause::LinkError(error.to_string()));
            },
            SupervisorEvent::ActivityExited { activity, panicked } => {
                if panicked {
                    error!("The {} activity panicked", activity);
                    self.begin_stop(StopCause::ActivityPanic(activity.into()));
                }
                else if self.session.is_running() {
                    warn!("The {} activity exited while the session was running", activity);
                    self.begin_stop(StopCause::LinkError(format!("{} exited", activity)));
                }
            }
        }
    }

    /// Running -> Stopping. The first cause recorded is kept.
    fn begin_stop(&mut self, cause: StopCause) {
        if self.stop_cause.is_none() {
            self.stop_cause = Some(cause);
        }

        self.session.set_running(false);
        self.state = LifecycleState::Stopping;
    }

    /// Stopping -> Disconnected.
    fn finish(&mut self) -> Result<SessionSummary, SupervisorError> {
        self.begin_stop(StopCause::Operator);

        let mut summary = SessionSummary::default();

        // Both activities must be gone before the link is released
        if let Some(jh) = self.ctrl_jh.take() {
            match jh.join() {
                Ok(stats) => {
                    summary.ticks = stats.ticks;
                    summary.line_ticks = stats.line_ticks;
                    summary.line_lost_ticks = stats.line_lost_ticks;
                    summary.safety_stop_ticks = stats.safety_stop_ticks;
                    summary.overruns = stats.overruns;
                    summary.trace_samples = stats.trace_samples;
                },
                Err(_) => self.record_panic("ctrl")
            }
        }
        if let Some(jh) = self.ingest_jh.take() {
            match jh.join() {
                Ok(stats) => {
                    summary.frames_received = stats.frames;
                    summary.sensor_timeouts = stats.sensor_timeouts;
                },
                Err(_) => self.record_panic("ingest")
            }
        }

        if let Some(link) = self.link.take() {
            link.disconnect();
        }

        summary.duration_s = self.start_time
            .take()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or_default();
        summary.stop_cause = self.stop_cause.clone();

        self.state = LifecycleState::Disconnected;
        self.summary = Some(summary.clone());

        info!("Session stopped ({:?}) after {:.3} s", summary.stop_cause, summary.duration_s);

        Ok(summary)
    }

    fn record_panic(&mut self, activity: &str) {
        error!("The {} activity panicked", activity);

        // A panic outranks the operator stop recorded while tearing down
        if let None | Some(StopCause::Operator) = self.stop_cause {
            self.stop_cause = Some(StopCause::ActivityPanic(activity.into()));
        }
    }

    /// Spawn an activity on its own named thread.
    fn spawn<F, T>(&self, name: &'static str, f: F) -> std::io::Result<JoinHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static
    {
        #[cfg(test)]
        {
            if self.fail_spawn == Some(name) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "thread creation refused"
                ))
            }
        }

        thread::Builder::new().name(name.into()).spawn(f)
    }

    /// Undo a partially completed start.
    fn abort_start(&mut self) {
        self.session.set_running(false);

        if let Some(jh) = self.ingest_jh.take() {
            jh.join().ok();
        }
        if let Some(jh) = self.ctrl_jh.take() {
            jh.join().ok();
        }

        if let Some(link) = self.link.take() {
            link.disconnect();
        }

        self.start_time = None;
        self.state = LifecycleState::Disconnected;
    }
}

/// Convert a supervisor period parameter, rejecting values a `Duration` cannot hold.
fn period(name: &'static str, value: f64) -> Result<Duration, SupervisorError> {
    util::time::seconds_to_period(value).ok_or(SupervisorError::InvalidPeriod(name, value))
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if self.state != LifecycleState::Disconnected {
            if let Err(e) = self.shutdown() {
                warn!("Could not shut down the session: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::link::mock::{MockConnector, MockState};
    use std::sync::atomic::Ordering;

    /// Line slightly right of centre on a five sensor array
    const FRAME: [f64; 5] = [1.0, 1.0, 0.5, 0.2, 1.0];

    fn params() -> SupervisorParams {
        SupervisorParams {
            monitor_period_s: 0.02,
            ..Default::default()
        }
    }

    fn connector(state: &Arc<MockState>) -> MockConnector {
        MockConnector { state: state.clone(), refuse: false }
    }

    fn stop_after(handle: StopHandle, ms: u64) -> thread::JoinHandle<()> {
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(ms));
            handle.stop();
        })
    }

    #[test]
    fn test_connection_refused() {
        let state = MockState::with_frame(FRAME.to_vec());
        let mut sup = Supervisor::new(params());

        let res = sup.start(&MockConnector { state, refuse: true }, "127.0.0.1", 50002);

        assert!(matches!(res, Err(SupervisorError::Connection(ConnectionError::Refused(_)))));
        assert_eq!(sup.state(), LifecycleState::Disconnected);
        assert!(matches!(sup.run(), Err(SupervisorError::NotRunning)));
        assert!(matches!(sup.shutdown(), Err(SupervisorError::NotRunning)));
    }

    #[test]
    fn test_invalid_params_do_not_connect() {
        let state = MockState::with_frame(FRAME.to_vec());
        let mut p = params();
        p.line_ctrl.d_filter_alpha = 0.0;
        let mut sup = Supervisor::new(p);

        assert!(matches!(
            sup.start(&connector(&state), "127.0.0.1", 50002),
            Err(SupervisorError::InvalidParams(_))
        ));
        assert_eq!(sup.state(), LifecycleState::Disconnected);

        let mut sup = Supervisor::new(SupervisorParams { sensor_timeout_s: -1.0, ..params() });
        assert!(matches!(
            sup.start(&connector(&state), "127.0.0.1", 50002),
            Err(SupervisorError::InvalidPeriod("sensor_timeout_s", _))
        ));

        // Too long for a Duration
        let mut sup = Supervisor::new(SupervisorParams { monitor_period_s: 1e20, ..params() });
        assert!(matches!(
            sup.start(&connector(&state), "127.0.0.1", 50002),
            Err(SupervisorError::InvalidPeriod("monitor_period_s", _))
        ));

        let mut p = params();
        p.line_ctrl.dt_s = 1e20;
        let mut sup = Supervisor::new(p);
        assert!(matches!(
            sup.start(&connector(&state), "127.0.0.1", 50002),
            Err(SupervisorError::InvalidParams(LineCtrlError::InvalidParam("dt_s", _)))
        ));
        assert_eq!(sup.state(), LifecycleState::Disconnected);

        assert_eq!(state.disconnects.load(Ordering::SeqCst), 0);
        assert!(state.sent().is_empty());
    }

    #[test]
    fn test_spawn_failure_tears_down() {
        let state = MockState::with_frame(FRAME.to_vec());
        let mut sup = Supervisor::new(params());
        sup.fail_spawn = Some("ctrl");

        assert!(matches!(
            sup.start(&connector(&state), "127.0.0.1", 50002),
            Err(SupervisorError::SpawnError("ctrl", _))
        ));

        // Ingestion was started, then joined before the link was released
        assert_eq!(sup.state(), LifecycleState::Disconnected);
        assert!(!sup.session.is_running());
        assert!(sup.ingest_jh.is_none());
        assert!(sup.ctrl_jh.is_none());
        assert_eq!(state.disconnects.load(Ordering::SeqCst), 1);
        assert!(state.sent().is_empty());
        assert!(matches!(sup.run(), Err(SupervisorError::NotRunning)));

        // A failed start leaves the supervisor usable
        let state = MockState::with_frame(FRAME.to_vec());
        sup.fail_spawn = None;
        sup.start(&connector(&state), "127.0.0.1", 50002).unwrap();
        thread::sleep(Duration::from_millis(100));
        let summary = sup.shutdown().unwrap();

        assert_eq!(summary.stop_cause, Some(StopCause::Operator));
        assert!(summary.ticks > 0);
        assert_eq!(state.disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_operator_stop() {
        let dir = tempfile::tempdir().unwrap();
        let trace_path = dir.path().join("result.json");
        let archive_path = dir.path().join("arch/line_ctrl/status_report.csv");

        let state = MockState::with_frame(FRAME.to_vec());
        let mut sup = Supervisor::new(SupervisorParams {
            trace: Some(TraceConfig {
                path: trace_path.clone(),
                task: "Task1a".into(),
                team_id: "CB_2202".into()
            }),
            archive_path: Some(archive_path.clone()),
            ..params()
        });

        sup.start(&connector(&state), "127.0.0.1", 50002).unwrap();
        assert_eq!(sup.state(), LifecycleState::Running);
        assert!(matches!(
            sup.start(&connector(&state), "127.0.0.1", 50002),
            Err(SupervisorError::AlreadyStarted)
        ));

        let stopper = stop_after(sup.stop_handle(), 300);
        let summary = sup.run().unwrap();
        stopper.join().unwrap();

        assert_eq!(sup.state(), LifecycleState::Disconnected);
        assert_eq!(summary.stop_cause, Some(StopCause::Operator));
        assert!(summary.ticks > 0);
        assert!(summary.line_ticks > 0);
        assert!(summary.frames_received > 0);
        assert_eq!(
            summary.ticks,
            summary.line_ticks + summary.line_lost_ticks + summary.safety_stop_ticks
        );

        // Link released exactly once, after the final stop demand
        assert_eq!(state.disconnects.load(Ordering::SeqCst), 1);
        let sent = state.sent();
        assert!(sent.last().unwrap().is_stop());
        assert!(sent.iter().all(|d| d.left.abs() <= 1.0 && d.right.abs() <= 1.0));

        // Trace is complete and matches the detected ticks
        let doc: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(&trace_path).unwrap()
        ).unwrap();
        assert_eq!(doc["success"], true);
        assert_eq!(doc["path"].as_array().unwrap().len(), summary.trace_samples);
        assert_eq!(summary.trace_samples as u64, summary.line_ticks);

        let archive = std::fs::read_to_string(&archive_path).unwrap();
        assert_eq!(archive.lines().count() as u64, summary.ticks + 1);

        // Shutdown once disconnected just reports the same session
        let again = sup.shutdown().unwrap();
        assert_eq!(again.ticks, summary.ticks);
        assert_eq!(state.disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_link_failure_stops_session() {
        let state = MockState::with_frame(FRAME.to_vec());
        *state.fail_after.lock().unwrap() = Some(20);

        let mut sup = Supervisor::new(params());
        sup.start(&connector(&state), "127.0.0.1", 50002).unwrap();

        // No operator stop, the link failure alone must end the session
        let summary = sup.run().unwrap();

        assert_eq!(sup.state(), LifecycleState::Disconnected);
        assert!(matches!(summary.stop_cause, Some(StopCause::LinkError(_))));
        assert_eq!(summary.frames_received, 20);
        assert_eq!(state.disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_no_telemetry_demands_stop() {
        let state = Arc::new(MockState::default());

        let mut sup = Supervisor::new(params());
        sup.start(&connector(&state), "127.0.0.1", 50002).unwrap();

        let stopper = stop_after(sup.stop_handle(), 200);
        let summary = sup.run().unwrap();
        stopper.join().unwrap();

        assert!(summary.ticks > 0);
        assert_eq!(summary.safety_stop_ticks, summary.ticks);
        assert_eq!(summary.trace_samples, 0);

        let sent = state.sent();
        assert!(!sent.is_empty());
        assert!(sent.iter().all(|d| d.is_stop()));
    }

    #[test]
    fn test_sensor_timeout_clears_telemetry() {
        let state = Arc::new(MockState::default());
        state.frames.lock().unwrap().extend(vec![FRAME.to_vec(); 5]);

        let mut sup = Supervisor::new(SupervisorParams {
            sensor_timeout_s: 0.05,
            ..params()
        });
        sup.start(&connector(&state), "127.0.0.1", 50002).unwrap();

        thread::sleep(Duration::from_millis(300));
        assert!(sup.snapshot().is_empty());

        let summary = sup.shutdown().unwrap();
        assert_eq!(summary.frames_received, 5);
        assert_eq!(summary.sensor_timeouts, 1);
        assert!(summary.safety_stop_ticks > 0);

        // The last few demands before the final one are stops as well
        let sent = state.sent();
        assert!(sent.iter().rev().take(3).all(|d| d.is_stop()));
    }

    #[test]
    fn test_shutdown_latency() {
        let state = MockState::with_frame(FRAME.to_vec());
        let p = params();
        let dt = p.line_ctrl.dt_s;

        let mut sup = Supervisor::new(p);
        sup.start(&connector(&state), "127.0.0.1", 50002).unwrap();
        thread::sleep(Duration::from_millis(170));

        let stop_time = Instant::now();
        let summary = sup.shutdown().unwrap();
        let latency = stop_time.elapsed().as_secs_f64();

        assert!(latency <= dt + 0.05, "shutdown took {} s", latency);
        assert_eq!(summary.stop_cause, Some(StopCause::Operator));
        assert_eq!(sup.state(), LifecycleState::Disconnected);
    }

    #[test]
    fn test_restart_after_stop() {
        let state = MockState::with_frame(FRAME.to_vec());
        let mut sup = Supervisor::new(params());

        sup.start(&connector(&state), "127.0.0.1", 50002).unwrap();
        sup.shutdown().unwrap();

        *state.sent.lock().unwrap() = Vec::new();
        state.disconnected.store(false, Ordering::SeqCst);

        sup.start(&connector(&state), "127.0.0.1", 50002).unwrap();
        thread::sleep(Duration::from_millis(100));
        let summary = sup.shutdown().unwrap();

        assert!(summary.ticks > 0);
        assert_eq!(state.disconnects.load(Ordering::SeqCst), 2);
    }
}
