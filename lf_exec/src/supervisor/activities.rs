//! Activities run by the supervisor on their own threads.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    path::PathBuf,
    sync::{Arc, mpsc::Sender},
    thread,
    time::{Duration, Instant}
};
use log::{debug, error, info, warn};

use comms_if::eqpt::MotorDems;
use util::{
    archive::{Archived, Archiver},
    module::State
};
use crate::{
    line_ctrl::{LineCtrl, StatusReport},
    link::TelemetryLink,
    telem::ControlSession,
    trace::TraceLogger
};
use super::{SupervisorEvent, TraceConfig};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Everything the control loop needs, moved onto its thread.
pub(super) struct CtrlContext {
    pub session: Arc<ControlSession>,
    pub link: Arc<dyn TelemetryLink>,
    pub events: Sender<SupervisorEvent>,
    pub line_ctrl: LineCtrl,
    pub cycle_period: Duration,
    pub trace: Option<TraceConfig>,
    pub archive_path: Option<PathBuf>,
}

/// Counters kept by the control loop.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct CtrlStats {
    pub ticks: u64,
    pub line_ticks: u64,
    pub line_lost_ticks: u64,
    pub safety_stop_ticks: u64,
    pub overruns: u64,
    pub trace_samples: usize,
}

/// Counters kept by the ingestion loop.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct IngestStats {
    pub frames: u64,
    pub sensor_timeouts: u64,
}

/// Tells the supervisor when an activity's thread ends, including by panic.
struct ExitGuard {
    activity: &'static str,
    events: Sender<SupervisorEvent>
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CtrlStats {
    fn update(&mut self, report: &StatusReport) {
        self.ticks += 1;

        if report.safety_stop {
            self.safety_stop_ticks += 1;
        }
        else if report.line_detected {
            self.line_ticks += 1;
        }
        else {
            self.line_lost_ticks += 1;
        }
    }
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        // The supervisor may already be gone during teardown
        self.events.send(SupervisorEvent::ActivityExited {
            activity: self.activity,
            panicked: thread::panicking()
        }).ok();
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Periodic control loop.
///
/// Runs one line control cycle every `cycle_period` until the session stops, then demands a stop and
/// finalises the trace.
pub(super) fn ctrl_task(ctx: CtrlContext) -> CtrlStats {
    let CtrlContext {
        session, link, events, mut line_ctrl, cycle_period, trace, archive_path
    } = ctx;

    let _guard = ExitGuard { activity: "ctrl", events: events.clone() };

    let mut stats = CtrlStats::default();

    // A missing trace or archive must not stop the robot
    let mut trace = match trace {
        Some(cfg) => match TraceLogger::create(&cfg.path, &cfg.task, &cfg.team_id) {
            Ok(t) => {
                info!("Trace will be written to {:?}", cfg.path);
                Some(t)
            },
            Err(e) => {
                warn!("Could not open the trace, continuing without it: {}", e);
                None
            }
        },
        None => None
    };

    if let Some(path) = archive_path {
        match Archiver::create(&path) {
            Ok(a) => line_ctrl.set_archiver(a),
            Err(e) => warn!("Could not create the LineCtrl archive, continuing without it: {}", e)
        }
    }

    info!("Control loop started with a {:.3} s period", cycle_period.as_secs_f64());

    while session.is_running() {
        let cycle_start = Instant::now();

        let snapshot = session.snapshot();

        let (dems, report) = match line_ctrl.proc(&snapshot) {
            Ok(o) => o,
            Err(e) => {
                error!("LineCtrl processing error, demanding stop: {}", e);
                (MotorDems::stop(), StatusReport { safety_stop: true, ..Default::default() })
            }
        };

        stats.update(&report);

        if report.line_detected {
            if let Some(ref mut t) = trace {
                if let Err(e) = t.append(report.position) {
                    warn!("Could not write to the trace, no further samples will be kept: {}", e);
                    trace = None;
                }
            }
        }

        if let Err(e) = line_ctrl.write() {
            warn!("Could not archive LineCtrl data, archiving disabled: {}", e);
            line_ctrl.set_archiver(Archiver::default());
        }

        if let Err(e) = link.send_motor_dems(&dems) {
            events.send(SupervisorEvent::ActivityError { activity: "ctrl", error: e }).ok();
            break;
        }

        // Sleep for the rest of the cycle
        match cycle_period.checked_sub(cycle_start.elapsed()) {
            Some(d) => thread::sleep(d),
            None => {
                stats.overruns += 1;
                warn!(
                    "Control cycle overran by {:.6} s",
                    (cycle_start.elapsed() - cycle_period).as_secs_f64()
                );
            }
        }
    }

    // Best effort, the link may be the reason for stopping
    if let Err(e) = link.send_motor_dems(&MotorDems::stop()) {
        debug!("Could not send the final stop demand: {}", e);
    }

    if let Some(mut t) = trace.take() {
        if let Err(e) = t.finalise() {
            warn!("Could not finalise the trace: {}", e);
        }
        stats.trace_samples = t.num_samples();
    }

    info!("Control loop stopped after {} cycles", stats.ticks);

    stats
}

/// Telemetry ingestion loop.
///
/// Publishes every sensor frame received into the session. If no frame arrives for
/// `sensor_timeout` the telemetry is cleared so the control loop stops the robot.
pub(super) fn ingest_task(
    session: Arc<ControlSession>,
    link: Arc<dyn TelemetryLink>,
    events: Sender<SupervisorEvent>,
    sensor_timeout: Duration
) -> IngestStats {
    let _guard = ExitGuard { activity: "ingest", events: events.clone() };

    let mut stats = IngestStats::default();
    let mut last_frame = Instant::now();
    let mut stale = true;

    while session.is_running() {
        match link.recv_sensors() {
            Ok(Some(values)) => {
                session.publish(&values);
                last_frame = Instant::now();
                stats.frames += 1;

                if stale {
                    info!("Receiving telemetry ({} sensors)", values.len());
                    stale = false;
                }
            },
            Ok(None) => {
                if !stale && last_frame.elapsed() > sensor_timeout {
                    warn!(
                        "No telemetry for {:.3} s, demanding stop until it resumes",
                        last_frame.elapsed().as_secs_f64()
                    );
                    session.clear();
                    stats.sensor_timeouts += 1;
                    stale = true;
                }
            },
            Err(e) => {
                events.send(SupervisorEvent::ActivityError { activity: "ingest", error: e }).ok();
                break;
            }
        }
    }

    debug!("Ingestion stopped after {} frames", stats.frames);

    stats
}
