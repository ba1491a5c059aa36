//! Main line follower executable entry point.
//!
//! # Architecture
//!
//! The executable connects to the robot (or simulation) over the telemetry link and runs a
//! supervised control session until the operator stops it or the link fails:
//!
//!     - Ingestion thread: receives sensor frames into the shared session state
//!     - Control thread: every cycle runs LineCtrl on the latest sensor snapshot and sends the
//!       resulting motor demands, recording the path in the trace
//!     - Main thread: supervises the session and handles operator stop requests (Ctrl-C)
//!
//! # Modules
//!
//! All cyclic modules (e.g. `line_ctrl`) shall provide a public struct implementing the
//! `util::module::State` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{info, warn};
use structopt::StructOpt;

// Internal
use comms_if::net::zmq;
use lf_lib::{
    line_ctrl,
    params::LfExecParams,
    sim_client::SimConnector,
    supervisor::{StopCause, Supervisor, SupervisorParams, TraceConfig}
};
use util::{
    logger::{logger_init, LevelFilter},
    session::Session
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Line follower executable
#[derive(StructOpt)]
#[structopt(name = "lf_exec")]
struct Opt {
    /// Address of the robot, overrides the parameter file
    #[structopt(short, long)]
    address: Option<String>,

    /// Port of the telemetry link, overrides the parameter file
    #[structopt(short, long)]
    port: Option<u16>,

    /// Do not write the trajectory trace
    #[structopt(long)]
    no_trace: bool,

    /// Log at debug level
    #[structopt(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "lf_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    let level = if opt.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    logger_init(level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Line Follower Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut exec_params: LfExecParams = util::params::load(
        "lf_exec.toml"
    ).wrap_err("Could not load exec params")?;

    let line_ctrl_params: line_ctrl::Params = util::params::load(
        "line_ctrl.toml"
    ).wrap_err("Could not load LineCtrl params")?;

    if let Some(address) = opt.address {
        exec_params.address = address;
    }
    if let Some(port) = opt.port {
        exec_params.port = port;
    }

    info!("Exec parameters loaded");

    let trace = match opt.no_trace {
        true => None,
        false => Some(TraceConfig {
            path: session.session_root.join(&exec_params.trace_file_name),
            task: exec_params.task.clone(),
            team_id: exec_params.team_id.clone()
        })
    };

    let mut supervisor = Supervisor::new(SupervisorParams {
        line_ctrl: line_ctrl_params,
        trace,
        archive_path: Some(session.arch_root.join("line_ctrl/status_report.csv")),
        sensor_timeout_s: exec_params.sensor_timeout_s,
        monitor_period_s: exec_params.monitor_period_s
    });

    // ---- CONNECT ----

    info!("Connecting to {}:{}", exec_params.address, exec_params.port);

    let zmq_ctx = zmq::Context::new();
    let connector = SimConnector::new(zmq_ctx, exec_params.link.clone());

    supervisor.start(&connector, &exec_params.address, exec_params.port)
        .wrap_err("Failed to start the control session")?;

    // Operator stop
    let stop_handle = supervisor.stop_handle();
    ctrlc::set_handler(move || stop_handle.stop())
        .wrap_err("Failed to install the Ctrl-C handler")?;

    info!("Session running, press Ctrl-C to stop\n");

    // ---- RUN ----

    let summary = supervisor.run()
        .wrap_err("Session supervision failed")?;

    info!(
        "{} cycles run ({} on the line, {} searching, {} stopped), {} overruns",
        summary.ticks,
        summary.line_ticks,
        summary.line_lost_ticks,
        summary.safety_stop_ticks,
        summary.overruns
    );

    if summary.overruns > 0 {
        warn!("The control loop overran {} times", summary.overruns);
    }

    let stop_cause = summary.stop_cause.clone();
    session.save("summary.json", summary);

    // Supervisor and link must be gone before the zmq context is dropped
    drop(supervisor);
    drop(connector);

    session.exit();

    match stop_cause {
        Some(StopCause::LinkError(e)) => Err(eyre!("Session ended by a link error: {}", e)),
        Some(StopCause::ActivityPanic(a)) => Err(eyre!("The {} activity panicked", a)),
        _ => Ok(())
    }
}
