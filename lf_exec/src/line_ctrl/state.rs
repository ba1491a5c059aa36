//! Implementations for the LineCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::Serialize;

// Internal
use super::{line_est, speed_arb, LineCtrlError, LineEstimate, Params, PidController};
use crate::telem::SensorSnapshot;
use comms_if::eqpt::MotorDems;
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Line control module state
pub struct LineCtrl {
    pub(crate) params: Params,

    pid: PidController,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    initialised: bool,
}

/// Status report for LineCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// `true` if there was no telemetry and a stop was demanded
    pub safety_stop: bool,

    pub line_detected: bool,
    pub position: f64,

    pub error: f64,
    pub integral: f64,
    pub derivative: f64,

    /// Correction used for the wheel demands
    pub correction: f64,
    pub forward: f64,

    pub left: f64,
    pub right: f64,

    pub integral_limited: bool,
    pub correction_limited: bool,
    pub left_limited: bool,
    pub right_limited: bool,

    /// `true` if the line was lost and the search turn was used
    pub line_lost: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LineCtrl {
    fn default() -> Self {
        let params = Params::default();
        Self {
            pid: PidController::new(&params),
            params,
            report: StatusReport::default(),
            arch_report: Archiver::default(),
            initialised: false,
        }
    }
}

impl LineCtrl {
    /// Create and initialise a new instance with the given parameters.
    pub fn new(params: Params) -> Result<Self, LineCtrlError> {
        let mut line_ctrl = Self::default();
        line_ctrl.init(params)?;
        Ok(line_ctrl)
    }

    /// Set the archiver that status reports are written to.
    pub fn set_archiver(&mut self, archiver: Archiver) {
        self.arch_report = archiver;
    }

    /// Get the line control parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Get the PID controller.
    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    /// Get the status report of the last cycle.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }
}

impl State for LineCtrl {
    type InitData = Params;
    type InitError = LineCtrlError;

    type InputData = SensorSnapshot;
    type OutputData = MotorDems;
    type StatusReport = StatusReport;
    type ProcError = LineCtrlError;

    /// Initialise the LineCtrl module.
    ///
    /// Validates the parameters and resets the controller.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        init_data.validate()?;

        self.pid = PidController::new(&init_data);
        self.params = init_data;
        self.report = StatusReport::default();
        self.initialised = true;

        Ok(())
    }

    /// Perform cyclic processing of line control.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        if !self.initialised {
            return Err(LineCtrlError::NotInit);
        }

        // Clear the status report
        self.report = StatusReport::default();

        // No telemetry means stop, the controller is not updated
        if input_data.is_empty() {
            self.report.safety_stop = true;
            trace!("LineCtrl: no telemetry, demanding stop");
            return Ok((MotorDems::stop(), self.report));
        }

        let LineEstimate { line_detected, position, .. } = line_est::estimate(input_data.values());

        // The search direction is decided from the error before this cycle's update
        let prev_last_error = self.pid.last_error();
        let pid_out = self.pid.get(position);

        let arb = speed_arb::arbitrate(line_detected, pid_out.correction, prev_last_error, &self.params);

        self.report = StatusReport {
            safety_stop: false,
            line_detected,
            position,
            error: position,
            integral: pid_out.integral,
            derivative: pid_out.derivative,
            correction: arb.correction,
            forward: arb.forward,
            left: arb.dems.left,
            right: arb.dems.right,
            integral_limited: pid_out.integral_limited,
            correction_limited: pid_out.correction_limited && line_detected,
            left_limited: arb.left_limited,
            right_limited: arb.right_limited,
            line_lost: arb.searching,
        };

        trace!(
            "LineCtrl: pos {:.3}, corr {:.3}, dems ({:.3}, {:.3})",
            position, arb.correction, arb.dems.left, arb.dems.right
        );

        Ok((arb.dems, self.report))
    }
}

impl Archived for LineCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        if !self.arch_report.is_init() {
            return Ok(())
        }

        self.arch_report.serialise(self.report)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn snap(values: &[f64]) -> SensorSnapshot {
        SensorSnapshot::from_slice(values)
    }

    #[test]
    fn test_not_init() {
        let mut line_ctrl = LineCtrl::default();
        assert!(matches!(
            line_ctrl.proc(&snap(&[0.5; 5])),
            Err(LineCtrlError::NotInit)
        ));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = Params { dt_s: -0.1, ..Default::default() };
        assert!(LineCtrl::new(params).is_err());
    }

    #[test]
    fn test_safety_stop_regardless_of_state() {
        let mut line_ctrl = LineCtrl::new(Params::default()).unwrap();

        // Build up some controller state with the line far to the right
        for _ in 0..20 {
            let (dems, report) = line_ctrl.proc(&snap(&[1.0, 1.0, 1.0, 1.0, 0.0])).unwrap();
            assert!(!dems.is_stop());
            assert!(report.line_detected);
        }
        let integral = line_ctrl.pid().integral();
        let last_error = line_ctrl.pid().last_error();
        assert!(integral > 0.0);

        let (dems, report) = line_ctrl.proc(&SensorSnapshot::default()).unwrap();
        assert_eq!(dems.left, 0.0);
        assert_eq!(dems.right, 0.0);
        assert!(report.safety_stop);

        // Controller is frozen while there is no telemetry
        assert_eq!(line_ctrl.pid().integral(), integral);
        assert_eq!(line_ctrl.pid().last_error(), last_error);
    }

    #[test]
    fn test_line_lost_search() {
        let mut line_ctrl = LineCtrl::new(Params::default()).unwrap();

        // Line to the right, giving a positive last error
        line_ctrl.proc(&snap(&[1.0, 1.0, 1.0, 0.4, 1.0])).unwrap();
        assert!((line_ctrl.pid().last_error() - 1.0).abs() < 1e-12);

        let (dems, report) = line_ctrl.proc(&snap(&[1.0; 5])).unwrap();
        assert!(report.line_lost);
        assert_eq!(report.correction, 0.35);
        assert_eq!(report.forward, 0.55);
        assert!((dems.left - 0.2).abs() < 1e-12);
        assert!((dems.right - 0.9).abs() < 1e-12);

        // The controller still ran, with zero error
        assert_eq!(line_ctrl.pid().last_error(), 0.0);

        // Now last error is zero, so the search continues the same way
        let (_, report) = line_ctrl.proc(&snap(&[1.0; 5])).unwrap();
        assert_eq!(report.correction, 0.35);
    }

    #[test]
    fn test_line_lost_search_negative() {
        let mut line_ctrl = LineCtrl::new(Params::default()).unwrap();

        line_ctrl.proc(&snap(&[0.0, 1.0, 1.0, 1.0, 1.0])).unwrap();
        assert!(line_ctrl.pid().last_error() < 0.0);

        let (_, report) = line_ctrl.proc(&snap(&[1.0; 5])).unwrap();
        assert_eq!(report.correction, -0.35);
    }

    #[test]
    fn test_centred_line_drives_straight() {
        let mut line_ctrl = LineCtrl::new(Params::default()).unwrap();

        let (dems, report) = line_ctrl.proc(&snap(&[0.3; 5])).unwrap();
        assert!(report.line_detected);
        assert_eq!(report.position, 0.0);
        assert_eq!(dems.left, 0.8);
        assert_eq!(dems.right, 0.8);
    }

    #[test]
    fn test_archive_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("line_ctrl/status_report.csv");

        let mut line_ctrl = LineCtrl::new(Params::default()).unwrap();
        line_ctrl.set_archiver(Archiver::create(&path).unwrap());

        line_ctrl.proc(&snap(&[0.3; 5])).unwrap();
        line_ctrl.write().unwrap();
        line_ctrl.proc(&SensorSnapshot::default()).unwrap();
        line_ctrl.write().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("safety_stop,line_detected,position"));
        assert!(lines[2].starts_with("true,false"));
    }
}
