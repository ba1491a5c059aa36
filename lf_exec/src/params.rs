//! # Line Follower Executable Parameters
//!
//! This module provide parameters for the line follower executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use crate::sim_client::LinkParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LfExecParams {

    /// Address of the robot or simulation
    pub address: String,

    /// Port of the telemetry link
    pub port: u16,

    /// Task identifier written into the trace
    pub task: String,

    /// Team identifier written into the trace
    pub team_id: String,

    /// Name of the trace file, relative to the session directory
    pub trace_file_name: String,

    /// Time without a sensor frame after which the robot is stopped.
    ///
    /// Units: seconds
    pub sensor_timeout_s: f64,

    /// Period at which the session is monitored.
    ///
    /// Units: seconds
    pub monitor_period_s: f64,

    /// Telemetry link socket parameters
    #[serde(default)]
    pub link: LinkParams
}

impl Default for LfExecParams {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".into(),
            port: 50002,
            task: "Task1a".into(),
            team_id: "CB_2202".into(),
            trace_file_name: "result.json".into(),
            sensor_timeout_s: 0.5,
            monitor_period_s: 0.2,
            link: LinkParams::default()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_file() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../params/lf_exec.toml");
        let params: LfExecParams = util::params::load_from_path(path).unwrap();

        assert_eq!(params.port, 50002);
        assert_eq!(params.trace_file_name, "result.json");
        assert!(params.link.recv_timeout_ms > 0);
    }
}
