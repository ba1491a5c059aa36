//! # Line follower library.
//!
//! This library allows other crates in the workspace, and the benchmarks, to access items defined
//! inside the line follower crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Line control module - keeps the robot on the line
pub mod line_ctrl;

/// Telemetry link interface - abstracts the connection to the robot
pub mod link;

/// Executable parameters
pub mod params;

/// Simulation client - ZeroMQ telemetry link to the simulation
pub mod sim_client;

/// Session supervisor - owns the session lifecycle and its threads
pub mod supervisor;

/// Shared control session state
pub mod telem;

/// Trajectory trace - JSON record of the path followed
pub mod trace;
