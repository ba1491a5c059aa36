//! # Control session shared state
//!
//! The [`ControlSession`] is shared between the ingestion, control and supervisor threads. Sensor
//! readings are held behind a mutex as a fixed size `Copy` snapshot, so a reader always gets a
//! reading count together with the values written alongside it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Mutex, atomic::{AtomicBool, Ordering}};
use log::warn;
use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Maximum number of line sensors held in a snapshot.
pub const SENSOR_CAPACITY: usize = 16;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A consistent copy of the latest sensor readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorSnapshot {
    values: [f64; SENSOR_CAPACITY],
    count: usize,
}

/// State shared by all activities of one control session.
#[derive(Debug)]
pub struct ControlSession {
    running: AtomicBool,
    sensors: Mutex<SensorSnapshot>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            values: [0.0; SENSOR_CAPACITY],
            count: 0,
        }
    }
}

impl SensorSnapshot {
    /// Build a snapshot from raw readings, dropping any past [`SENSOR_CAPACITY`].
    pub fn from_slice(values: &[f64]) -> Self {
        let mut snapshot = Self::default();
        snapshot.count = values.len().min(SENSOR_CAPACITY);
        snapshot.values[..snapshot.count].copy_from_slice(&values[..snapshot.count]);
        snapshot
    }

    /// The valid readings.
    pub fn values(&self) -> &[f64] {
        &self.values[..self.count]
    }

    /// Number of valid readings.
    pub fn count(&self) -> usize {
        self.count
    }

    /// `true` if there is no telemetry available.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl ControlSession {
    /// Create a new session which is not yet running and has no telemetry.
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            sensors: Mutex::new(SensorSnapshot::default()),
        }
    }

    /// Returns `true` while the session is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Only the supervisor changes the running state.
    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Publish a new set of readings, returning the number kept.
    pub fn publish(&self, values: &[f64]) -> usize {
        if values.len() > SENSOR_CAPACITY {
            warn!(
                "Received {} sensor readings, only the first {} will be used",
                values.len(),
                SENSOR_CAPACITY
            );
        }

        let snapshot = SensorSnapshot::from_slice(values);
        *self.lock_sensors() = snapshot;

        snapshot.count
    }

    /// Mark telemetry as unavailable.
    pub fn clear(&self) {
        *self.lock_sensors() = SensorSnapshot::default();
    }

    /// Take a copy of the latest readings.
    pub fn snapshot(&self) -> SensorSnapshot {
        *self.lock_sensors()
    }

    fn lock_sensors(&self) -> std::sync::MutexGuard<'_, SensorSnapshot> {
        // The snapshot is replaced whole, so a panicked writer cannot leave it half written
        self.sensors.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ControlSession {
    fn default() -> Self {
        Self::new()
    }
}
