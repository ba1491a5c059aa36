//! # Trajectory trace
//!
//! Writes the path followed by the robot as a JSON document. The document is streamed: the header
//! is written on creation, one sample is appended per detected line position, and the trailer is
//! written by [`TraceLogger::finalise`]. The layout is fixed for compatibility with existing
//! consumers of the trace:
//!
//! ```text
//! {
//!   "task": "Task1a",
//!   "team_id": "CB_2202",
//!   "success": false,
//!   "path": [
//!     {"x": 1.25, "y": 0.00},
//!     {"x": 0.80, "y": 0.00}
//!   ],
//!   "success": true,
//!   "time_taken": 0.0
//! }
//! ```
//!
//! The `success` key appears twice, readers taking the last value see `true` once the trace has
//! been finalised. `y` and `time_taken` are always zero.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path
};
use log::warn;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Scale applied to the line position to get the `x` coordinate of a sample.
pub const POSITION_SCALE: f64 = 10.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Streaming writer for the trace document.
pub struct TraceLogger<W: Write> {
    writer: W,
    num_samples: usize,
    finalised: bool
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("Could not open the trace file: {0}")]
    OpenError(std::io::Error),

    #[error("Could not write to the trace: {0}")]
    WriteError(std::io::Error),

    #[error("Could not encode the trace header: {0}")]
    EncodeError(serde_json::Error),

    #[error("The trace has already been finalised")]
    AlreadyFinalised
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TraceLogger<BufWriter<File>> {
    /// Create a trace file at the given path, overwriting any existing file.
    pub fn create<P: AsRef<Path>>(
        path: P, task: &str, team_id: &str
    ) -> Result<Self, TraceError> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).map_err(TraceError::OpenError)?;
        }

        let file = File::create(path).map_err(TraceError::OpenError)?;

        Self::new(BufWriter::new(file), task, team_id)
    }
}

impl<W: Write> TraceLogger<W> {
    /// Start a trace on the given writer, writing the header.
    pub fn new(mut writer: W, task: &str, team_id: &str) -> Result<Self, TraceError> {
        let task = serde_json::to_string(task).map_err(TraceError::EncodeError)?;
        let team_id = serde_json::to_string(team_id).map_err(TraceError::EncodeError)?;

        write!(
            writer,
            "{{\n  \"task\": {},\n  \"team_id\": {},\n  \"success\": false,\n  \"path\": [",
            task, team_id
        ).map_err(TraceError::WriteError)?;

        Ok(Self {
            writer,
            num_samples: 0,
            finalised: false
        })
    }

    /// Append a sample for the given line position.
    ///
    /// Non-finite positions cannot be represented in JSON and are skipped.
    pub fn append(&mut self, position: f64) -> Result<(), TraceError> {
        if self.finalised {
            return Err(TraceError::AlreadyFinalised)
        }

        if !position.is_finite() {
            warn!("Non-finite line position {} not added to the trace", position);
            return Ok(())
        }

        let sep = if self.num_samples == 0 { "\n" } else { ",\n" };

        write!(
            self.writer,
            "{}    {{\"x\": {:.2}, \"y\": {:.2}}}",
            sep, position * POSITION_SCALE, 0.0
        ).map_err(TraceError::WriteError)?;

        self.num_samples += 1;

        Ok(())
    }

    /// Write the trailer and flush the trace. May only be called once.
    pub fn finalise(&mut self) -> Result<(), TraceError> {
        if self.finalised {
            return Err(TraceError::AlreadyFinalised)
        }
        self.finalised = true;

        let close = if self.num_samples == 0 { "]" } else { "\n  ]" };

        write!(
            self.writer,
            "{},\n  \"success\": true,\n  \"time_taken\": 0.0\n}}\n",
            close
        ).map_err(TraceError::WriteError)?;

        self.writer.flush().map_err(TraceError::WriteError)
    }

    /// Number of samples in the trace.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn is_finalised(&self) -> bool {
        self.finalised
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> Drop for TraceLogger<W> {
    fn drop(&mut self) {
        if !self.finalised {
            if let Err(e) = self.finalise() {
                warn!("Could not finalise the trace: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::Value;

    fn finalised_text(trace: &mut TraceLogger<Vec<u8>>) -> String {
        trace.finalise().unwrap();
        String::from_utf8(trace.get_ref().clone()).unwrap()
    }

    #[test]
    fn test_empty_trace_is_valid() {
        let mut trace = TraceLogger::new(Vec::new(), "Task1a", "CB_2202").unwrap();
        let text = finalised_text(&mut trace);

        let doc: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["task"], "Task1a");
        assert_eq!(doc["team_id"], "CB_2202");
        assert_eq!(doc["success"], true);
        assert_eq!(doc["time_taken"], 0.0);
        assert_eq!(doc["path"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_samples() {
        let mut trace = TraceLogger::new(Vec::new(), "Task1a", "CB_2202").unwrap();
        trace.append(0.125).unwrap();
        trace.append(-1.0).unwrap();
        trace.append(std::f64::NAN).unwrap();
        assert_eq!(trace.num_samples(), 2);

        let text = finalised_text(&mut trace);
        assert!(text.contains("    {\"x\": 1.25, \"y\": 0.00},\n    {\"x\": -10.00, \"y\": 0.00}\n  ],"));

        let doc: Value = serde_json::from_str(&text).unwrap();
        let path = doc["path"].as_array().unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0]["x"], 1.25);
        assert_eq!(path[1]["x"], -10.0);
        assert_eq!(path[1]["y"], 0.0);
    }

    #[test]
    fn test_header_before_finalise() {
        let trace = TraceLogger::new(Vec::new(), "Task1a", "CB_2202").unwrap();
        let text = String::from_utf8(trace.get_ref().clone()).unwrap();

        assert!(text.starts_with("{\n  \"task\": \"Task1a\",\n  \"team_id\": \"CB_2202\",\n  \"success\": false,"));
        assert!(!trace.is_finalised());

        // Drop finalises, nothing to check on a Vec but it must not panic
    }

    #[test]
    fn test_finalise_once() {
        let mut trace = TraceLogger::new(Vec::new(), "t", "id").unwrap();
        trace.finalise().unwrap();

        assert!(matches!(trace.finalise(), Err(TraceError::AlreadyFinalised)));
        assert!(matches!(trace.append(1.0), Err(TraceError::AlreadyFinalised)));

        let text = String::from_utf8(trace.get_ref().clone()).unwrap();
        assert_eq!(text.matches("time_taken").count(), 1);
    }

    #[test]
    fn test_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traces/result.json");

        {
            let mut trace = TraceLogger::create(&path, "Task1a", "CB_2202").unwrap();
            trace.append(0.3).unwrap();
            // Dropped without finalising
        }

        let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["success"], true);
        assert_eq!(doc["path"][0]["x"], 3.0);
    }

    #[test]
    fn test_create_fails_on_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("not_a_dir");
        std::fs::write(&file, "").unwrap();

        assert!(matches!(
            TraceLogger::create(file.join("result.json"), "t", "id"),
            Err(TraceError::OpenError(_))
        ));
    }
}
