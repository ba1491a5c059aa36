//! Logger setup
//!
//! Log lines go to stdout with coloured level tags and to the session's log file without colour.
//! Each line is stamped with the seconds elapsed since the session epoch. Debug and trace lines
//! also carry the thread name and target, since the control session runs on several threads.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::fmt;
use log::{self, info};
use colored::{ColoredString, Colorize};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Notes
///
/// - `min_level` must be `Info` or more verbose, warnings and errors are never hidden.
/// - Only one logger can be set per process, a second call returns `FernInitError`.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let stdout = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!(
            "{}",
            format_line(session::get_elapsed_seconds(), record, message, true)
        )))
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!(
            "{}",
            format_line(session::get_elapsed_seconds(), record, message, false)
        )))
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .level_for("zmq", LevelFilter::Info)
        .chain(stdout)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Format one log line.
fn format_line(
    elapsed_s: f64,
    record: &log::Record,
    message: &fmt::Arguments,
    colour: bool
) -> String {
    let level = match colour {
        true => level_tag(record.level()),
        false => level_str(record.level()).normal()
    };

    // Only debug and trace carry their origin
    if record.level() > log::Level::Info {
        let thread = std::thread::current();
        format!(
            "[{:10.6} {}] ({}) {}: {}",
            elapsed_s,
            level,
            thread.name().unwrap_or("?"),
            record.target(),
            message
        )
    }
    else {
        format!("[{:10.6} {}] {}", elapsed_s, level, message)
    }
}

fn level_str(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info  => "INF",
        log::Level::Warn  => "WRN",
        log::Level::Error => "ERR"
    }
}

/// Get the coloured tag for a log level
fn level_tag(level: log::Level) -> ColoredString {
    let s = level_str(level);

    match level {
        log::Level::Trace => s.dimmed().italic(),
        log::Level::Debug => s.dimmed(),
        log::Level::Info  => s.normal(),
        log::Level::Warn  => s.yellow(),
        log::Level::Error => s.red().bold()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn line(level: log::Level, target: &str, colour: bool) -> String {
        format_line(
            1.5,
            &log::Record::builder()
                .level(level)
                .target(target)
                .args(format_args!("cycle overran"))
                .build(),
            &format_args!("cycle overran"),
            colour
        )
    }

    #[test]
    fn test_info_line() {
        assert_eq!(
            line(log::Level::Warn, "lf_lib::supervisor", false),
            "[  1.500000 WRN] cycle overran"
        );
    }

    #[test]
    fn test_debug_line_has_origin() {
        let handle = std::thread::Builder::new()
            .name("ctrl".into())
            .spawn(|| line(log::Level::Debug, "lf_lib::line_ctrl", false))
            .unwrap();

        assert_eq!(
            handle.join().unwrap(),
            "[  1.500000 DBG] (ctrl) lf_lib::line_ctrl: cycle overran"
        );
    }
}
