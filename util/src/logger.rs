//! Logger setup for the arm executables
//!
//! Every record goes to the session log file. The console shares the same
//! format but never shows `TRACE`, since per-tick actuator writes would
//! otherwise bury the command line prompt.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use log::{self, info};
use std::fmt;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Most verbose level shown on the console.
const MAX_CONSOLE_LEVEL: LevelFilter = LevelFilter::Debug;

/// Dependencies which are limited to `INFO` whatever the requested level.
const QUIET_TARGETS: [&str; 1] = ["rustyline"];

/// Crate prefix dropped from targets to keep lines short.
const LIB_TARGET_PREFIX: &str = "arm_lib::";

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
/// `min_level` applies to the log file. The console is additionally capped
/// at `DEBUG`. Levels quieter than `INFO` are rejected so command dispatch is
/// always recorded.
///
/// Must only be called once per process.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level))
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    let console = fern::Dispatch::new()
        .level(console_level(min_level))
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .level(min_level)
        .chain(log_file);

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}",
                format_record(
                    session::get_elapsed_seconds(),
                    record.level(),
                    record.target(),
                    message
                )
            ))
        })
        .level(min_level);

    for target in QUIET_TARGETS.iter() {
        dispatch = dispatch.level_for(*target, LevelFilter::Info);
    }

    dispatch
        .chain(console)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    File level: {:?}, console level: {:?}", min_level, console_level(min_level));
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn console_level(min_level: LevelFilter) -> LevelFilter {
    std::cmp::min(min_level, MAX_CONSOLE_LEVEL)
}

/// Format one log line.
///
/// Records below `INFO` include their (shortened) target so the module
/// producing per-move detail can be told apart.
fn format_record(
    elapsed_s: f64,
    level: log::Level,
    target: &str,
    message: &fmt::Arguments
) -> String {
    if level > log::Level::Info {
        format!(
            "[{:10.6} {}] {}: {}",
            elapsed_s,
            level_tag(level),
            short_target(target),
            message
        )
    }
    else {
        format!("[{:10.6} {}] {}", elapsed_s, level_tag(level), message)
    }
}

fn short_target(target: &str) -> &str {
    target.strip_prefix(LIB_TARGET_PREFIX).unwrap_or(target)
}

/// Three letter coloured tag for a level.
fn level_tag(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
