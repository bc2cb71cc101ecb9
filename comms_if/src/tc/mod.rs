//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications 
//! interface. A telecommand is an instruction sent to the arm by one of its
//! command sources (the detection host, the web page or the command line).

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod arm_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC is empty")]
    Empty,

    #[error("TC has an unrecognised command ({0})")]
    UnknownCommand(String),

    #[error("TC {cmd} expects {expected} arguments but {found} were given")]
    WrongArgCount {
        cmd: String,
        expected: usize,
        found: usize
    },

    #[error("TC argument is not a valid number ({0})")]
    InvalidNumber(String),

    #[error("TC argument is not a finite number ({0})")]
    NonFiniteNumber(String),

    #[error("TC names an unknown joint ({0})")]
    UnknownJoint(String),

    #[error("TC names an unknown jog direction ({0})")]
    UnknownDirection(String),

    #[error("TC is not a valid command line: {0}")]
    InvalidCommandLine(String)
}
