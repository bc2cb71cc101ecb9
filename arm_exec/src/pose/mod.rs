//! Position model
//!
//! Static joint poses used by the arm (transition pose, object drop-off
//! targets) and the 2D calibration anchors which define the mapping from
//! workspace coordinates to joint poses.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calib;
mod params;
mod targets;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use calib::*;
pub use params::*;
pub use targets::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when building the position model.
#[derive(Debug, thiserror::Error)]
pub enum CalibError {
    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("Object class {0} has more than one drop-off target")]
    DuplicateObject(u8),

    #[error("Object class ids must be positive, found 0")]
    InvalidObjectId,
}
