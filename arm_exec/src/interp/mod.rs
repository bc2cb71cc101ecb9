//! Interpolation engine
//!
//! Maps a coordinate in the pick workspace onto a full joint pose by
//! interpolating between the calibration anchors. Each joint is interpolated
//! independently.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

use crate::pose::CalibError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur when building an interpolator.
#[derive(Debug, thiserror::Error)]
pub enum InterpError {
    #[error("Calibration cannot be used for interpolation: {0}")]
    Calib(#[from] CalibError),
}
