//! Transport sequencer
//!
//! Runs the pick, transport and place macro for one object. The arm always
//! passes through the transition pose between the pick site and the drop-off
//! site, with the wrist rotated out of the way while carrying the object.

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

use crate::motion_ctrl::MotionCtrlError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportSeqError {
    #[error("No drop-off target for object class {0}")]
    UnknownObject(u8),

    #[error("Pick coordinate ({x}, {y}) is not a finite number")]
    InvalidPick { x: f64, y: f64 },

    /// A move was cancelled or timed out. `partial` holds the moves completed
    /// before the abort.
    #[error("Transport aborted: {source}")]
    Motion {
        source: MotionCtrlError,
        partial: Box<SeqReport>,
    },
}
