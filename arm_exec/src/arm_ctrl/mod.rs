//! Arm control module
//!
//! Owns the motion controller, the position model, the interpolator and the
//! transport sequencer, and dispatches arm telecommands onto them.

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

use comms_if::{eqpt::arm::JointId, tc::arm_ctrl::JogDirection};

use crate::{
    interp::InterpError, motion_ctrl::MotionCtrlError, pose::CalibError,
    transport_seq::TransportSeqError,
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Expected there to be an arm command but couldn't find one")]
    NoArmCmd,

    #[error("Cannot jog the {joint} {direction}")]
    InvalidJog {
        joint: JointId,
        direction: JogDirection,
    },

    #[error(transparent)]
    Calib(#[from] CalibError),

    #[error(transparent)]
    Interp(#[from] InterpError),

    #[error(transparent)]
    Seq(#[from] TransportSeqError),

    #[error(transparent)]
    Motion(#[from] MotionCtrlError),
}
