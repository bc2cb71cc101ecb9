//! Motion controller
//!
//! Drives the six joints from their tracked angles to a target pose in lock
//! step ticks. On each tick every joint which has not reached its target is
//! commanded to its current tracked angle and the tracked angle is then
//! moved one degree towards the target, so joints with larger moves finish
//! later.
//!
//! The tracked actuator state is owned by [`MotionCtrl`] and changes only
//! through [`MotionCtrl::move_to`], [`MotionCtrl::move_with`] and
//! [`MotionCtrl::step`].

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod clock;
mod params;
mod port;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use clock::*;
pub use params::*;
pub use port::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during a move.
///
/// Illegal targets are never an error, they are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MotionCtrlError {
    #[error("Move cancelled after {ticks} ticks")]
    Cancelled { ticks: u32 },

    #[error("Move timed out after {ticks} ticks")]
    TimedOut { ticks: u32 },
}
