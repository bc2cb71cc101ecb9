//! Parameters for the transport sequencer

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Transport sequencer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // ---- TIMING ----
    /// Pause after each phase and each wrist ramp step.
    ///
    /// Units: milliseconds
    pub settle_ms: u64,

    /// Step delay used for every move in the sequence.
    ///
    /// Units: milliseconds
    pub move_step_delay_ms: u64,

    // ---- GRIPPER ----
    /// Units: degrees
    pub gripper_open: i32,

    /// Units: degrees
    pub gripper_closed: i32,

    // ---- PICKUP ----
    /// Added to the interpolated shoulder angle to reach down to the object.
    ///
    /// Units: degrees
    pub shoulder_pickup_offset_deg: i32,

    /// Added to the interpolated elbow angle to reach down to the object.
    ///
    /// Units: degrees
    pub elbow_pickup_offset_deg: i32,

    /// Wrist rotation used to grasp the object.
    ///
    /// Units: degrees
    pub wrist_rot_pickup_deg: i32,

    /// Wrist rotation used while carrying the object.
    ///
    /// Units: degrees
    pub wrist_rot_transport_deg: i32,

    /// Number of moves used to rotate the wrist into and out of the pickup
    /// angle.
    pub ramp_steps: u32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            settle_ms: 10,
            move_step_delay_ms: 15,
            gripper_open: 10,
            gripper_closed: 70,
            shoulder_pickup_offset_deg: 10,
            elbow_pickup_offset_deg: 10,
            wrist_rot_pickup_deg: 30,
            wrist_rot_transport_deg: 130,
            ramp_steps: 3,
        }
    }
}
