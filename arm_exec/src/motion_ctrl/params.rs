//! Parameters for the motion controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Motion controller parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Shortest allowed delay between ticks.
    ///
    /// Units: milliseconds
    pub min_step_delay_ms: u64,

    /// Longest allowed delay between ticks.
    ///
    /// Units: milliseconds
    pub max_step_delay_ms: u64,

    /// Route `JointPose::wrist_vertical` to the wrist rotation actuator and
    /// `JointPose::wrist_rotation` to the wrist vertical actuator.
    ///
    /// The factory calibration tables were recorded with this routing.
    pub swap_wrist_channels: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            min_step_delay_ms: 10,
            max_step_delay_ms: 30,
            swap_wrist_channels: true,
        }
    }
}
