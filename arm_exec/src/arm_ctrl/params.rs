//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{interp, motion_ctrl, pose, transport_seq};
use comms_if::eqpt::arm::JointPose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // ---- POSES ----
    /// Pose the arm is physically in when the software starts.
    pub rest_pose: JointPose,

    /// Pose the arm moves to on a home command.
    pub home_pose: JointPose,

    /// Units: milliseconds
    pub home_step_delay_ms: u64,

    // ---- JOG ----
    /// Size of a single jog.
    ///
    /// Units: degrees
    pub jog_step_deg: i32,

    /// Units: milliseconds
    pub jog_step_delay_ms: u64,

    /// Jogs arriving sooner than this after the end of the previous jog are
    /// ignored.
    ///
    /// Units: milliseconds
    pub jog_min_interval_ms: u64,

    /// Lowest gripper angle reachable by jogging open.
    ///
    /// Units: degrees
    pub jog_gripper_min: i32,

    // ---- DEMO ----
    /// Poses visited in order by the demo command.
    pub demo_poses: Vec<JointPose>,

    /// Units: milliseconds
    pub demo_step_delay_ms: u64,

    /// Pause after reaching each demo pose.
    ///
    /// Units: milliseconds
    pub demo_pause_ms: u64,

    // ---- MODULES ----
    pub pose: pose::Params,

    pub interp: interp::Params,

    pub motion: motion_ctrl::Params,

    pub transport: transport_seq::Params,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            rest_pose: JointPose::new(90, 90, 90, 90, 90, 40),
            home_pose: JointPose::new(180, 90, 170, 80, 40, 10),
            home_step_delay_ms: 30,
            jog_step_deg: 5,
            jog_step_delay_ms: 20,
            jog_min_interval_ms: 50,
            jog_gripper_min: 10,
            demo_poses: vec![
                JointPose::new(0, 90, 120, 80, 130, 10),
                JointPose::new(0, 90, 80, 80, 130, 10),
                JointPose::new(0, 90, 40, 80, 130, 10),
            ],
            demo_step_delay_ms: 10,
            demo_pause_ms: 0,
            pose: pose::Params::default(),
            interp: interp::Params::default(),
            motion: motion_ctrl::Params::default(),
            transport: transport_seq::Params::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
