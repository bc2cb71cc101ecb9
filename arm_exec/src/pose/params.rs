//! Parameters for the position model

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{AnchorPoses, ObjectTarget, Workspace};
use comms_if::eqpt::arm::JointPose;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position model parameters.
///
/// The defaults are the factory calibration of the arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Intermediate waypoint used between the phases of a transport.
    pub transition_pose: JointPose,

    /// Initial size of the pick workspace.
    pub workspace: Workspace,

    /// Anchor poses used when the arm sweeps from left to right.
    pub left_to_right: AnchorPoses,

    /// Anchor poses used when the arm sweeps from right to left.
    pub right_to_left: AnchorPoses,

    /// Drop-off pose of each object class.
    pub objects: Vec<ObjectTarget>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        let bottom_middle = Some(JointPose::new(90, 120, 150, 165, 40, 70));
        let top_middle = Some(JointPose::new(90, 160, 100, 165, 40, 70));

        Self {
            transition_pose: JointPose::new(90, 100, 165, 90, 110, 10),
            workspace: Workspace {
                width: 1290.0,
                height: 572.0,
            },
            left_to_right: AnchorPoses {
                bottom_left: JointPose::new(65, 130, 145, 165, 15, 10),
                bottom_right: JointPose::new(120, 130, 145, 165, 60, 10),
                top_left: JointPose::new(72, 155, 100, 160, 20, 10),
                top_right: JointPose::new(110, 160, 100, 160, 45, 10),
                bottom_middle,
                top_middle,
            },
            right_to_left: AnchorPoses {
                bottom_left: JointPose::new(60, 130, 145, 165, 15, 10),
                bottom_right: JointPose::new(110, 130, 145, 165, 60, 10),
                top_left: JointPose::new(66, 155, 100, 160, 20, 10),
                top_right: JointPose::new(105, 160, 100, 160, 45, 10),
                bottom_middle,
                top_middle,
            },
            objects: vec![
                ObjectTarget { id: 1, pose: JointPose::new(180, 120, 130, 160, 60, 10) },
                ObjectTarget { id: 2, pose: JointPose::new(160, 130, 120, 160, 60, 10) },
                ObjectTarget { id: 3, pose: JointPose::new(140, 140, 120, 140, 60, 10) },
                ObjectTarget { id: 4, pose: JointPose::new(0, 130, 130, 160, 60, 10) },
                ObjectTarget { id: 5, pose: JointPose::new(20, 140, 120, 140, 60, 10) },
                ObjectTarget { id: 6, pose: JointPose::new(40, 150, 100, 140, 60, 10) },
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
