//! # Arm Equipment Definitions
//!
//! Joint identifiers, joint poses and the hard limits of each joint, plus the status reported by
//! the arm to its command sources.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::tc::TcParseError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of joints on the arm.
pub const NUM_JOINTS: usize = 6;

/// All joints in pose field order.
pub const JOINT_IDS: [JointId; NUM_JOINTS] = [
    JointId::Base,
    JointId::Shoulder,
    JointId::Elbow,
    JointId::WristVertical,
    JointId::WristRotation,
    JointId::Gripper,
];

/// Legal `(min, max)` range of each joint in pose field order.
///
/// Units: degrees
pub const JOINT_LIMITS_DEG: [(i32, i32); NUM_JOINTS] = [
    (0, 180),
    (15, 165),
    (0, 180),
    (0, 180),
    (0, 180),
    (6, 73),
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A complete assignment of all six joint angles.
///
/// In parameter files a pose is written as an array in field order, for example
/// `[90, 100, 165, 90, 110, 10]`.
///
/// Units: degrees
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(from = "[i32; 6]", into = "[i32; 6]")]
pub struct JointPose {
    pub base: i32,
    pub shoulder: i32,
    pub elbow: i32,
    pub wrist_vertical: i32,
    pub wrist_rotation: i32,
    pub gripper: i32,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of all joints on the arm
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone, PartialOrd, Ord)]
pub enum JointId {
    Base,
    Shoulder,
    Elbow,
    WristVertical,
    WristRotation,
    Gripper,
}

/// Status of the arm as reported to command sources.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmStatus {
    /// No command is being executed, a new one will be accepted.
    Idle,

    /// A command is being executed, new commands will be rejected.
    Busy,
}

/// Response to a command submitted to the arm.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmCmdResponse {
    /// The command has been accepted and will be executed.
    Accepted,

    /// Another command is in progress so this one has been rejected.
    Busy,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl JointId {
    /// Index of this joint in pose field order.
    pub fn index(self) -> usize {
        match self {
            JointId::Base => 0,
            JointId::Shoulder => 1,
            JointId::Elbow => 2,
            JointId::WristVertical => 3,
            JointId::WristRotation => 4,
            JointId::Gripper => 5,
        }
    }

    /// Legal `(min, max)` range of the joint in degrees.
    pub fn limits_deg(self) -> (i32, i32) {
        JOINT_LIMITS_DEG[self.index()]
    }

    /// Clamp an angle into this joint's legal range.
    pub fn clamp_angle(self, angle_deg: i32) -> i32 {
        let (min, max) = self.limits_deg();
        angle_deg.max(min).min(max)
    }

    /// The short name of the joint as used in commands.
    pub fn name(self) -> &'static str {
        match self {
            JointId::Base => "base",
            JointId::Shoulder => "shoulder",
            JointId::Elbow => "elbow",
            JointId::WristVertical => "wrist_vert",
            JointId::WristRotation => "wrist_rot",
            JointId::Gripper => "gripper",
        }
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JointId {
    type Err = TcParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" | "m1" => Ok(JointId::Base),
            "shoulder" | "m2" => Ok(JointId::Shoulder),
            "elbow" | "m3" => Ok(JointId::Elbow),
            "wrist_vert" | "wrist_vertical" | "m4" => Ok(JointId::WristVertical),
            "wrist_rot" | "wrist_rotation" | "m5" => Ok(JointId::WristRotation),
            "gripper" | "m6" => Ok(JointId::Gripper),
            _ => Err(TcParseError::UnknownJoint(s.to_string())),
        }
    }
}

impl JointPose {
    pub const fn new(
        base: i32,
        shoulder: i32,
        elbow: i32,
        wrist_vertical: i32,
        wrist_rotation: i32,
        gripper: i32,
    ) -> Self {
        Self {
            base,
            shoulder,
            elbow,
            wrist_vertical,
            wrist_rotation,
            gripper,
        }
    }

    /// Get the angle of a single joint.
    pub fn get(&self, joint: JointId) -> i32 {
        match joint {
            JointId::Base => self.base,
            JointId::Shoulder => self.shoulder,
            JointId::Elbow => self.elbow,
            JointId::WristVertical => self.wrist_vertical,
            JointId::WristRotation => self.wrist_rotation,
            JointId::Gripper => self.gripper,
        }
    }

    /// Set the angle of a single joint.
    pub fn set(&mut self, joint: JointId, angle_deg: i32) {
        match joint {
            JointId::Base => self.base = angle_deg,
            JointId::Shoulder => self.shoulder = angle_deg,
            JointId::Elbow => self.elbow = angle_deg,
            JointId::WristVertical => self.wrist_vertical = angle_deg,
            JointId::WristRotation => self.wrist_rotation = angle_deg,
            JointId::Gripper => self.gripper = angle_deg,
        }
    }

    /// Return a copy of this pose with one joint replaced.
    pub fn with(mut self, joint: JointId, angle_deg: i32) -> Self {
        self.set(joint, angle_deg);
        self
    }

    pub fn with_base(self, angle_deg: i32) -> Self {
        self.with(JointId::Base, angle_deg)
    }

    pub fn with_wrist_rotation(self, angle_deg: i32) -> Self {
        self.with(JointId::WristRotation, angle_deg)
    }

    pub fn with_gripper(self, angle_deg: i32) -> Self {
        self.with(JointId::Gripper, angle_deg)
    }

    /// Return a copy of this pose with every joint clamped into its legal range.
    pub fn clamped(&self) -> Self {
        let mut pose = *self;
        for joint in JOINT_IDS.iter() {
            pose.set(*joint, joint.clamp_angle(self.get(*joint)));
        }
        pose
    }

    /// True if every joint is within its legal range.
    pub fn is_within_limits(&self) -> bool {
        self.clamped() == *self
    }

    /// The joint angles as an array in field order.
    pub fn to_array(&self) -> [i32; NUM_JOINTS] {
        [
            self.base,
            self.shoulder,
            self.elbow,
            self.wrist_vertical,
            self.wrist_rotation,
            self.gripper,
        ]
    }
}

impl From<[i32; NUM_JOINTS]> for JointPose {
    fn from(a: [i32; NUM_JOINTS]) -> Self {
        Self::new(a[0], a[1], a[2], a[3], a[4], a[5])
    }
}

impl From<JointPose> for [i32; NUM_JOINTS] {
    fn from(p: JointPose) -> Self {
        p.to_array()
    }
}

impl fmt::Display for JointPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {}, {})",
            self.base,
            self.shoulder,
            self.elbow,
            self.wrist_vertical,
            self.wrist_rotation,
            self.gripper
        )
    }
}

/// Parse a pose from six comma separated angles, e.g. `90,100,165,90,110,10`.
impl FromStr for JointPose {
    type Err = TcParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let angles = s
            .trim_matches(|c| c == '(' || c == ')')
            .split(',')
            .map(|a| {
                a.trim()
                    .parse::<i32>()
                    .map_err(|_| TcParseError::InvalidNumber(a.trim().to_string()))
            })
            .collect::<Result<Vec<i32>, _>>()?;

        if angles.len() != NUM_JOINTS {
            return Err(TcParseError::WrongArgCount {
                cmd: String::from("pose"),
                expected: NUM_JOINTS,
                found: angles.len(),
            });
        }

        let mut pose = JointPose::default();
        for (joint, angle) in JOINT_IDS.iter().zip(angles) {
            pose.set(*joint, angle);
        }

        Ok(pose)
    }
}

impl ArmStatus {
    /// Build the status from the value of a busy flag.
    pub fn from_busy(busy: bool) -> Self {
        if busy {
            ArmStatus::Busy
        } else {
            ArmStatus::Idle
        }
    }

    /// The single status byte sent to notifying command sources, `1` when busy and `0` when idle.
    pub fn as_byte(self) -> u8 {
        match self {
            ArmStatus::Idle => 0,
            ArmStatus::Busy => 1,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
