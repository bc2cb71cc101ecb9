//! Interpolator implementation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::{Deserialize, Serialize};

// Internal
use super::{InterpError, Params};
use crate::pose::{CalibError, CalibSet};
use comms_if::eqpt::arm::{JointId, JointPose, JOINT_IDS};
use util::maths::lerp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Maps workspace coordinates onto joint poses.
///
/// The interpolator holds a copy of the calibration set it was built with,
/// replace it with [`Interpolator::set_calib`] when the approach direction or
/// workspace changes.
#[derive(Debug, Clone)]
pub struct Interpolator {
    calib: CalibSet,
    strategy: InterpStrategy,
    shoulder_offset_deg: i32,
    elbow_offset_deg: i32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The method used to interpolate along the x axis.
///
/// All strategies blend linearly between the bottom and top rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpStrategy {
    /// Linear between the corners only.
    Bilinear,

    /// Piecewise linear through the edge midpoints.
    SixPointLinear,

    /// Quadratic through the corners and the edge midpoints.
    SixPointBiquadratic,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl InterpStrategy {
    /// True if the strategy uses the edge midpoint anchors.
    pub fn needs_middles(self) -> bool {
        !matches!(self, InterpStrategy::Bilinear)
    }
}

impl Interpolator {
    /// Create a new interpolator over the given calibration set.
    pub fn new(calib: CalibSet, params: &Params) -> Result<Self, InterpError> {
        check_strategy(&calib, params.strategy)?;

        Ok(Self {
            calib,
            strategy: params.strategy,
            shoulder_offset_deg: params.shoulder_offset_deg,
            elbow_offset_deg: params.elbow_offset_deg,
        })
    }

    /// Replace the calibration set.
    ///
    /// On error the previous calibration is kept.
    pub fn set_calib(&mut self, calib: CalibSet) -> Result<(), InterpError> {
        check_strategy(&calib, self.strategy)?;
        self.calib = calib;
        Ok(())
    }

    pub fn calib(&self) -> &CalibSet {
        &self.calib
    }

    pub fn strategy(&self) -> InterpStrategy {
        self.strategy
    }

    /// Compute the pose which reaches the given workspace coordinate.
    ///
    /// Coordinates outside the calibrated area are clamped onto its edge.
    /// Only the shoulder and elbow are clamped to their legal ranges, the
    /// other joints are returned as interpolated.
    pub fn pose_from_coord(&self, x: f64, y: f64) -> JointPose {
        let (nx, ny) = self.calib.bbox().normalise(x, y);

        let mut pose = JointPose::default();
        for joint in JOINT_IDS.iter() {
            pose.set(*joint, self.interp_joint(*joint, nx, ny));
        }

        pose.shoulder = JointId::Shoulder
            .clamp_angle(pose.shoulder + self.shoulder_offset_deg);
        pose.elbow = JointId::Elbow.clamp_angle(pose.elbow + self.elbow_offset_deg);

        trace!(
            "({:.1}, {:.1}) -> norm ({:.3}, {:.3}) -> {}",
            x, y, nx, ny, pose
        );

        pose
    }

    fn interp_joint(&self, joint: JointId, nx: f64, ny: f64) -> i32 {
        let c = &self.calib;
        let val = |p: &JointPose| p.get(joint) as f64;

        let (bottom, top) = match (self.strategy, c.middles) {
            (InterpStrategy::SixPointLinear, Some((bm, tm))) => (
                piecewise(
                    val(&c.bottom_left.pose),
                    val(&bm.pose),
                    val(&c.bottom_right.pose),
                    nx,
                ),
                piecewise(
                    val(&c.top_left.pose),
                    val(&tm.pose),
                    val(&c.top_right.pose),
                    nx,
                ),
            ),
            (InterpStrategy::SixPointBiquadratic, Some((bm, tm))) => (
                quadratic(
                    val(&c.bottom_left.pose),
                    val(&bm.pose),
                    val(&c.bottom_right.pose),
                    nx,
                ),
                quadratic(
                    val(&c.top_left.pose),
                    val(&tm.pose),
                    val(&c.top_right.pose),
                    nx,
                ),
            ),
            // Construction guarantees the middles exist for six point
            // strategies, so only bilinear reaches here.
            _ => (
                lerp(val(&c.bottom_left.pose), val(&c.bottom_right.pose), nx),
                lerp(val(&c.top_left.pose), val(&c.top_right.pose), nx),
            ),
        };

        // f64::round rounds halves away from zero
        lerp(bottom, top, ny).round() as i32
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_strategy(
    calib: &CalibSet,
    strategy: InterpStrategy,
) -> Result<(), CalibError> {
    if strategy.needs_middles() && !calib.has_middles() {
        return Err(CalibError::InvalidCalibration(format!(
            "{:?} interpolation needs the bottom and top middle anchors",
            strategy
        )));
    }
    Ok(())
}

/// Linear between left and middle on `[0, 0.5]`, between middle and right on
/// `(0.5, 1]`.
fn piecewise(left: f64, middle: f64, right: f64, nx: f64) -> f64 {
    if nx <= 0.5 {
        lerp(left, middle, 2.0 * nx)
    } else {
        lerp(middle, right, 2.0 * (nx - 0.5))
    }
}

/// Quadratic through `(0, left)`, `(0.5, middle)` and `(1, right)`.
fn quadratic(left: f64, middle: f64, right: f64, nx: f64) -> f64 {
    let a = 2.0 * left - 4.0 * middle + 2.0 * right;
    let b = -3.0 * left + 4.0 * middle - right;
    let c = left;

    a * nx * nx + b * nx + c
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
