//! Calibration anchors and the direction dependent calibration sets

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::{CalibError, Params};
use comms_if::eqpt::arm::JointPose;
use util::maths;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point in the pick workspace.
///
/// Units: image pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

/// A calibrated pairing of a workspace point with the pose that reaches it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibAnchor {
    pub point: Point2D,
    pub pose: JointPose,
}

/// Size of the pick workspace. The calibration anchors sit on the corners and
/// edge midpoints of the rectangle `(0, 0)..(width, height)`.
///
/// Units: image pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub width: f64,
    pub height: f64,
}

/// Calibrated poses for each anchor position, for one approach direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoses {
    pub bottom_left: JointPose,
    pub bottom_right: JointPose,
    pub top_left: JointPose,
    pub top_right: JointPose,

    /// Optional bottom edge midpoint, must be given together with
    /// `top_middle`.
    #[serde(default)]
    pub bottom_middle: Option<JointPose>,

    /// Optional top edge midpoint, must be given together with
    /// `bottom_middle`.
    #[serde(default)]
    pub top_middle: Option<JointPose>,
}

/// Axis aligned bounding box of a set of anchors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// A validated set of 4 or 6 calibration anchors.
///
/// A set can only be built with a non-degenerate bounding box, so
/// normalising a coordinate against it can never divide by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibSet {
    pub bottom_left: CalibAnchor,
    pub bottom_right: CalibAnchor,
    pub top_left: CalibAnchor,
    pub top_right: CalibAnchor,

    /// Bottom and top edge midpoints, if configured.
    pub middles: Option<(CalibAnchor, CalibAnchor)>,

    bbox: BoundingBox,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Direction in which the arm sweeps over the workspace.
///
/// The base servo has some backlash, so the base angle needed to reach a
/// given anchor depends on which side the arm comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApproachDirection {
    LeftToRight,
    RightToLeft,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the calibration set for the given approach direction.
pub fn calib_for_direction(
    params: &Params,
    workspace: &Workspace,
    direction: ApproachDirection,
) -> Result<CalibSet, CalibError> {
    let poses = match direction {
        ApproachDirection::LeftToRight => &params.left_to_right,
        ApproachDirection::RightToLeft => &params.right_to_left,
    };

    CalibSet::from_workspace(workspace, poses)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl CalibAnchor {
    pub fn new(x: f64, y: f64, pose: JointPose) -> Self {
        Self {
            point: Point2D::new(x, y),
            pose,
        }
    }
}

impl Workspace {
    /// Check the workspace describes a real rectangle.
    pub fn validate(&self) -> Result<(), CalibError> {
        if !(self.width.is_finite() && self.height.is_finite()) {
            return Err(CalibError::InvalidCalibration(format!(
                "workspace size must be finite, found {} x {}",
                self.width, self.height
            )));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(CalibError::InvalidCalibration(format!(
                "workspace size must be positive, found {} x {}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl ApproachDirection {
    /// Direction the arm will approach the workspace from, given the base
    /// angle it finished the previous operation at.
    pub fn from_base_angle(base_deg: i32) -> Self {
        if base_deg < 90 {
            ApproachDirection::LeftToRight
        } else {
            ApproachDirection::RightToLeft
        }
    }
}

impl BoundingBox {
    /// Normalise a point into `[0, 1] x [0, 1]` relative to the box.
    ///
    /// Points outside the box are clamped onto its edge.
    pub fn normalise(&self, x: f64, y: f64) -> (f64, f64) {
        (
            maths::norm_in_range(x, self.min_x, self.max_x).unwrap_or(0.0),
            maths::norm_in_range(y, self.min_y, self.max_y).unwrap_or(0.0),
        )
    }
}

impl CalibSet {
    /// Build a four anchor (corners only) calibration set.
    pub fn four(
        bottom_left: CalibAnchor,
        bottom_right: CalibAnchor,
        top_left: CalibAnchor,
        top_right: CalibAnchor,
    ) -> Result<Self, CalibError> {
        Self::build(bottom_left, bottom_right, top_left, top_right, None)
    }

    /// Build a six anchor (corners and edge midpoints) calibration set.
    pub fn six(
        bottom_left: CalibAnchor,
        bottom_middle: CalibAnchor,
        bottom_right: CalibAnchor,
        top_left: CalibAnchor,
        top_middle: CalibAnchor,
        top_right: CalibAnchor,
    ) -> Result<Self, CalibError> {
        Self::build(
            bottom_left,
            bottom_right,
            top_left,
            top_right,
            Some((bottom_middle, top_middle)),
        )
    }

    /// Build a calibration set for a workspace from the anchor poses of one
    /// approach direction.
    pub fn from_workspace(
        workspace: &Workspace,
        poses: &AnchorPoses,
    ) -> Result<Self, CalibError> {
        workspace.validate()?;

        let (w, h) = (workspace.width, workspace.height);

        let bl = CalibAnchor::new(0.0, 0.0, poses.bottom_left);
        let br = CalibAnchor::new(w, 0.0, poses.bottom_right);
        let tl = CalibAnchor::new(0.0, h, poses.top_left);
        let tr = CalibAnchor::new(w, h, poses.top_right);

        match (poses.bottom_middle, poses.top_middle) {
            (Some(bm), Some(tm)) => Self::six(
                bl,
                CalibAnchor::new(w / 2.0, 0.0, bm),
                br,
                tl,
                CalibAnchor::new(w / 2.0, h, tm),
                tr,
            ),
            (None, None) => Self::four(bl, br, tl, tr),
            _ => Err(CalibError::InvalidCalibration(String::from(
                "bottom_middle and top_middle must be given together",
            ))),
        }
    }

    fn build(
        bottom_left: CalibAnchor,
        bottom_right: CalibAnchor,
        top_left: CalibAnchor,
        top_right: CalibAnchor,
        middles: Option<(CalibAnchor, CalibAnchor)>,
    ) -> Result<Self, CalibError> {
        let mut points = vec![
            bottom_left.point,
            bottom_right.point,
            top_left.point,
            top_right.point,
        ];
        if let Some((bm, tm)) = middles {
            points.push(bm.point);
            points.push(tm.point);
        }

        if points.iter().any(|p| !(p.x.is_finite() && p.y.is_finite())) {
            return Err(CalibError::InvalidCalibration(String::from(
                "anchor coordinates must be finite",
            )));
        }

        let bbox = BoundingBox {
            min_x: points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min),
            max_x: points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max),
            min_y: points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min),
            max_y: points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max),
        };

        if bbox.max_x <= bbox.min_x || bbox.max_y <= bbox.min_y {
            return Err(CalibError::InvalidCalibration(format!(
                "anchors span a degenerate box x: [{}, {}], y: [{}, {}]",
                bbox.min_x, bbox.max_x, bbox.min_y, bbox.max_y
            )));
        }

        Ok(Self {
            bottom_left,
            bottom_right,
            top_left,
            top_right,
            middles,
            bbox,
        })
    }

    /// The bounding box of all anchors in the set.
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    /// True if the set includes the edge midpoints.
    pub fn has_middles(&self) -> bool {
        self.middles.is_some()
    }

    /// All anchors in the set.
    pub fn anchors(&self) -> Vec<CalibAnchor> {
        let mut anchors = vec![
            self.bottom_left,
            self.bottom_right,
            self.top_left,
            self.top_right,
        ];
        if let Some((bm, tm)) = self.middles {
            anchors.push(bm);
            anchors.push(tm);
        }
        anchors
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn pose(b: i32) -> JointPose {
        JointPose::new(b, 120, 140, 160, 10, 10)
    }

    #[test]
    fn test_degenerate_box_rejected() {
        // All anchors on one vertical line
        let res = CalibSet::four(
            CalibAnchor::new(0.0, 0.0, pose(60)),
            CalibAnchor::new(0.0, 0.0, pose(110)),
            CalibAnchor::new(0.0, 572.0, pose(70)),
            CalibAnchor::new(0.0, 572.0, pose(110)),
        );
        assert!(matches!(res, Err(CalibError::InvalidCalibration(_))));

        // All anchors on one horizontal line
        let res = CalibSet::four(
            CalibAnchor::new(0.0, 5.0, pose(60)),
            CalibAnchor::new(1290.0, 5.0, pose(110)),
            CalibAnchor::new(0.0, 5.0, pose(70)),
            CalibAnchor::new(1290.0, 5.0, pose(110)),
        );
        assert!(matches!(res, Err(CalibError::InvalidCalibration(_))));
    }

    #[test]
    fn test_workspace_validation() {
        let params = Params::default();
        for (w, h) in [(0.0, 572.0), (1290.0, -1.0), (f64::NAN, 10.0)].iter() {
            let ws = Workspace {
                width: *w,
                height: *h,
            };
            assert!(matches!(
                calib_for_direction(&params, &ws, ApproachDirection::LeftToRight),
                Err(CalibError::InvalidCalibration(_))
            ));
        }
    }

    #[test]
    fn test_unpaired_middle_rejected() {
        let mut poses = Params::default().left_to_right;
        poses.top_middle = None;

        let res = CalibSet::from_workspace(&Params::default().workspace, &poses);
        assert!(matches!(res, Err(CalibError::InvalidCalibration(_))));
    }

    #[test]
    fn test_calib_for_direction() {
        let params = Params::default();

        let ltr = calib_for_direction(
            &params,
            &params.workspace,
            ApproachDirection::LeftToRight,
        )
        .unwrap();
        let rtl = calib_for_direction(
            &params,
            &params.workspace,
            ApproachDirection::RightToLeft,
        )
        .unwrap();

        // Same geometry, different base angles
        assert_eq!(ltr.bbox(), rtl.bbox());
        assert_eq!(ltr.bottom_left.pose, params.left_to_right.bottom_left);
        assert_eq!(rtl.bottom_left.pose, params.right_to_left.bottom_left);
        assert_ne!(ltr.bottom_left.pose.base, rtl.bottom_left.pose.base);

        // Anchor coordinates follow the workspace
        assert_eq!(ltr.top_right.point, Point2D::new(1290.0, 572.0));
        let (bm, tm) = ltr.middles.unwrap();
        assert_eq!(bm.point, Point2D::new(645.0, 0.0));
        assert_eq!(tm.point, Point2D::new(645.0, 572.0));
        assert_eq!(ltr.anchors().len(), 6);
    }

    #[test]
    fn test_from_base_angle() {
        assert_eq!(
            ApproachDirection::from_base_angle(0),
            ApproachDirection::LeftToRight
        );
        assert_eq!(
            ApproachDirection::from_base_angle(89),
            ApproachDirection::LeftToRight
        );
        assert_eq!(
            ApproachDirection::from_base_angle(90),
            ApproachDirection::RightToLeft
        );
        assert_eq!(
            ApproachDirection::from_base_angle(180),
            ApproachDirection::RightToLeft
        );
    }

    #[test]
    fn test_normalise_is_bounded() {
        let params = Params::default();
        let set = calib_for_direction(
            &params,
            &params.workspace,
            ApproachDirection::RightToLeft,
        )
        .unwrap();

        let coords = [
            (-1000.0, -1000.0),
            (0.0, 0.0),
            (645.0, 286.0),
            (1290.0, 572.0),
            (99999.0, 3.0),
            (3.0, 99999.0),
            (f64::NAN, 286.0),
            (645.0, f64::NAN),
            (f64::INFINITY, f64::NEG_INFINITY),
        ];
        for (x, y) in coords.iter() {
            let (nx, ny) = set.bbox().normalise(*x, *y);
            assert!((0.0..=1.0).contains(&nx), "nx = {} for x = {}", nx, x);
            assert!((0.0..=1.0).contains(&ny), "ny = {} for y = {}", ny, y);
        }

        assert_eq!(set.bbox().normalise(645.0, 286.0), (0.5, 0.5));
        assert_eq!(set.bbox().normalise(f64::NAN, 286.0), (0.0, 0.5));
    }
}
