//! Implementation of the transport sequencer

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace, warn};
use serde::Serialize;
use std::fmt;

// Internal
use super::{Params, TransportSeqError};
use crate::interp::Interpolator;
use crate::motion_ctrl::{MotionCtrl, MotionCtrlError, MoveOptions, MoveReport};
use crate::pose::{ObjectTargetTable, Point2D};
use comms_if::eqpt::arm::{JointId, JointPose};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The transport sequencer.
#[derive(Debug, Clone, Default)]
pub struct TransportSeq {
    params: Params,

    /// Options applied to every move in the sequence.
    options: MoveOptions,
}

/// Report of a completed transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SeqReport {
    pub object_id: u8,

    pub pick: Point2D,

    /// Every completed move in order, tagged with the phase it belongs to.
    pub moves: Vec<(Phase, MoveReport)>,

    /// Total number of motion ticks over the whole sequence.
    pub ticks: u32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Phases of the transport sequence, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    ApproachPickup,
    Grasp,
    LiftWithObject,
    RotateToTarget,
    DescendToTarget,
    Release,
    RetreatToTransition,
    ResetWristRotation,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Intermediate values used to ramp a joint from `start` to `target` in
/// `steps` moves.
///
/// Each value is `start + ((target - start) / steps) * i` with truncating
/// division, except the last which is exactly `target`.
pub fn ramp_values(start: i32, target: i32, steps: u32) -> Vec<i32> {
    let steps = steps.max(1) as i32;
    let inc = (target - start) / steps;

    (1..=steps)
        .map(|i| if i == steps { target } else { start + inc * i })
        .collect()
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TransportSeq {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            options: MoveOptions::default(),
        }
    }

    /// Set the cancellation and timeout options used by every move.
    pub fn set_options(&mut self, options: MoveOptions) {
        self.options = options;
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Pick the object at `pick` and place it at the drop-off pose of its
    /// class.
    ///
    /// The pick coordinate and object id are checked before anything moves.
    /// Once started the sequence runs to completion, unless a move is
    /// cancelled or times out in which case the arm is left where it stopped
    /// and the moves completed so far are returned in the error.
    pub fn run(
        &self,
        motion: &mut MotionCtrl,
        interp: &Interpolator,
        targets: &ObjectTargetTable,
        transition: &JointPose,
        pick: Point2D,
        object_id: u8,
    ) -> Result<SeqReport, TransportSeqError> {
        if !pick.x.is_finite() || !pick.y.is_finite() {
            return Err(TransportSeqError::InvalidPick {
                x: pick.x,
                y: pick.y,
            });
        }

        let target = *targets
            .get(object_id)
            .ok_or(TransportSeqError::UnknownObject(object_id))?;

        let mut report = SeqReport {
            object_id,
            pick,
            moves: Vec::new(),
            ticks: 0,
        };

        match self.run_phases(motion, interp, transition, &target, &mut report) {
            Ok(()) => {
                debug!(
                    "Transport of object {} complete in {} ticks",
                    object_id, report.ticks
                );
                Ok(report)
            }
            Err(e) => {
                warn!(
                    "Transport of object {} aborted after {} moves: {}",
                    object_id,
                    report.moves.len(),
                    e
                );
                Err(TransportSeqError::Motion {
                    source: e,
                    partial: Box::new(report),
                })
            }
        }
    }

    fn run_phases(
        &self,
        motion: &mut MotionCtrl,
        interp: &Interpolator,
        transition: &JointPose,
        target: &JointPose,
        report: &mut SeqReport,
    ) -> Result<(), MotionCtrlError> {
        let p = &self.params;
        let pick = report.pick;

        // ---- APPROACH PICKUP ----
        let mut pickup = interp
            .pose_from_coord(pick.x, pick.y)
            .with_gripper(p.gripper_open)
            .with_wrist_rotation(p.wrist_rot_pickup_deg);
        pickup.shoulder = JointId::Shoulder
            .clamp_angle(pickup.shoulder + p.shoulder_pickup_offset_deg);
        pickup.elbow = JointId::Elbow
            .clamp_angle(pickup.elbow + p.elbow_pickup_offset_deg);

        debug!(
            "Transporting object {} from ({:.1}, {:.1}), pickup {}, drop-off {}",
            report.object_id, pick.x, pick.y, pickup, target
        );

        let approach = transition
            .with_base(pickup.base)
            .with_gripper(p.gripper_open);
        self.phase_move(motion, report, Phase::ApproachPickup, approach)?;
        self.ramp_wrist(
            motion,
            report,
            Phase::ApproachPickup,
            approach,
            pickup.wrist_rotation,
        )?;
        self.phase_move(motion, report, Phase::ApproachPickup, pickup)?;

        // ---- GRASP ----
        let grasp = pickup.with_gripper(p.gripper_closed);
        self.phase_move(motion, report, Phase::Grasp, grasp)?;

        // ---- LIFT ----
        let lift = transition
            .with_base(pickup.base)
            .with_gripper(p.gripper_closed)
            .with_wrist_rotation(p.wrist_rot_transport_deg);
        self.phase_move(motion, report, Phase::LiftWithObject, lift)?;

        // ---- ROTATE ----
        let rotate = lift.with_base(target.base);
        self.phase_move(motion, report, Phase::RotateToTarget, rotate)?;

        // ---- DESCEND ----
        let descend = target
            .with_gripper(p.gripper_closed)
            .with_wrist_rotation(p.wrist_rot_transport_deg);
        self.phase_move(motion, report, Phase::DescendToTarget, descend)?;

        // ---- RELEASE ----
        let release = descend.with_gripper(p.gripper_open);
        self.phase_move(motion, report, Phase::Release, release)?;

        // ---- RETREAT ----
        let retreat = transition
            .with_base(target.base)
            .with_wrist_rotation(p.wrist_rot_transport_deg)
            .with_gripper(p.gripper_open);
        self.phase_move(motion, report, Phase::RetreatToTransition, retreat)?;

        // ---- RESET WRIST ----
        self.ramp_wrist(
            motion,
            report,
            Phase::ResetWristRotation,
            retreat,
            transition.wrist_rotation,
        )
    }

    /// Move to the pose then settle.
    fn phase_move(
        &self,
        motion: &mut MotionCtrl,
        report: &mut SeqReport,
        phase: Phase,
        pose: JointPose,
    ) -> Result<(), MotionCtrlError> {
        trace!("{}: {}", phase, pose);

        let move_report =
            motion.move_with(self.params.move_step_delay_ms, &pose, &self.options)?;

        report.ticks += move_report.ticks;
        report.moves.push((phase, move_report));

        motion.settle(self.params.settle_ms);

        Ok(())
    }

    /// Rotate the wrist from its angle in `from` to `wrist_rot_deg` in equal
    /// steps, keeping every other joint as in `from`.
    fn ramp_wrist(
        &self,
        motion: &mut MotionCtrl,
        report: &mut SeqReport,
        phase: Phase,
        from: JointPose,
        wrist_rot_deg: i32,
    ) -> Result<(), MotionCtrlError> {
        let values =
            ramp_values(from.wrist_rotation, wrist_rot_deg, self.params.ramp_steps);

        for v in values {
            self.phase_move(motion, report, phase, from.with_wrist_rotation(v))?;
        }

        Ok(())
    }
}

impl SeqReport {
    /// The commanded targets of a single phase.
    pub fn phase_moves(&self, phase: Phase) -> Vec<JointPose> {
        self.moves
            .iter()
            .filter(|(p, _)| *p == phase)
            .map(|(_, m)| m.target)
            .collect()
    }

    /// The final commanded target, if any move completed.
    pub fn last_target(&self) -> Option<JointPose> {
        self.moves.last().map(|(_, m)| m.target)
    }

    /// True if any input to any move of the sequence was clamped.
    pub fn any_clamped(&self) -> bool {
        self.moves.iter().any(|(_, m)| m.any_clamped())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::interp;
    use crate::motion_ctrl::{self, recording_bank, CancelToken, VirtualClock, WriteLog};
    use crate::motion_ctrl::{bank_from_fn, ActuatorPort};
    use crate::pose::{self, ApproachDirection};

    const REST: JointPose = JointPose::new(90, 90, 90, 90, 90, 40);

    struct Fixture {
        motion: MotionCtrl,
        log: WriteLog,
        interp: Interpolator,
        targets: ObjectTargetTable,
        transition: JointPose,
    }

    fn fixture() -> Fixture {
        let p = pose::Params::default();
        let (bank, log) = recording_bank();
        let motion = MotionCtrl::new(
            motion_ctrl::Params::default(),
            bank,
            Box::new(VirtualClock::new()),
            REST,
        );
        let calib = pose::calib_for_direction(
            &p,
            &p.workspace,
            ApproachDirection::from_base_angle(REST.base),
        )
        .unwrap();

        Fixture {
            motion,
            log,
            interp: Interpolator::new(calib, &interp::Params::default()).unwrap(),
            targets: ObjectTargetTable::new(&p.objects).unwrap(),
            transition: p.transition_pose,
        }
    }

    fn run(seq: &TransportSeq, f: &mut Fixture, x: f64, y: f64, id: u8)
        -> Result<SeqReport, TransportSeqError>
    {
        seq.run(
            &mut f.motion,
            &f.interp,
            &f.targets,
            &f.transition,
            Point2D::new(x, y),
            id,
        )
    }

    #[test]
    fn test_ramp_values() {
        assert_eq!(ramp_values(110, 30, 3), vec![84, 58, 30]);
        assert_eq!(ramp_values(130, 110, 3), vec![124, 118, 110]);
        assert_eq!(ramp_values(10, 11, 3), vec![10, 10, 11]);
        assert_eq!(ramp_values(10, 50, 1), vec![50]);
        assert_eq!(ramp_values(10, 50, 0), vec![50]);
    }

    #[test]
    fn test_transport_end_state() {
        let seq = TransportSeq::default();
        let mut f = fixture();

        let report = run(&seq, &mut f, 645.0, 286.0, 1).unwrap();
        let end = f.motion.current_pose();

        assert_eq!(end.gripper, seq.params().gripper_open);
        assert_eq!(end.wrist_rotation, f.transition.wrist_rotation);
        assert_eq!(end.base, f.targets.get(1).unwrap().base);
        assert_eq!(report.last_target(), Some(end));
        assert!(report.ticks > 0);
    }

    #[test]
    fn test_transport_phases() {
        let seq = TransportSeq::default();
        let mut f = fixture();

        let report = run(&seq, &mut f, 0.0, 0.0, 4).unwrap();

        // Approach, three ramp steps, pickup
        let approach = report.phase_moves(Phase::ApproachPickup);
        assert_eq!(approach.len(), 5);
        assert_eq!(approach[0], f.transition.with_base(approach[4].base));
        assert_eq!(
            approach[1..4].iter().map(|p| p.wrist_rotation).collect::<Vec<_>>(),
            vec![84, 58, 30]
        );

        // Pickup is the bottom left anchor pushed down by the pickup offsets
        let bl = f.interp.calib().bottom_left.pose;
        assert_eq!(
            approach[4],
            JointPose::new(bl.base, bl.shoulder + 10, bl.elbow + 10, bl.wrist_vertical, 30, 10)
        );

        let grasp = report.phase_moves(Phase::Grasp);
        assert_eq!(grasp, vec![approach[4].with_gripper(70)]);

        let rotate = report.phase_moves(Phase::RotateToTarget);
        assert_eq!(
            rotate,
            vec![JointPose::new(0, 100, 165, 90, 130, 70)]
        );

        let release = report.phase_moves(Phase::Release);
        assert_eq!(release, vec![JointPose::new(0, 130, 130, 160, 130, 10)]);

        let reset = report.phase_moves(Phase::ResetWristRotation);
        assert_eq!(
            reset.iter().map(|p| p.wrist_rotation).collect::<Vec<_>>(),
            vec![124, 118, 110]
        );

        // Phases appear in order
        let order: Vec<Phase> = report.moves.iter().map(|m| m.0).collect();
        let mut sorted = order.clone();
        sorted.sort_by_key(|p| *p as u8);
        assert_eq!(order, sorted);
    }

    #[test]
    fn test_transport_deterministic() {
        let seq = TransportSeq::default();

        let mut a = fixture();
        let mut b = fixture();
        let ra = run(&seq, &mut a, 300.0, 120.0, 5).unwrap();
        let rb = run(&seq, &mut b, 300.0, 120.0, 5).unwrap();

        assert_eq!(ra, rb);
        assert_eq!(*a.log.lock().unwrap(), *b.log.lock().unwrap());
    }

    #[test]
    fn test_unknown_object() {
        let seq = TransportSeq::default();
        let mut f = fixture();

        let res = run(&seq, &mut f, 100.0, 100.0, 9);

        assert!(matches!(res, Err(TransportSeqError::UnknownObject(9))));
        assert!(f.log.lock().unwrap().is_empty());
        assert_eq!(f.motion.current_pose(), REST);
    }

    #[test]
    fn test_non_finite_pick_rejected() {
        let seq = TransportSeq::default();
        let mut f = fixture();

        for (x, y) in [(f64::NAN, 286.0), (645.0, f64::INFINITY)].iter() {
            let res = run(&seq, &mut f, *x, *y, 1);
            assert!(matches!(res, Err(TransportSeqError::InvalidPick { .. })));
        }

        assert!(f.log.lock().unwrap().is_empty());
        assert_eq!(f.motion.current_pose(), REST);
    }

    #[test]
    fn test_cancelled_transport() {
        let token = CancelToken::new();
        token.cancel();

        let mut seq = TransportSeq::new(Params::default());
        seq.set_options(MoveOptions {
            cancel: Some(token),
            timeout: None,
        });
        let mut f = fixture();

        match run(&seq, &mut f, 100.0, 100.0, 2) {
            Err(TransportSeqError::Motion { source, partial }) => {
                assert_eq!(source, MotionCtrlError::Cancelled { ticks: 0 });
                assert!(partial.moves.is_empty());
                assert_eq!(partial.object_id, 2);
            }
            r => panic!("Expected an aborted transport, got {:?}", r),
        }
    }

    /// Cancels the token when commanded to a given angle.
    struct TripPort {
        at: i32,
        token: CancelToken,
    }

    struct NullPort;

    impl ActuatorPort for TripPort {
        fn set_angle(&mut self, angle_deg: i32) {
            if angle_deg == self.at {
                self.token.cancel();
            }
        }
    }

    impl ActuatorPort for NullPort {
        fn set_angle(&mut self, _angle_deg: i32) {}
    }

    #[test]
    fn test_aborted_transport_keeps_completed_moves() {
        let token = CancelToken::new();

        let mut seq = TransportSeq::new(Params::default());
        seq.set_options(MoveOptions {
            cancel: Some(token.clone()),
            timeout: None,
        });

        // Trip while the gripper closes on the object
        let mut f = fixture();
        let bank = bank_from_fn(|joint| {
            let port: Box<dyn ActuatorPort + Send> = if joint == JointId::Gripper {
                Box::new(TripPort {
                    at: 60,
                    token: token.clone(),
                })
            } else {
                Box::new(NullPort)
            };
            port
        });
        f.motion = MotionCtrl::new(
            motion_ctrl::Params::default(),
            bank,
            Box::new(VirtualClock::new()),
            REST,
        );

        let partial = match run(&seq, &mut f, 645.0, 286.0, 1) {
            Err(TransportSeqError::Motion { partial, .. }) => partial,
            r => panic!("Expected an aborted transport, got {:?}", r),
        };

        // Approach, three ramp steps and the pickup completed, the grasp did not
        assert_eq!(partial.moves.len(), 5);
        assert!(partial.moves.iter().all(|(p, _)| *p == Phase::ApproachPickup));
        assert_eq!(
            partial.ticks,
            partial.moves.iter().map(|(_, m)| m.ticks).sum::<u32>()
        );
        assert_eq!(f.motion.current_pose().gripper, 61);
    }

    #[test]
    fn test_clamped_moves_reported() {
        let seq = TransportSeq::new(Params {
            gripper_closed: 80,
            move_step_delay_ms: 5,
            ..Params::default()
        });
        let mut f = fixture();

        let report = run(&seq, &mut f, 645.0, 286.0, 1).unwrap();

        assert!(report.any_clamped());
        let (_, grasp) = report
            .moves
            .iter()
            .find(|(p, _)| *p == Phase::Grasp)
            .unwrap();
        assert_eq!(grasp.target.gripper, 73);
        assert!(grasp.clamped[JointId::Gripper.index()]);
        assert!(grasp.step_delay_clamped);
        assert_eq!(grasp.step_delay_ms, 10);
    }
}
