//! Implementation of the motion controller

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{trace, warn};
use serde::Serialize;
use std::time::Duration;

// Internal
use super::{ActuatorBank, CancelToken, Clock, MotionCtrlError, Params};
use comms_if::eqpt::arm::{JointPose, JOINT_IDS, NUM_JOINTS};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Channel index of the wrist vertical actuator.
const WRIST_VERT_CHANNEL: usize = 3;

/// Channel index of the wrist rotation actuator.
const WRIST_ROT_CHANNEL: usize = 4;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The motion controller.
///
/// Owns the actuator ports and the tracked angle of each actuator channel.
pub struct MotionCtrl {
    params: Params,

    ports: ActuatorBank,

    clock: Box<dyn Clock + Send>,

    /// Currently commanded angles, indexed by actuator channel.
    state: [i32; NUM_JOINTS],

    /// Number of clamped inputs (joint fields and step delays) seen so far.
    clamp_count: u64,
}

/// Optional controls on a single move.
#[derive(Debug, Clone, Default)]
pub struct MoveOptions {
    /// Abort the move if this token is cancelled.
    pub cancel: Option<CancelToken>,

    /// Abort the move if it takes longer than this on the controller's
    /// clock.
    pub timeout: Option<Duration>,
}

/// Report of a completed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveReport {
    /// The target actually moved to, after clamping.
    pub target: JointPose,

    /// Number of ticks taken.
    pub ticks: u32,

    /// The step delay actually used.
    ///
    /// Units: milliseconds
    pub step_delay_ms: u64,

    /// Which fields of the requested target were outside their legal range,
    /// in pose field order.
    pub clamped: [bool; NUM_JOINTS],

    /// True if the requested step delay was outside the allowed range.
    pub step_delay_clamped: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MotionCtrl {
    /// Create a new controller.
    ///
    /// `initial_pose` is the pose the arm is physically in, it is clamped and
    /// taken as the tracked state without being commanded.
    pub fn new(
        params: Params,
        ports: ActuatorBank,
        clock: Box<dyn Clock + Send>,
        initial_pose: JointPose,
    ) -> Self {
        let mut ctrl = Self {
            params,
            ports,
            clock,
            state: [0; NUM_JOINTS],
            clamp_count: 0,
        };
        ctrl.state = ctrl.to_channels(&initial_pose.clamped());
        ctrl
    }

    /// Move to the target pose, blocking until it is reached.
    ///
    /// Out of range targets and step delays are clamped and reported, this
    /// never fails.
    pub fn move_to(&mut self, step_delay_ms: u64, target: &JointPose) -> MoveReport {
        let (target, clamped, step_delay_ms, step_delay_clamped) =
            self.clamp_inputs(step_delay_ms, target);

        let ticks = self.run(target, step_delay_ms, None);

        MoveReport {
            target,
            ticks,
            step_delay_ms,
            clamped,
            step_delay_clamped,
        }
    }

    /// Move to the target pose with optional cancellation and timeout.
    ///
    /// Both are checked before each tick. On abort the tracked state is left
    /// where the last tick put it.
    pub fn move_with(
        &mut self,
        step_delay_ms: u64,
        target: &JointPose,
        options: &MoveOptions,
    ) -> Result<MoveReport, MotionCtrlError> {
        let (target, clamped, step_delay_ms, step_delay_clamped) =
            self.clamp_inputs(step_delay_ms, target);

        let deadline = options.timeout.map(|t| self.clock.now() + t);
        let mut ticks = 0;

        while self.state != self.to_channels(&target) {
            if let Some(ref c) = options.cancel {
                if c.is_cancelled() {
                    return Err(MotionCtrlError::Cancelled { ticks });
                }
            }
            if let Some(d) = deadline {
                if self.clock.now() >= d {
                    return Err(MotionCtrlError::TimedOut { ticks });
                }
            }

            ticks += self.run(target, step_delay_ms, Some(1));
        }

        Ok(MoveReport {
            target,
            ticks,
            step_delay_ms,
            clamped,
            step_delay_clamped,
        })
    }

    /// Run a single tick towards the target without waiting.
    ///
    /// The target is clamped silently. Returns true if any joint moved.
    pub fn step(&mut self, target: &JointPose) -> bool {
        let target = self.to_channels(&target.clamped());
        self.tick(&target)
    }

    /// Pause for the given time on the controller's clock.
    pub fn settle(&self, ms: u64) {
        self.clock.sleep(Duration::from_millis(ms));
    }

    /// Time on the controller's clock.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Number of clamped inputs seen since the controller was created.
    pub fn clamp_count(&self) -> u64 {
        self.clamp_count
    }

    /// The tracked state in pose field space.
    pub(crate) fn current_pose(&self) -> JointPose {
        self.from_channels(&self.state)
    }

    /// Tick towards the target, sleeping after each tick, until it is reached
    /// or `max_ticks` ticks have run.
    fn run(
        &mut self,
        target: JointPose,
        step_delay_ms: u64,
        max_ticks: Option<u32>,
    ) -> u32 {
        let target = self.to_channels(&target);
        let delay = Duration::from_millis(step_delay_ms);
        let mut ticks = 0;

        loop {
            if self.state == target {
                break;
            }
            if let Some(m) = max_ticks {
                if ticks >= m {
                    break;
                }
            }

            self.tick(&target);
            ticks += 1;
            self.clock.sleep(delay);
        }

        ticks
    }

    fn tick(&mut self, target: &[i32; NUM_JOINTS]) -> bool {
        let mut moved = false;

        for (i, port) in self.ports.iter_mut().enumerate() {
            if self.state[i] != target[i] {
                port.set_angle(self.state[i]);
                self.state[i] += (target[i] - self.state[i]).signum();
                moved = true;
            }
        }

        moved
    }

    fn clamp_inputs(
        &mut self,
        step_delay_ms: u64,
        target: &JointPose,
    ) -> (JointPose, [bool; NUM_JOINTS], u64, bool) {
        let clamped_target = target.clamped();

        let mut clamped = [false; NUM_JOINTS];
        for (i, joint) in JOINT_IDS.iter().enumerate() {
            if clamped_target.get(*joint) != target.get(*joint) {
                clamped[i] = true;
                self.clamp_count += 1;
                warn!(
                    "{} target {} clamped to {}",
                    joint,
                    target.get(*joint),
                    clamped_target.get(*joint)
                );
            }
        }

        let delay = clamp(
            step_delay_ms,
            self.params.min_step_delay_ms,
            self.params.max_step_delay_ms,
        );
        let delay_clamped = delay != step_delay_ms;
        if delay_clamped {
            self.clamp_count += 1;
            warn!("Step delay {} ms clamped to {} ms", step_delay_ms, delay);
        }

        trace!("Move to {} at {} ms/deg", clamped_target, delay);

        (clamped_target, clamped, delay, delay_clamped)
    }

    fn to_channels(&self, pose: &JointPose) -> [i32; NUM_JOINTS] {
        let mut channels = pose.to_array();
        if self.params.swap_wrist_channels {
            channels.swap(WRIST_VERT_CHANNEL, WRIST_ROT_CHANNEL);
        }
        channels
    }

    fn from_channels(&self, channels: &[i32; NUM_JOINTS]) -> JointPose {
        let mut fields = *channels;
        if self.params.swap_wrist_channels {
            fields.swap(WRIST_VERT_CHANNEL, WRIST_ROT_CHANNEL);
        }
        JointPose::from(fields)
    }
}

impl MoveReport {
    /// True if any input to the move was clamped.
    pub fn any_clamped(&self) -> bool {
        self.step_delay_clamped || self.clamped.iter().any(|c| *c)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::motion_ctrl::{recording_bank, VirtualClock, WriteLog};
    use comms_if::eqpt::arm::{JointId, JOINT_LIMITS_DEG};

    const REST: JointPose = JointPose::new(90, 90, 90, 90, 90, 40);

    fn ctrl_with(params: Params) -> (MotionCtrl, WriteLog, VirtualClock) {
        let (bank, log) = recording_bank();
        let clock = VirtualClock::new();
        let ctrl = MotionCtrl::new(params, bank, Box::new(clock.clone()), REST);
        (ctrl, log, clock)
    }

    fn ctrl() -> (MotionCtrl, WriteLog, VirtualClock) {
        ctrl_with(Params::default())
    }

    #[test]
    fn test_clamping() {
        let (mut ctrl, log, _) = ctrl();

        let report = ctrl.move_to(5, &JointPose::new(-50, 0, 400, -1, 181, 100));

        assert_eq!(report.target, JointPose::new(0, 15, 180, 0, 180, 73));
        assert_eq!(report.clamped, [true; NUM_JOINTS]);
        assert!(report.step_delay_clamped);
        assert_eq!(report.step_delay_ms, 10);
        assert_eq!(ctrl.clamp_count(), 7);
        assert_eq!(ctrl.current_pose(), report.target);

        // Every write lies within the legal range of its channel
        for (joint, angle) in log.lock().unwrap().iter() {
            let (min, max) = JOINT_LIMITS_DEG[joint.index()];
            assert!(*angle >= min && *angle <= max, "{} = {}", joint, angle);
        }
    }

    #[test]
    fn test_in_range_not_flagged() {
        let (mut ctrl, _, _) = ctrl();

        let report = ctrl.move_to(20, &JointPose::new(100, 80, 90, 90, 90, 40));

        assert!(!report.any_clamped());
        assert_eq!(report.step_delay_ms, 20);
        assert_eq!(ctrl.clamp_count(), 0);
    }

    #[test]
    fn test_convergence_ticks() {
        let (mut ctrl, log, clock) = ctrl();

        let target = JointPose::new(120, 80, 95, 90, 90, 10);
        let report = ctrl.move_to(15, &target);

        // Largest delta is the gripper, 30 degrees
        assert_eq!(report.ticks, 30);
        assert_eq!(ctrl.current_pose(), target);
        assert_eq!(clock.now(), Duration::from_millis(30 * 15));

        // One write per degree of travel on each joint
        let writes = log.lock().unwrap();
        let count = |j: JointId| writes.iter().filter(|(c, _)| *c == j).count();
        assert_eq!(count(JointId::Base), 30);
        assert_eq!(count(JointId::Shoulder), 10);
        assert_eq!(count(JointId::Elbow), 5);
        assert_eq!(count(JointId::Gripper), 30);
        assert_eq!(count(JointId::WristVertical), 0);

        // Each joint is commanded to its current angle before stepping
        let base: Vec<i32> = writes
            .iter()
            .filter(|(c, _)| *c == JointId::Base)
            .map(|(_, a)| *a)
            .collect();
        assert_eq!(base.first(), Some(&90));
        assert_eq!(base.last(), Some(&119));

        drop(writes);

        // Already there, nothing happens
        let report = ctrl.move_to(15, &target);
        assert_eq!(report.ticks, 0);
    }

    #[test]
    fn test_step() {
        let (mut ctrl, log, clock) = ctrl();
        let target = JointPose::new(92, 90, 90, 90, 90, 41);

        assert!(ctrl.step(&target));
        assert_eq!(ctrl.current_pose(), JointPose::new(91, 90, 90, 90, 90, 41));
        assert!(ctrl.step(&target));
        assert!(!ctrl.step(&target));
        assert_eq!(ctrl.current_pose(), target);

        assert_eq!(log.lock().unwrap().len(), 3);
        assert_eq!(clock.now(), Duration::from_millis(0));
    }

    /// The wrist vertical field of a pose drives the wrist rotation actuator,
    /// and the wrist rotation field drives the wrist vertical actuator. The
    /// factory calibration tables depend on this routing.
    #[test]
    fn test_wrist_channels_swapped() {
        let (mut ctrl, log, _) = ctrl();

        ctrl.move_to(10, &REST.with(JointId::WristVertical, 92));

        let writes = log.lock().unwrap().clone();
        assert_eq!(
            writes,
            vec![(JointId::WristRotation, 90), (JointId::WristRotation, 91)]
        );
        assert_eq!(ctrl.current_pose().wrist_vertical, 92);

        // With the routing disabled each field drives its own actuator
        let (mut ctrl, log, _) = ctrl_with(Params {
            swap_wrist_channels: false,
            ..Params::default()
        });
        ctrl.move_to(10, &REST.with(JointId::WristVertical, 91));
        assert_eq!(
            log.lock().unwrap().clone(),
            vec![(JointId::WristVertical, 90)]
        );
    }

    #[test]
    fn test_cancel() {
        let (mut ctrl, log, _) = ctrl();
        let token = CancelToken::new();
        token.cancel();

        let opts = MoveOptions {
            cancel: Some(token.clone()),
            timeout: None,
        };
        let res = ctrl.move_with(10, &JointPose::new(0, 90, 90, 90, 90, 40), &opts);

        assert_eq!(res, Err(MotionCtrlError::Cancelled { ticks: 0 }));
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(ctrl.current_pose(), REST);

        // Once reset the same options complete the move
        token.reset();
        let report = ctrl
            .move_with(10, &JointPose::new(0, 90, 90, 90, 90, 40), &opts)
            .unwrap();
        assert_eq!(report.ticks, 90);
    }

    #[test]
    fn test_timeout() {
        let (mut ctrl, _, clock) = ctrl();

        let opts = MoveOptions {
            cancel: None,
            timeout: Some(Duration::from_millis(100)),
        };
        let res = ctrl.move_with(20, &JointPose::new(180, 90, 90, 90, 90, 40), &opts);

        // 5 ticks of 20 ms reach the deadline
        assert_eq!(res, Err(MotionCtrlError::TimedOut { ticks: 5 }));
        assert_eq!(ctrl.current_pose().base, 95);
        assert_eq!(clock.now(), Duration::from_millis(100));
    }

    #[test]
    fn test_settle() {
        let (ctrl, _, clock) = ctrl();
        ctrl.settle(10);
        assert_eq!(ctrl.now(), Duration::from_millis(10));
        assert_eq!(clock.now(), ctrl.now());
    }
}
