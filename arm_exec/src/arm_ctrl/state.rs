//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::Serialize;
use std::time::Duration;

// Internal
use super::{ArmCtrlError, Params};
use crate::{
    interp::Interpolator,
    motion_ctrl::{ActuatorBank, CancelToken, Clock, MotionCtrl, MoveOptions, MoveReport},
    pose::{self, ApproachDirection, ObjectTargetTable, Point2D, Workspace},
    transport_seq::{SeqReport, TransportSeq, TransportSeqError},
};
use comms_if::{
    eqpt::arm::{JointId, JointPose, NUM_JOINTS},
    tc::arm_ctrl::{ArmCmd, JogDirection},
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::clamp,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Path of the move archive relative to the session archive root.
const MOVES_ARCHIVE_PATH: &str = "arm_ctrl/moves.csv";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
pub struct ArmCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    motion: MotionCtrl,

    targets: ObjectTargetTable,

    workspace: Workspace,

    direction: ApproachDirection,

    interp: Interpolator,

    seq: TransportSeq,

    /// Token watched by every move, tripped to abort the running command.
    cancel: CancelToken,

    /// Controller clock time at which the last executed jog finished.
    last_jog_end: Option<Duration>,

    /// Moves executed since the archive was last written.
    pending_records: Vec<MoveRecord>,
    arch_moves: Archiver,
}

/// Input data to Arm Control.
#[derive(Debug, Default, Clone)]
pub struct InputData {
    /// The command to be executed, or `None` if there is no new command.
    pub cmd: Option<ArmCmd>,
}

/// Status report for ArmCtrl processing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusReport {
    /// Number of moves executed for the command.
    pub num_moves: u32,

    /// Total motion ticks over all moves.
    pub ticks: u32,

    /// Which joint targets were clamped on any move, in pose field order.
    pub clamped: [bool; NUM_JOINTS],

    /// True if a step delay was clamped on any move.
    pub step_delay_clamped: bool,

    /// The jog arrived too soon after the previous one and was ignored.
    pub jog_ignored: bool,

    /// The jog was already at its bound so nothing moved.
    pub jog_noop: bool,

    /// Approach direction after the command.
    pub direction: ApproachDirection,

    /// Tracked pose after the command.
    pub final_pose: JointPose,
}

/// A single executed move, as archived.
#[derive(Debug, Clone, Serialize)]
struct MoveRecord {
    time_s: f64,
    cmd: String,
    base: i32,
    shoulder: i32,
    elbow: i32,
    wrist_vertical: i32,
    wrist_rotation: i32,
    gripper: i32,
    step_delay_ms: u64,
    ticks: u32,
    any_clamped: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmCtrl {
    /// Create a new arm controller.
    ///
    /// The arm is assumed to be physically at the rest pose.
    pub fn new(
        params: Params,
        ports: ActuatorBank,
        clock: Box<dyn Clock + Send>,
    ) -> Result<Self, ArmCtrlError> {
        let motion =
            MotionCtrl::new(params.motion.clone(), ports, clock, params.rest_pose);

        let targets = ObjectTargetTable::new(&params.pose.objects)?;

        let workspace = params.pose.workspace;
        let direction = ApproachDirection::from_base_angle(params.rest_pose.base);
        let calib = pose::calib_for_direction(&params.pose, &workspace, direction)?;
        let interp = Interpolator::new(calib, &params.interp)?;

        let cancel = CancelToken::new();
        let mut seq = TransportSeq::new(params.transport.clone());
        seq.set_options(MoveOptions {
            cancel: Some(cancel.clone()),
            timeout: None,
        });

        debug!(
            "ArmCtrl created, {} object targets, approaching {:?}",
            targets.len(),
            direction
        );

        Ok(Self {
            report: StatusReport::new(direction, params.rest_pose.clamped()),
            params,
            motion,
            targets,
            workspace,
            direction,
            interp,
            seq,
            cancel,
            last_jog_end: None,
            pending_records: Vec::new(),
            arch_moves: Archiver::default(),
        })
    }

    /// Archive every executed move into the given session.
    pub fn init_archive(&mut self, session: &Session) -> Result<(), ArchiveError> {
        self.arch_moves = Archiver::from_path(session, MOVES_ARCHIVE_PATH)?;
        Ok(())
    }

    /// A handle to the token which aborts the running command.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Process a single command.
    pub fn proc(&mut self, input_data: &InputData) -> Result<StatusReport, ArmCtrlError> {
        let cmd = input_data.cmd.as_ref().ok_or(ArmCtrlError::NoArmCmd)?;
        let res = self.handle(cmd);

        if self.arch_moves.is_initialised() {
            if let Err(e) = self.write() {
                warn!("Could not archive ArmCtrl moves: {}", e);
            }
        }

        res
    }

    /// Execute a command, blocking until it completes.
    pub fn handle(&mut self, cmd: &ArmCmd) -> Result<StatusReport, ArmCtrlError> {
        info!("Executing {:?}", cmd);

        self.report = StatusReport::new(self.direction, self.motion.current_pose());

        match cmd {
            ArmCmd::Move {
                pose,
                step_delay_ms,
            } => {
                self.exec_move("move", *step_delay_ms, pose)?;
            }
            ArmCmd::Jog { joint, direction } => self.jog(*joint, *direction)?,
            ArmCmd::SetWorkspace { width, height } => {
                self.set_workspace(*width, *height)?
            }
            ArmCmd::Transport { x, y, object_id } => {
                self.run_transport(*x, *y, *object_id)?;
            }
            ArmCmd::Home => self.home()?,
            ArmCmd::Demo { repeat } => self.demo(*repeat)?,
        }

        self.report.direction = self.direction;
        self.report.final_pose = self.motion.current_pose();

        Ok(self.report)
    }

    /// Pick the object at `(x, y)` and place it at the drop-off pose of its
    /// class.
    ///
    /// Afterwards the approach direction is recomputed from the final base
    /// angle and the calibration rebuilt to match. This also happens when the
    /// sequence is aborted part way, since the arm may already have crossed
    /// to the other side.
    pub fn run_transport(
        &mut self,
        x: f64,
        y: f64,
        object_id: u8,
    ) -> Result<SeqReport, ArmCtrlError> {
        let res = self.seq.run(
            &mut self.motion,
            &self.interp,
            &self.targets,
            &self.params.pose.transition_pose,
            Point2D::new(x, y),
            object_id,
        );

        match &res {
            Ok(seq_report) => self.account_seq(seq_report),
            Err(TransportSeqError::Motion { partial, .. }) => self.account_seq(partial),
            Err(_) => (),
        }

        let dir_res = self.update_direction();
        let seq_report = res?;
        dir_res?;

        Ok(seq_report)
    }

    /// Set the size of the workspace and rebuild the calibration for the
    /// current direction.
    pub fn set_workspace(&mut self, width: f64, height: f64) -> Result<(), ArmCtrlError> {
        let workspace = Workspace { width, height };
        self.rebuild_calib(workspace, self.direction)?;

        info!("Workspace set to {} x {}", width, height);
        Ok(())
    }

    /// Move to the home pose.
    pub fn home(&mut self) -> Result<(), ArmCtrlError> {
        let pose = self.params.home_pose;
        self.exec_move("home", self.params.home_step_delay_ms, &pose)?;
        Ok(())
    }

    /// Move through the demo poses `repeat` times.
    pub fn demo(&mut self, repeat: u32) -> Result<(), ArmCtrlError> {
        let poses = self.params.demo_poses.clone();

        for i in 0..repeat {
            debug!("Demo pass {} of {}", i + 1, repeat);
            for pose in poses.iter() {
                self.exec_move("demo", self.params.demo_step_delay_ms, pose)?;
                self.motion.settle(self.params.demo_pause_ms);
            }
        }

        Ok(())
    }

    /// Nudge a single joint by the jog step.
    pub fn jog(&mut self, joint: JointId, direction: JogDirection) -> Result<(), ArmCtrlError> {
        if !direction.applies_to(joint) {
            return Err(ArmCtrlError::InvalidJog { joint, direction });
        }

        // Rate limit against the end of the last executed jog
        let now = self.motion.now();
        if let Some(last) = self.last_jog_end {
            if now < last + Duration::from_millis(self.params.jog_min_interval_ms) {
                debug!("Jog {} {} ignored, too soon after the last", joint, direction);
                self.report.jog_ignored = true;
                return Ok(());
            }
        }

        let current = self.motion.current_pose();
        let (mut min, max) = joint.limits_deg();
        if joint == JointId::Gripper {
            min = min.max(self.params.jog_gripper_min);
        }

        let from = current.get(joint);
        let to = clamp(from + direction.sign() * self.params.jog_step_deg, min, max);

        if to == from {
            debug!("Jog {} {} at its bound ({})", joint, direction, from);
            self.report.jog_noop = true;
            return Ok(());
        }

        self.exec_move("jog", self.params.jog_step_delay_ms, &current.with(joint, to))?;
        self.last_jog_end = Some(self.motion.now());

        Ok(())
    }

    pub fn current_pose(&self) -> JointPose {
        self.motion.current_pose()
    }

    pub fn direction(&self) -> ApproachDirection {
        self.direction
    }

    pub fn workspace(&self) -> Workspace {
        self.workspace
    }

    pub fn interpolator(&self) -> &Interpolator {
        &self.interp
    }

    /// Number of clamped inputs seen by the motion controller.
    pub fn clamp_count(&self) -> u64 {
        self.motion.clamp_count()
    }

    /// Recompute the approach direction from the tracked base angle and
    /// rebuild the calibration if it changed.
    fn update_direction(&mut self) -> Result<(), ArmCtrlError> {
        let direction = ApproachDirection::from_base_angle(self.motion.current_pose().base);
        if direction != self.direction {
            debug!("Approach direction now {:?}", direction);
            self.rebuild_calib(self.workspace, direction)?;
        }
        Ok(())
    }

    /// Rebuild the calibration, keeping the previous one on error.
    fn rebuild_calib(
        &mut self,
        workspace: Workspace,
        direction: ApproachDirection,
    ) -> Result<(), ArmCtrlError> {
        let calib = pose::calib_for_direction(&self.params.pose, &workspace, direction)?;
        self.interp.set_calib(calib)?;

        self.workspace = workspace;
        self.direction = direction;

        Ok(())
    }

    fn exec_move(
        &mut self,
        cmd: &str,
        step_delay_ms: u64,
        pose: &JointPose,
    ) -> Result<MoveReport, ArmCtrlError> {
        let opts = MoveOptions {
            cancel: Some(self.cancel.clone()),
            timeout: None,
        };
        let move_report = self.motion.move_with(step_delay_ms, pose, &opts)?;

        self.account_move(cmd, &move_report);

        Ok(move_report)
    }

    /// Add the moves of a transport sequence to the report and archive.
    fn account_seq(&mut self, seq_report: &SeqReport) {
        for (phase, move_report) in seq_report.moves.iter() {
            self.account_move(&format!("transport:{}", phase), move_report);
        }
    }

    /// Add an executed move to the report and archive.
    fn account_move(&mut self, cmd: &str, move_report: &MoveReport) {
        self.report.num_moves += 1;
        self.report.ticks += move_report.ticks;
        for (r, c) in self.report.clamped.iter_mut().zip(move_report.clamped.iter()) {
            *r |= *c;
        }
        self.report.step_delay_clamped |= move_report.step_delay_clamped;

        if !self.arch_moves.is_initialised() {
            return;
        }

        let pose = &move_report.target;
        self.pending_records.push(MoveRecord {
            time_s: session::get_elapsed_seconds(),
            cmd: cmd.to_string(),
            base: pose.base,
            shoulder: pose.shoulder,
            elbow: pose.elbow,
            wrist_vertical: pose.wrist_vertical,
            wrist_rotation: pose.wrist_rotation,
            gripper: pose.gripper,
            step_delay_ms: move_report.step_delay_ms,
            ticks: move_report.ticks,
            any_clamped: move_report.any_clamped(),
        });
    }
}

impl Archived for ArmCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        for record in self.pending_records.drain(..) {
            self.arch_moves.serialise(record)?;
        }
        Ok(())
    }
}

impl StatusReport {
    fn new(direction: ApproachDirection, pose: JointPose) -> Self {
        Self {
            num_moves: 0,
            ticks: 0,
            clamped: [false; NUM_JOINTS],
            step_delay_clamped: false,
            jog_ignored: false,
            jog_noop: false,
            direction,
            final_pose: pose,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
