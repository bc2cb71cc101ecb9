//! # Arm Manager
//!
//! Runs arm control on a dedicated worker thread so command sources are never blocked by motion.
//! Only one command runs at a time, commands submitted while one is in progress are rejected
//! rather than queued.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, RecvTimeoutError, Sender, TryRecvError},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use comms_if::{
    eqpt::arm::{ArmCmdResponse, ArmStatus},
    tc::arm_ctrl::ArmCmd,
};
use log::{info, warn};

use crate::{
    arm_ctrl::{ArmCtrl, StatusReport},
    motion_ctrl::CancelToken,
};

use self::worker::worker_thread;

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod worker;

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// The arm manager, owner of the motion worker thread.
#[derive(Debug)]
pub struct ArmMgr {
    /// Set while a command is in progress.
    busy: Arc<AtomicBool>,

    cancel: CancelToken,

    worker_jh: Option<JoinHandle<ArmCtrl>>,

    cmd_sender: Option<Sender<ArmCmd>>,
    event_reciever: Receiver<ArmEvent>,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Events published by the worker thread.
#[derive(Debug, Clone)]
pub enum ArmEvent {
    /// Execution of the command has begun.
    Started(ArmCmd),

    /// The command completed.
    Finished(StatusReport),

    /// The command failed, with the reason.
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ArmMgrError {
    #[error("Could not start the worker thread: {0}")]
    SpawnError(std::io::Error),

    #[error("The worker thread has stopped")]
    WorkerStopped,

    #[error("The worker thread panicked")]
    WorkerPanicked,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl ArmMgr {
    /// Move the arm controller onto a new worker thread.
    pub fn spawn(ctrl: ArmCtrl) -> Result<Self, ArmMgrError> {
        let busy = Arc::new(AtomicBool::new(false));
        let cancel = ctrl.cancel_token();

        // Create channels
        let (cmd_sender, cmd_reciever) = channel();
        let (event_sender, event_reciever) = channel();

        // Start worker thread
        let busy_worker = busy.clone();
        let worker_jh = thread::Builder::new()
            .name("arm_mgr::worker".into())
            .spawn(move || worker_thread(ctrl, busy_worker, cmd_reciever, event_sender))
            .map_err(ArmMgrError::SpawnError)?;

        Ok(Self {
            busy,
            cancel,
            worker_jh: Some(worker_jh),
            cmd_sender: Some(cmd_sender),
            event_reciever,
        })
    }

    /// Submit a command for execution.
    ///
    /// Returns `Busy` without queuing if a command is already in progress.
    pub fn submit(&self, cmd: ArmCmd) -> ArmCmdResponse {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Arm busy, rejecting {:?}", cmd);
            return ArmCmdResponse::Busy;
        }

        // Clear any cancel aimed at the previous command. This happens before the command is
        // queued so that a cancel issued once `Accepted` is returned is never lost.
        self.cancel.reset();

        let sent = match self.cmd_sender {
            Some(ref s) => s.send(cmd).is_ok(),
            None => false,
        };

        if sent {
            ArmCmdResponse::Accepted
        } else {
            warn!("Arm worker has stopped, command dropped");
            self.busy.store(false, Ordering::SeqCst);
            ArmCmdResponse::Busy
        }
    }

    /// Current status of the arm.
    pub fn status(&self) -> ArmStatus {
        ArmStatus::from_busy(self.busy.load(Ordering::SeqCst))
    }

    /// Abort the running command between motion ticks.
    pub fn cancel(&self) {
        if self.busy.load(Ordering::SeqCst) {
            info!("Cancelling the current arm command");
            self.cancel.cancel();
        }
    }

    /// Get the next event from the worker if there is one.
    pub fn try_event(&self) -> Result<Option<ArmEvent>, ArmMgrError> {
        match self.event_reciever.try_recv() {
            Ok(e) => Ok(Some(e)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ArmMgrError::WorkerStopped),
        }
    }

    /// Wait up to `timeout` for the next event from the worker.
    pub fn wait_event(&self, timeout: Duration) -> Result<Option<ArmEvent>, ArmMgrError> {
        match self.event_reciever.recv_timeout(timeout) {
            Ok(e) => Ok(Some(e)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ArmMgrError::WorkerStopped),
        }
    }

    /// Stop the worker once any running command has completed, and return the arm controller.
    pub fn shutdown(mut self) -> Result<ArmCtrl, ArmMgrError> {
        // Dropping the sender ends the worker's receive loop
        self.cmd_sender.take();

        match self.worker_jh.take() {
            Some(jh) => jh.join().map_err(|_| ArmMgrError::WorkerPanicked),
            None => Err(ArmMgrError::WorkerStopped),
        }
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        arm_ctrl::Params,
        motion_ctrl::{bank_from_fn, ActuatorPort, VirtualClock},
    };
    use comms_if::eqpt::arm::{JointId, JointPose};
    use std::sync::mpsc::SyncSender;

    const TIMEOUT: Duration = Duration::from_secs(10);

    /// A port which reports each write and then blocks until released.
    ///
    /// Once the release sender is dropped all writes pass straight through.
    struct GatePort {
        entered: SyncSender<()>,
        release: Receiver<()>,
    }

    struct NullPort;

    impl ActuatorPort for GatePort {
        fn set_angle(&mut self, _angle_deg: i32) {
            self.entered.try_send(()).ok();
            self.release.recv().ok();
        }
    }

    impl ActuatorPort for NullPort {
        fn set_angle(&mut self, _angle_deg: i32) {}
    }

    /// Arm manager whose base actuator is gated.
    fn gated_mgr() -> (ArmMgr, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = std::sync::mpsc::sync_channel(1);
        let (release_tx, release_rx) = channel();

        let mut gate = Some(GatePort {
            entered: entered_tx,
            release: release_rx,
        });
        let bank = bank_from_fn(|joint| match (joint, gate.take()) {
            (JointId::Base, Some(g)) => Box::new(g),
            _ => Box::new(NullPort),
        });

        let ctrl = ArmCtrl::new(Params::default(), bank, Box::new(VirtualClock::new())).unwrap();

        (ArmMgr::spawn(ctrl).unwrap(), entered_rx, release_tx)
    }

    fn move_base(base: i32) -> ArmCmd {
        ArmCmd::Move {
            pose: JointPose::new(base, 90, 90, 90, 90, 40),
            step_delay_ms: 10,
        }
    }

    #[test]
    fn test_busy_rejection() {
        let (mgr, entered, release) = gated_mgr();
        assert_eq!(mgr.status(), ArmStatus::Idle);

        assert_eq!(mgr.submit(move_base(100)), ArmCmdResponse::Accepted);
        assert!(matches!(
            mgr.wait_event(TIMEOUT).unwrap(),
            Some(ArmEvent::Started(_))
        ));

        // Worker is blocked inside the first tick
        entered.recv_timeout(TIMEOUT).unwrap();
        assert_eq!(mgr.status(), ArmStatus::Busy);
        assert_eq!(mgr.status().as_byte(), 1);
        assert_eq!(mgr.submit(ArmCmd::Home), ArmCmdResponse::Busy);

        drop(release);
        match mgr.wait_event(TIMEOUT).unwrap() {
            Some(ArmEvent::Finished(report)) => assert_eq!(report.final_pose.base, 100),
            e => panic!("Expected Finished, got {:?}", e),
        }
        assert_eq!(mgr.status(), ArmStatus::Idle);

        // The rejected command never ran
        assert_eq!(mgr.submit(move_base(95)), ArmCmdResponse::Accepted);
        assert!(matches!(
            mgr.wait_event(TIMEOUT).unwrap(),
            Some(ArmEvent::Started(_))
        ));
        assert!(matches!(
            mgr.wait_event(TIMEOUT).unwrap(),
            Some(ArmEvent::Finished(_))
        ));

        let ctrl = mgr.shutdown().unwrap();
        assert_eq!(ctrl.current_pose().base, 95);
    }

    #[test]
    fn test_cancel() {
        let (mgr, entered, release) = gated_mgr();

        assert_eq!(mgr.submit(move_base(0)), ArmCmdResponse::Accepted);
        entered.recv_timeout(TIMEOUT).unwrap();

        mgr.cancel();
        drop(release);

        assert!(matches!(
            mgr.wait_event(TIMEOUT).unwrap(),
            Some(ArmEvent::Started(_))
        ));
        assert!(matches!(
            mgr.wait_event(TIMEOUT).unwrap(),
            Some(ArmEvent::Failed(_))
        ));
        assert_eq!(mgr.status(), ArmStatus::Idle);

        // The token is reset so the next command runs normally
        assert_eq!(mgr.submit(move_base(92)), ArmCmdResponse::Accepted);
        mgr.wait_event(TIMEOUT).unwrap();
        assert!(matches!(
            mgr.wait_event(TIMEOUT).unwrap(),
            Some(ArmEvent::Finished(_))
        ));

        let ctrl = mgr.shutdown().unwrap();
        assert_eq!(ctrl.current_pose().base, 92);
    }

    #[test]
    fn test_cancel_straight_after_submit() {
        let (mgr, _entered, release) = gated_mgr();

        // Cancel before the worker has had a chance to pick the command up
        assert_eq!(mgr.submit(move_base(0)), ArmCmdResponse::Accepted);
        mgr.cancel();
        drop(release);

        assert!(matches!(
            mgr.wait_event(TIMEOUT).unwrap(),
            Some(ArmEvent::Started(_))
        ));
        assert!(matches!(
            mgr.wait_event(TIMEOUT).unwrap(),
            Some(ArmEvent::Failed(_))
        ));

        let ctrl = mgr.shutdown().unwrap();
        assert_ne!(ctrl.current_pose().base, 0);
    }

    #[test]
    fn test_failed_command_clears_busy() {
        let (mgr, _entered, _release) = gated_mgr();

        let cmd = ArmCmd::Transport {
            x: 0.0,
            y: 0.0,
            object_id: 99,
        };
        assert_eq!(mgr.submit(cmd), ArmCmdResponse::Accepted);
        mgr.wait_event(TIMEOUT).unwrap();
        assert!(matches!(
            mgr.wait_event(TIMEOUT).unwrap(),
            Some(ArmEvent::Failed(_))
        ));
        assert_eq!(mgr.status(), ArmStatus::Idle);

        mgr.shutdown().unwrap();
    }
}
