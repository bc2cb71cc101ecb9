//! Actuator ports
//!
//! An actuator port is the write only interface to a single joint actuator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex};
use log::trace;

use comms_if::eqpt::arm::{JointId, JOINT_IDS, NUM_JOINTS};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A single joint actuator.
///
/// Writes are fire and forget, implementors must handle (or log) their own
/// failures.
pub trait ActuatorPort {
    /// Command the actuator to the given angle.
    fn set_angle(&mut self, angle_deg: i32);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One actuator per channel, indexed in `JOINT_IDS` order.
pub type ActuatorBank = [Box<dyn ActuatorPort + Send>; NUM_JOINTS];

/// Shared log of every actuator write made by a bank of [`RecordingPort`]s.
pub type WriteLog = Arc<Mutex<Vec<(JointId, i32)>>>;

/// A port which records every write into a shared log.
pub struct RecordingPort {
    channel: JointId,
    log: WriteLog,
}

/// A port which only logs writes, used when no hardware is attached.
pub struct LogPort {
    channel: JointId,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build a bank of recording ports sharing one write log.
pub fn recording_bank() -> (ActuatorBank, WriteLog) {
    let log: WriteLog = Arc::new(Mutex::new(Vec::new()));

    let bank = bank_from_fn(|channel| {
        Box::new(RecordingPort {
            channel,
            log: log.clone(),
        })
    });

    (bank, log)
}

/// Build a bank of ports which only log their writes.
pub fn log_bank() -> ActuatorBank {
    bank_from_fn(|channel| Box::new(LogPort { channel }))
}

/// Build a bank by creating one port per channel.
pub fn bank_from_fn<F>(mut f: F) -> ActuatorBank
where
    F: FnMut(JointId) -> Box<dyn ActuatorPort + Send>,
{
    [
        f(JOINT_IDS[0]),
        f(JOINT_IDS[1]),
        f(JOINT_IDS[2]),
        f(JOINT_IDS[3]),
        f(JOINT_IDS[4]),
        f(JOINT_IDS[5]),
    ]
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ActuatorPort for RecordingPort {
    fn set_angle(&mut self, angle_deg: i32) {
        // A poisoned log means a test thread panicked, keep recording anyway
        let mut log = match self.log.lock() {
            Ok(l) => l,
            Err(p) => p.into_inner(),
        };
        log.push((self.channel, angle_deg));
    }
}

impl ActuatorPort for LogPort {
    fn set_angle(&mut self, angle_deg: i32) {
        trace!("{} <- {}", self.channel, angle_deg);
    }
}
