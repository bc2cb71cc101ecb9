//! Worker thread which executes arm commands.

// -----------------------------------------------------------------------------------------------
// INCLUDES
// -----------------------------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{Receiver, Sender},
    Arc,
};

use comms_if::tc::arm_ctrl::ArmCmd;
use log::{debug, error, warn};

use crate::arm_ctrl::{ArmCtrl, InputData};

use super::ArmEvent;

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

pub(super) fn worker_thread(
    mut ctrl: ArmCtrl,
    busy: Arc<AtomicBool>,
    cmd_reciever: Receiver<ArmCmd>,
    event_sender: Sender<ArmEvent>,
) -> ArmCtrl {
    // Wait for commands from main
    while let Ok(cmd) = cmd_reciever.recv() {
        if event_sender.send(ArmEvent::Started(cmd.clone())).is_err() {
            warn!("Arm event reciever dropped");
        }

        let event = match ctrl.proc(&InputData { cmd: Some(cmd) }) {
            Ok(report) => {
                debug!("Arm command complete: {:?}", report);
                ArmEvent::Finished(report)
            }
            Err(e) => {
                error!("Arm command failed: {}", e);
                ArmEvent::Failed(e.to_string())
            }
        };

        busy.store(false, Ordering::SeqCst);

        event_sender.send(event).ok();
    }

    debug!("Arm worker stopping");

    ctrl
}
