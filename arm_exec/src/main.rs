//! # Arm Control Executable
//!
//! This executable drives the six joint arm. Commands are read from an interactive command line,
//! either in the command line form (`jog base left`, `transport 645 286 1`) or the wire form sent
//! by the detection host (`T 645 286 1`), and executed one at a time on the arm worker thread.
//!
//! The built in commands `status`, `cancel` and `quit` are also available.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Parameters for the arm executable.
mod params;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::{eyre, WrapErr}, Result};
use log::{info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::path::PathBuf;

// Internal
use arm_lib::{
    arm_ctrl::{self, ArmCtrl, InputData},
    arm_mgr::{ArmEvent, ArmMgr},
    motion_ctrl::{ActuatorBank, SystemClock},
};
use comms_if::tc::arm_ctrl::ArmCmd;
use params::ArmExecParams;
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const PROMPT: &str = "arm $ ";

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Load the executable parameters before the logger so they can set the log level
    let exec_params: ArmExecParams = util::params::load("arm_exec.toml")
        .wrap_err("Failed to load the arm_exec parameters")?;

    let log_level: LevelFilter = match exec_params.log_level.parse() {
        Ok(l) => l,
        Err(_) => return Err(eyre!("Invalid log level \"{}\"", exec_params.log_level)),
    };

    // Initialise logger
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Arm Control Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let ctrl_params: arm_ctrl::Params = util::params::load(&exec_params.arm_ctrl_params)
        .wrap_err("Failed to load the arm_ctrl parameters")?;

    info!("Parameters loaded");

    // ---- MODULE INITIALISATION ----

    let bank = actuator_bank(&exec_params)?;

    let mut arm_ctrl = ArmCtrl::new(ctrl_params, bank, Box::new(SystemClock::new()))
        .wrap_err("Failed to initialise ArmCtrl")?;
    arm_ctrl
        .init_archive(&session)
        .wrap_err("Failed to initialise the ArmCtrl archive")?;

    info!("ArmCtrl initialised");

    if exec_params.home_on_start {
        info!("Homing the arm");
        arm_ctrl
            .proc(&InputData {
                cmd: Some(ArmCmd::Home),
            })
            .wrap_err("Failed to home the arm")?;
    }

    let arm_mgr = ArmMgr::spawn(arm_ctrl).wrap_err("Failed to start the arm manager")?;

    // ---- MAIN LOOP ----

    info!("Initialisation complete, entering command line");

    let history_path = host::get_sw_root()
        .map(|r| r.join(&exec_params.history_path))
        .ok();

    run_cli(&arm_mgr, history_path)?;

    // ---- SHUTDOWN ----

    info!("Waiting for the arm to finish...");

    let arm_ctrl = arm_mgr
        .shutdown()
        .wrap_err("Failed to stop the arm manager")?;

    info!(
        "Shutdown complete, final pose {}, {} clamped inputs",
        arm_ctrl.current_pose(),
        arm_ctrl.clamp_count()
    );

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Read and submit commands until the user quits.
fn run_cli(arm_mgr: &ArmMgr, history_path: Option<PathBuf>) -> Result<()> {
    let mut rl = DefaultEditor::new().wrap_err("Failed to start the command line")?;

    if let Some(ref p) = history_path {
        if rl.load_history(p).is_err() {
            info!("No command history found");
        }
    }

    loop {
        print_events(arm_mgr);

        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).wrap_err("Failed to read the command line"),
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line).ok();

        match line {
            "quit" | "exit" => break,
            "status" => {
                let status = arm_mgr.status();
                println!("{:?} ({})", status, status.as_byte());
            }
            "cancel" => arm_mgr.cancel(),
            _ => match ArmCmd::parse_line(line) {
                Ok(cmd) => println!("{:?}", arm_mgr.submit(cmd)),
                Err(e) => println!("{}", e),
            },
        }
    }

    if let Some(ref p) = history_path {
        if let Err(e) = rl.save_history(p) {
            warn!("Could not save the command history: {}", e);
        }
    }

    Ok(())
}

/// Print any events published by the arm worker since the last call.
fn print_events(arm_mgr: &ArmMgr) {
    loop {
        match arm_mgr.try_event() {
            Ok(Some(ArmEvent::Started(cmd))) => println!("Started {:?}", cmd),
            Ok(Some(ArmEvent::Finished(report))) => println!(
                "Finished: {} moves, {} ticks, now at {}",
                report.num_moves, report.ticks, report.final_pose
            ),
            Ok(Some(ArmEvent::Failed(msg))) => println!("Failed: {}", msg),
            Ok(None) => break,
            Err(e) => {
                warn!("{}", e);
                break;
            }
        }
    }
}

/// Build the servo actuators on a Raspberry Pi.
#[cfg(all(target_arch = "arm", target_os = "linux"))]
fn actuator_bank(params: &ArmExecParams) -> Result<ActuatorBank> {
    use arm_lib::{motion_ctrl::log_bank, servo_ctrl::{pca9685, servo_bank}};
    use rppal::i2c::I2c;

    if params.dry_run {
        info!("Dry run, actuator demands will only be logged");
        return Ok(log_bank());
    }

    let i2c = I2c::with_bus(params.board.i2c_bus).wrap_err("Failed to open the I2C bus")?;
    let board = pca9685::init_board(i2c, &params.board)
        .wrap_err("Failed to initialise the servo driver board")?;

    servo_bank(board, &params.servos).wrap_err("Failed to create the servo actuators")
}

/// Build logging actuators on platforms without a servo driver board.
#[cfg(not(all(target_arch = "arm", target_os = "linux")))]
fn actuator_bank(params: &ArmExecParams) -> Result<ActuatorBank> {
    if !params.dry_run {
        warn!("No servo driver board on this platform, actuator demands will only be logged");
    }

    Ok(arm_lib::motion_ctrl::log_bank())
}
