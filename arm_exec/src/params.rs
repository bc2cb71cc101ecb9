//! # Arm Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Serialize, Deserialize};

use arm_lib::servo_ctrl::{pca9685::BoardConfig, ServoConfig};
use comms_if::eqpt::arm::NUM_JOINTS;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ArmExecParams {

    /// Minimum level of log messages, one of `off`, `error`, `warn`, `info`, `debug` or `trace`
    pub log_level: String,

    /// Path of the arm control parameter file, relative to the params directory
    pub arm_ctrl_params: String,

    /// Log actuator demands instead of driving the servo board
    pub dry_run: bool,

    /// Move to the home pose before accepting commands
    pub home_on_start: bool,

    /// Path of the command history file, relative to the software root
    pub history_path: String,

    /// Servo driver board settings
    pub board: BoardConfig,

    /// Servo settings in joint order (base, shoulder, elbow, wrist vertical, wrist rotation,
    /// gripper)
    pub servos: [ServoConfig; NUM_JOINTS],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ArmExecParams {
    fn default() -> Self {
        let mut servos: [ServoConfig; NUM_JOINTS] = Default::default();
        for (i, s) in servos.iter_mut().enumerate() {
            s.channel = i as u8;
        }

        Self {
            log_level: String::from("debug"),
            arm_ctrl_params: String::from("arm_ctrl.toml"),
            dry_run: false,
            home_on_start: true,
            history_path: String::from("data/arm_history.txt"),
            board: BoardConfig::default(),
            servos,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_shipped_params() {
        let params: ArmExecParams =
            util::params::parse(include_str!("../../params/arm_exec.toml")).unwrap();

        assert_eq!(params, ArmExecParams::default());
        assert!(params.log_level.parse::<log::LevelFilter>().is_ok());
    }
}
