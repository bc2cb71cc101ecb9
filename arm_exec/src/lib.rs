//! # Arm library.
//!
//! This library allows the arm executable, tests and benchmarks to access the arm control
//! software. Control flows from [`arm_mgr`] through [`arm_ctrl`] into the [`transport_seq`],
//! [`interp`] and [`motion_ctrl`] modules, with [`servo_ctrl`] driving the hardware.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Position model - calibration anchors, object drop-off targets and the transition pose
pub mod pose;

/// Interpolation engine - converts workspace coordinates into joint poses
pub mod interp;

/// Motion controller - steps the joints towards a target pose
pub mod motion_ctrl;

/// Transport sequencer - the pick, transport and place macro
pub mod transport_seq;

/// Arm control module - executes arm telecommands
pub mod arm_ctrl;

/// Arm manager - runs arm control on a worker thread and rejects commands while busy
pub mod arm_mgr;

/// Servo control - drives the joint servos through a PWM driver board
pub mod servo_ctrl;
