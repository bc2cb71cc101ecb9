//! # Arm control telecommands
//!
//! Arm commands can arrive in three forms:
//!
//! - The compact wire form written by the detection host, `S <w> <h>` to set the workspace size
//!   and `T <x> <y> <id>` to transport an object.
//! - The command line form used by the `arm_exec` REPL, for example `jog base left` or
//!   `move 90,100,165,90,110,10 --step-delay-ms 20`.
//! - JSON, as produced by serialising an [`ArmCmd`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use structopt::StructOpt;

use super::TcParseError;
use crate::eqpt::arm::{JointId, JointPose};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be completed by arm control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, StructOpt)]
#[structopt(name = "arm")]
pub enum ArmCmd {
    /// Move every joint directly to the given pose.
    #[structopt(name = "move")]
    Move {
        /// The target pose as six comma separated angles in degrees, in the order base, shoulder,
        /// elbow, wrist vertical, wrist rotation, gripper.
        pose: JointPose,

        /// Delay between each one degree step of the joints.
        ///
        /// Units: milliseconds
        #[structopt(short, long, default_value = "20")]
        step_delay_ms: u64,
    },

    /// Nudge a single joint by a small fixed step.
    #[structopt(name = "jog")]
    Jog {
        /// The joint to move (base, shoulder, elbow, wrist_vert, wrist_rot, gripper).
        joint: JointId,

        /// The direction to move in (left, right, up, down, open, close).
        direction: JogDirection,
    },

    /// Set the size of the pick workspace, the calibration rectangle is rebuilt from it.
    #[structopt(name = "ws")]
    SetWorkspace {
        /// Width of the workspace in image coordinates.
        width: f64,

        /// Height of the workspace in image coordinates.
        height: f64,
    },

    /// Pick the object at the given workspace coordinate and place it at the drop-off location
    /// for its class.
    #[structopt(name = "transport")]
    Transport {
        /// Horizontal pick coordinate.
        x: f64,

        /// Vertical pick coordinate.
        y: f64,

        /// Class of the object to be picked.
        object_id: u8,
    },

    /// Return the arm to its home pose.
    #[structopt(name = "home")]
    Home,

    /// Run through the demonstration poses.
    #[structopt(name = "demo")]
    Demo {
        /// Number of times to repeat the demonstration.
        #[structopt(default_value = "1")]
        repeat: u32,
    },
}

/// Direction of a jog command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JogDirection {
    Left,
    Right,
    Up,
    Down,
    Open,
    Close,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmCmd {
    /// Parse a command in the compact wire form (`S <w> <h>` or `T <x> <y> <id>`).
    pub fn from_wire(msg: &str) -> Result<Self, TcParseError> {
        let mut tokens = msg.split_whitespace();

        let cmd = tokens.next().ok_or(TcParseError::Empty)?;
        let args: Vec<&str> = tokens.collect();

        let parsed = match cmd {
            "S" => {
                check_arg_count(cmd, &args, 2)?;
                Ok(ArmCmd::SetWorkspace {
                    width: parse_num(args[0])?,
                    height: parse_num(args[1])?,
                })
            }
            "T" => {
                check_arg_count(cmd, &args, 3)?;
                Ok(ArmCmd::Transport {
                    x: parse_num(args[0])?,
                    y: parse_num(args[1])?,
                    object_id: parse_num(args[2])?,
                })
            }
            _ => Err(TcParseError::UnknownCommand(cmd.to_string())),
        }?;

        parsed.check_finite()
    }

    /// Parse a command in the command line form, e.g. `jog base left`.
    pub fn from_cli(line: &str) -> Result<Self, TcParseError> {
        if line.trim().is_empty() {
            return Err(TcParseError::Empty);
        }

        ArmCmd::from_iter_safe(std::iter::once("arm").chain(line.split_whitespace()))
            .map_err(|e| TcParseError::InvalidCommandLine(e.message))?
            .check_finite()
    }

    /// Parse a command from JSON.
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str::<Self>(json_str)
            .map_err(TcParseError::InvalidJson)?
            .check_finite()
    }

    /// Parse a line from any command source.
    ///
    /// Lines starting with `{` are treated as JSON, lines starting with a single upper case `S`
    /// or `T` token as the wire form, and anything else as the command line form.
    pub fn parse_line(line: &str) -> Result<Self, TcParseError> {
        let line = line.trim();

        if line.starts_with('{') {
            return Self::from_json(line);
        }

        match line.split_whitespace().next() {
            Some("S") | Some("T") => Self::from_wire(line),
            Some(_) => Self::from_cli(line),
            None => Err(TcParseError::Empty),
        }
    }

    /// Reject coordinates and sizes which are NaN or infinite.
    fn check_finite(self) -> Result<Self, TcParseError> {
        let values = match self {
            ArmCmd::SetWorkspace { width, height } => [width, height],
            ArmCmd::Transport { x, y, .. } => [x, y],
            _ => return Ok(self),
        };

        match values.iter().find(|v| !v.is_finite()) {
            Some(v) => Err(TcParseError::NonFiniteNumber(v.to_string())),
            None => Ok(self),
        }
    }

    /// True if the command drives the arm through the full transport macro.
    pub fn is_macro(&self) -> bool {
        matches!(self, ArmCmd::Transport { .. } | ArmCmd::Demo { .. })
    }
}

impl JogDirection {
    /// The sign of the angle change caused by this direction.
    ///
    /// Left, up and open decrease the joint angle, right, down and close increase it.
    pub fn sign(self) -> i32 {
        match self {
            JogDirection::Left | JogDirection::Up | JogDirection::Open => -1,
            JogDirection::Right | JogDirection::Down | JogDirection::Close => 1,
        }
    }

    /// Whether this direction makes sense for the given joint.
    pub fn applies_to(self, joint: JointId) -> bool {
        match joint {
            JointId::Base | JointId::WristRotation => {
                matches!(self, JogDirection::Left | JogDirection::Right)
            }
            JointId::Shoulder | JointId::Elbow | JointId::WristVertical => {
                matches!(self, JogDirection::Up | JogDirection::Down)
            }
            JointId::Gripper => matches!(self, JogDirection::Open | JogDirection::Close),
        }
    }
}

impl FromStr for JogDirection {
    type Err = TcParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(JogDirection::Left),
            "right" => Ok(JogDirection::Right),
            "up" => Ok(JogDirection::Up),
            "down" => Ok(JogDirection::Down),
            "open" => Ok(JogDirection::Open),
            "close" => Ok(JogDirection::Close),
            _ => Err(TcParseError::UnknownDirection(s.to_string())),
        }
    }
}

impl fmt::Display for JogDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JogDirection::Left => "left",
            JogDirection::Right => "right",
            JogDirection::Up => "up",
            JogDirection::Down => "down",
            JogDirection::Open => "open",
            JogDirection::Close => "close",
        };
        f.write_str(s)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn check_arg_count(cmd: &str, args: &[&str], expected: usize) -> Result<(), TcParseError> {
    if args.len() != expected {
        return Err(TcParseError::WrongArgCount {
            cmd: cmd.to_string(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn parse_num<T: FromStr>(s: &str) -> Result<T, TcParseError> {
    s.parse::<T>()
        .map_err(|_| TcParseError::InvalidNumber(s.to_string()))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_wire() {
        assert_eq!(
            ArmCmd::from_wire("S 1290 572").unwrap(),
            ArmCmd::SetWorkspace {
                width: 1290.0,
                height: 572.0
            }
        );
        assert_eq!(
            ArmCmd::from_wire("T 645 286 4").unwrap(),
            ArmCmd::Transport {
                x: 645.0,
                y: 286.0,
                object_id: 4
            }
        );

        assert!(matches!(ArmCmd::from_wire(""), Err(TcParseError::Empty)));
        assert!(matches!(
            ArmCmd::from_wire("T 1 2"),
            Err(TcParseError::WrongArgCount { expected: 3, found: 2, .. })
        ));
        assert!(matches!(
            ArmCmd::from_wire("T 1 2 cube"),
            Err(TcParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            ArmCmd::from_wire("X 1 2"),
            Err(TcParseError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let lines = [
            "T NaN 286 1",
            "T 645 inf 1",
            "S 1290 NaN",
            "transport NaN 286 1",
            "ws inf 572",
        ];
        for line in lines.iter() {
            assert!(
                matches!(ArmCmd::parse_line(line), Err(TcParseError::NonFiniteNumber(_))),
                "{} was accepted",
                line
            );
        }

        // Finite values outside the workspace are still valid commands
        assert!(ArmCmd::parse_line("T -10 99999 1").is_ok());
        assert!(ArmCmd::parse_line("home").is_ok());
    }

    #[test]
    fn test_from_cli() {
        assert_eq!(
            ArmCmd::from_cli("jog base left").unwrap(),
            ArmCmd::Jog {
                joint: JointId::Base,
                direction: JogDirection::Left
            }
        );
        assert_eq!(
            ArmCmd::from_cli("move 90,100,165,90,110,10").unwrap(),
            ArmCmd::Move {
                pose: JointPose::new(90, 100, 165, 90, 110, 10),
                step_delay_ms: 20
            }
        );
        assert_eq!(
            ArmCmd::from_cli("move 90,100,165,90,110,10 --step-delay-ms 30").unwrap(),
            ArmCmd::Move {
                pose: JointPose::new(90, 100, 165, 90, 110, 10),
                step_delay_ms: 30
            }
        );
        assert_eq!(ArmCmd::from_cli("home").unwrap(), ArmCmd::Home);
        assert_eq!(ArmCmd::from_cli("demo").unwrap(), ArmCmd::Demo { repeat: 1 });

        assert!(ArmCmd::from_cli("jog knee left").is_err());
        assert!(ArmCmd::from_cli("fly").is_err());
        assert!(matches!(ArmCmd::from_cli("  "), Err(TcParseError::Empty)));
    }

    #[test]
    fn test_parse_line_dispatch() {
        assert_eq!(
            ArmCmd::parse_line("T 10 20 1").unwrap(),
            ArmCmd::Transport {
                x: 10.0,
                y: 20.0,
                object_id: 1
            }
        );
        assert_eq!(
            ArmCmd::parse_line("transport 10 20 1").unwrap(),
            ArmCmd::Transport {
                x: 10.0,
                y: 20.0,
                object_id: 1
            }
        );

        let cmd = ArmCmd::Jog {
            joint: JointId::Gripper,
            direction: JogDirection::Close,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.starts_with('{'));
        assert_eq!(ArmCmd::parse_line(&json).unwrap(), cmd);
    }

    #[test]
    fn test_jog_direction() {
        assert_eq!(JogDirection::Open.sign(), -1);
        assert_eq!(JogDirection::Down.sign(), 1);
        assert!(JogDirection::Left.applies_to(JointId::Base));
        assert!(!JogDirection::Left.applies_to(JointId::Shoulder));
        assert!(JogDirection::Close.applies_to(JointId::Gripper));
        assert!(JogDirection::Up.applies_to(JointId::WristVertical));
        assert!(!JogDirection::Up.applies_to(JointId::WristRotation));
    }
}
