//! # Servo Controller Module
//!
//! This module provides the [`ActuatorPort`] used on real hardware. Each joint servo is driven by
//! one channel of a servo driver board, the angle demand being converted into a pulse width and
//! then a duty cycle.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ServoDriver`] implementation for the Adafruit PCA9685 16 channel servo driver board.
pub mod pca9685;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex};
use log::warn;
use serde::{Serialize, Deserialize};

use comms_if::eqpt::arm::{JointId, NUM_JOINTS};
use util::maths::{clamp, lin_map};

use crate::motion_ctrl::{bank_from_fn, ActuatorBank, ActuatorPort};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing servo driver boards.
pub trait ServoDriver {

    /// The type that the underlying driver uses for channel identification
    type Channel: Copy;

    /// Get the channel with the given index.
    fn channel(index: u8) -> Result<Self::Channel, ServoError>;

    /// Set the duty cycle of a channel.
    ///
    /// ## Arguments
    /// - `channel` - The channel to set the duty cycle for
    /// - `duty_cycle` - The duty cycle to set. Must be a value between 0.0 and 1.0. Values outside
    ///   this range will be rejected.
    fn set_duty_cycle(&mut self, channel: Self::Channel, duty_cycle: f64) -> Result<(), ServoError>;

}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Configuration of a single positional servo.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServoConfig {
    /// Index of the driver board channel the servo is connected to.
    pub channel: u8,

    /// Units: degrees
    pub min_angle_deg: f64,

    /// Units: degrees
    pub max_angle_deg: f64,

    /// Pulse width commanding `min_angle_deg`.
    ///
    /// Units: microseconds
    pub min_pulse_us: f64,

    /// Pulse width commanding `max_angle_deg`.
    ///
    /// Units: microseconds
    pub max_pulse_us: f64,

    /// PWM period of the driver board.
    ///
    /// Units: microseconds
    pub period_us: f64,
}

/// An actuator port driving one servo on a shared driver board.
pub struct ServoPort<D: ServoDriver> {
    joint: JointId,
    driver: Arc<Mutex<D>>,
    channel: D::Channel,
    config: ServoConfig,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum ServoError {
    #[error("An I2C error occured")]
    I2c,

    #[error("Duty cycle must be between 0.0 and 1.0")]
    InvalidDutyCycle,

    #[error("The driver has no channel {0}")]
    InvalidChannel(u8),

    #[error("Servo on channel {channel} is misconfigured: {reason}")]
    InvalidConfig {
        channel: u8,
        reason: &'static str,
    },
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Build one [`ServoPort`] per joint, all sharing the given driver board.
///
/// `configs` are in joint order (base, shoulder, elbow, wrist vertical, wrist rotation, gripper).
pub fn servo_bank<D>(driver: D, configs: &[ServoConfig; NUM_JOINTS]) -> Result<ActuatorBank, ServoError>
where
    D: ServoDriver + Send + 'static,
    D::Channel: Send + 'static,
{
    let mut channels = Vec::with_capacity(NUM_JOINTS);
    for config in configs.iter() {
        config.validate()?;
        channels.push(D::channel(config.channel)?);
    }

    let driver = Arc::new(Mutex::new(driver));

    Ok(bank_from_fn(|joint| {
        Box::new(ServoPort {
            joint,
            driver: driver.clone(),
            channel: channels[joint.index()],
            config: configs[joint.index()].clone(),
        })
    }))
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ServoConfig {
    /// Check that every angle maps to a duty cycle within `[0, 1]`.
    pub fn validate(&self) -> Result<(), ServoError> {
        let err = |reason: &'static str| -> Result<(), ServoError> {
            Err(ServoError::InvalidConfig {
                channel: self.channel,
                reason,
            })
        };

        let values = [
            self.min_angle_deg,
            self.max_angle_deg,
            self.min_pulse_us,
            self.max_pulse_us,
            self.period_us,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return err("values must be finite");
        }
        if self.min_angle_deg >= self.max_angle_deg {
            return err("min_angle_deg must be less than max_angle_deg");
        }
        if self.period_us <= 0.0 {
            return err("period_us must be positive");
        }
        if self.min_pulse_us < 0.0 || self.max_pulse_us < 0.0 {
            return err("pulse widths must not be negative");
        }
        if self.min_pulse_us > self.period_us || self.max_pulse_us > self.period_us {
            return err("pulse widths must fit within period_us");
        }

        Ok(())
    }

    /// Duty cycle which commands the given angle.
    ///
    /// Angles outside the servo's range are limited to it.
    pub fn duty_cycle(&self, angle_deg: i32) -> f64 {
        let angle = clamp(angle_deg as f64, self.min_angle_deg, self.max_angle_deg);

        let pulse_us = lin_map(
            (self.min_angle_deg, self.max_angle_deg),
            (self.min_pulse_us, self.max_pulse_us),
            angle
        );

        pulse_us / self.period_us
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            min_angle_deg: 0.0,
            max_angle_deg: 180.0,
            min_pulse_us: 544.0,
            max_pulse_us: 2400.0,
            period_us: 20_000.0,
        }
    }
}

impl<D: ServoDriver> ActuatorPort for ServoPort<D> {
    fn set_angle(&mut self, angle_deg: i32) {
        let duty_cycle = self.config.duty_cycle(angle_deg);

        let mut driver = match self.driver.lock() {
            Ok(d) => d,
            Err(_) => {
                warn!("Servo driver lock poisoned, {} not set", self.joint);
                return
            }
        };

        if let Err(e) = driver.set_duty_cycle(self.channel, duty_cycle) {
            warn!("Could not set {} to {} deg: {}", self.joint, angle_deg, e);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// Driver recording every duty cycle it is given, optionally failing every write.
    struct MockDriver {
        writes: Arc<Mutex<Vec<(u8, f64)>>>,
        fail: bool,
    }

    impl ServoDriver for MockDriver {
        type Channel = u8;

        fn channel(index: u8) -> Result<u8, ServoError> {
            if index < 16 {
                Ok(index)
            }
            else {
                Err(ServoError::InvalidChannel(index))
            }
        }

        fn set_duty_cycle(&mut self, channel: u8, duty_cycle: f64) -> Result<(), ServoError> {
            if self.fail {
                return Err(ServoError::I2c)
            }
            self.writes.lock().unwrap().push((channel, duty_cycle));
            Ok(())
        }
    }

    fn configs() -> [ServoConfig; NUM_JOINTS] {
        let mut configs: [ServoConfig; NUM_JOINTS] = Default::default();
        for (i, c) in configs.iter_mut().enumerate() {
            c.channel = 15 - i as u8;
            c.min_pulse_us = 500.0;
            c.max_pulse_us = 2500.0;
        }
        configs
    }

    #[test]
    fn test_duty_cycle() {
        let c = ServoConfig {
            min_pulse_us: 500.0,
            max_pulse_us: 2500.0,
            ..Default::default()
        };

        assert!((c.duty_cycle(0) - 0.025).abs() < 1e-9);
        assert!((c.duty_cycle(90) - 0.075).abs() < 1e-9);
        assert!((c.duty_cycle(180) - 0.125).abs() < 1e-9);

        // Limited to the servo range
        assert_eq!(c.duty_cycle(200), c.duty_cycle(180));
        assert_eq!(c.duty_cycle(-5), c.duty_cycle(0));
    }

    #[test]
    fn test_servo_bank() {
        let writes = Arc::new(Mutex::new(Vec::new()));
        let driver = MockDriver {
            writes: writes.clone(),
            fail: false,
        };

        let mut bank = servo_bank(driver, &configs()).unwrap();
        bank[JointId::Base.index()].set_angle(90);
        bank[JointId::Gripper.index()].set_angle(0);

        let writes = writes.lock().unwrap();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, 15);
        assert!((writes[0].1 - 0.075).abs() < 1e-9);
        assert_eq!(writes[1].0, 10);
        assert!((writes[1].1 - 0.025).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_channel() {
        let mut c = configs();
        c[2].channel = 16;

        let driver = MockDriver {
            writes: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        };

        assert!(matches!(servo_bank(driver, &c), Err(ServoError::InvalidChannel(16))));
    }

    #[test]
    fn test_invalid_config() {
        assert!(ServoConfig::default().validate().is_ok());

        let bad = [
            ServoConfig { max_angle_deg: 0.0, ..Default::default() },
            ServoConfig { period_us: 0.0, ..Default::default() },
            ServoConfig { max_pulse_us: 25_000.0, ..Default::default() },
            ServoConfig { min_pulse_us: f64::NAN, ..Default::default() },
        ];
        for c in bad.iter() {
            assert!(
                matches!(c.validate(), Err(ServoError::InvalidConfig { .. })),
                "{:?} accepted",
                c
            );
        }

        // Rejected when the bank is built, before any write
        let writes = Arc::new(Mutex::new(Vec::new()));
        let driver = MockDriver {
            writes: writes.clone(),
            fail: false,
        };
        let mut c = configs();
        c[4].period_us = 0.0;

        assert!(matches!(
            servo_bank(driver, &c),
            Err(ServoError::InvalidConfig { channel: 11, .. })
        ));
        assert!(writes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_driver_errors_not_propagated() {
        let driver = MockDriver {
            writes: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        };

        let mut bank = servo_bank(driver, &configs()).unwrap();

        // Logged and ignored
        bank[0].set_angle(45);
    }
}
