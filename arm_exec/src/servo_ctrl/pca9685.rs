//! [`ServoDriver`] implementation for the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use pwm_pca9685::{Address, Channel, Pca9685};
use embedded_hal::blocking::i2c::{Write, WriteRead};
use serde::{Serialize, Deserialize};

use super::{ServoDriver, ServoError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of counts in one PWM period.
const MAX_PWM: u16 = 4096;

/// Frequency of the board's internal oscillator.
///
/// Units: hertz
const OSC_FREQ_HZ: f64 = 25_000_000.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Settings of a PCA9685 board.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BoardConfig {
    /// Index of the I2C bus the board is on.
    pub i2c_bus: u8,

    /// 7 bit I2C address of the board.
    pub address: u8,

    /// PWM period, must match the servo configurations.
    ///
    /// Units: microseconds
    pub period_us: f64,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Set up a PCA9685 board on the given bus with the configured PWM period, and enable its
/// outputs.
pub fn init_board<I2C, E>(i2c: I2C, config: &BoardConfig) -> Result<Pca9685<I2C>, ServoError>
where
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    let mut pwm = Pca9685::new(i2c, Address::from(config.address))
        .map_err(map_err)?;

    pwm.set_prescale(prescale(config.period_us)).map_err(map_err)?;
    pwm.enable().map_err(map_err)?;

    Ok(pwm)
}

/// Prescale value giving the requested PWM period.
///
/// The board only accepts prescales from 3 upwards.
pub fn prescale(period_us: f64) -> u8 {
    let freq_hz = 1e6 / period_us;
    let p = (OSC_FREQ_HZ / (MAX_PWM as f64 * freq_hz)).round() - 1.0;

    p.max(3.0).min(255.0) as u8
}

fn map_err<E>(e: pwm_pca9685::Error<E>) -> ServoError {
    match e {
        pwm_pca9685::Error::I2C(_) => ServoError::I2c,
        pwm_pca9685::Error::InvalidInputData => ServoError::InvalidDutyCycle,
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            address: 0x40,
            period_us: 20_000.0,
        }
    }
}

impl<I2C, E> ServoDriver for Pca9685<I2C>
where 
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    type Channel = Channel;

    fn channel(index: u8) -> Result<Self::Channel, ServoError> {
        let channel = match index {
            0 => Channel::C0,
            1 => Channel::C1,
            2 => Channel::C2,
            3 => Channel::C3,
            4 => Channel::C4,
            5 => Channel::C5,
            6 => Channel::C6,
            7 => Channel::C7,
            8 => Channel::C8,
            9 => Channel::C9,
            10 => Channel::C10,
            11 => Channel::C11,
            12 => Channel::C12,
            13 => Channel::C13,
            14 => Channel::C14,
            15 => Channel::C15,
            _ => return Err(ServoError::InvalidChannel(index))
        };

        Ok(channel)
    }

    fn set_duty_cycle(
        &mut self, 
        channel: Self::Channel, 
        duty_cycle: f64
    ) -> Result<(), ServoError> {

        // If the duty cycle is out of range return an error
        if !(0.0..=1.0).contains(&duty_cycle) {
            return Err(ServoError::InvalidDutyCycle)
        }

        // On at count 0, off after the duty cycle. The last valid count is MAX_PWM - 1.
        let off = (duty_cycle * (MAX_PWM - 1) as f64).round() as u16;

        self.set_channel_on_off(channel, 0, off).map_err(map_err)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_prescale() {
        // 50 Hz is the usual servo frequency
        assert_eq!(prescale(20_000.0), 121);

        // Very fast periods are limited by the hardware
        assert_eq!(prescale(100.0), 3);
    }
}
