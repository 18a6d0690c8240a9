use std::sync::{Arc, Mutex};

use pwm_pca9685::{Channel, Pca9685};
use rppal::i2c::I2c;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{error::RigError, model::ChannelId, sink::PwmSink};

const MAX_OFF_COUNT: u16 = 4095;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pca9685Config {
    /// I2C bus number, `/dev/i2c-<bus>`.
    pub bus: u8,
    /// 7-bit chip address as reported by `i2cdetect -y <bus>`.
    pub address: u8,
    pub oscillator_hz: f64,
}

impl Default for Pca9685Config {
    fn default() -> Self {
        Self { bus: 1, address: 0x40, oscillator_hz: 25_000_000.0 }
    }
}

/// Prescale register value giving `hz` on a chip clocked at `oscillator_hz`.
pub fn prescale_for(oscillator_hz: f64, hz: f64) -> Result<u8, RigError> {
    if !hz.is_finite() || hz <= 0.0 {
        return Err(RigError::config(format!("PWM frequency must be positive, got {hz}")));
    }
    let prescale = (oscillator_hz / (4096.0 * hz)).round() - 1.0;
    Ok(prescale.clamp(3.0, 255.0) as u8)
}

fn channel(id: ChannelId) -> Result<Channel, RigError> {
    Ok(match id.0 {
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
        other => return Err(RigError::config(format!("PCA9685 has no channel {other}"))),
    })
}

/// PCA9685 on a Linux I2C bus. Clones share the chip so that each axis can
/// hold its own handle to a different channel.
#[derive(Clone)]
pub struct Pca9685Sink {
    chip: Arc<Mutex<Pca9685<I2c>>>,
    oscillator_hz: f64,
}

impl Pca9685Sink {
    pub fn open(cfg: Pca9685Config) -> Result<Self, RigError> {
        let i2c = I2c::with_bus(cfg.bus)
            .map_err(|e| RigError::DriverUnavailable(format!("i2c bus {}: {e}", cfg.bus)))?;
        let mut chip = Pca9685::new(i2c, cfg.address)
            .map_err(|e| RigError::DriverUnavailable(format!("PCA9685 at {:#04x}: {e:?}", cfg.address)))?;
        chip.enable()
            .map_err(|e| RigError::DriverUnavailable(format!("PCA9685 at {:#04x}: {e:?}", cfg.address)))?;

        info!(bus = cfg.bus, address = cfg.address, "PCA9685 initialized");
        Ok(Self { chip: Arc::new(Mutex::new(chip)), oscillator_hz: cfg.oscillator_hz })
    }
}

impl PwmSink for Pca9685Sink {
    fn set_frequency(&mut self, hz: f64) -> Result<(), RigError> {
        let prescale = prescale_for(self.oscillator_hz, hz)?;
        let mut chip = self
            .chip
            .lock()
            .map_err(|_| RigError::DriverUnavailable("PCA9685 handle poisoned".into()))?;
        chip.set_prescale(prescale)
            .map_err(|e| RigError::DriverUnavailable(format!("set prescale {prescale}: {e:?}")))
    }

    fn set_channel_count(&mut self, id: ChannelId, count: u16) -> Result<(), RigError> {
        let ch = channel(id)?;
        let mut chip = self.chip.lock().map_err(|_| RigError::Write {
            channel: id,
            reason: "PCA9685 handle poisoned".into(),
        })?;
        chip.set_channel_on_off(ch, 0, count.min(MAX_OFF_COUNT))
            .map_err(|e| RigError::Write { channel: id, reason: format!("{e:?}") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prescale_for_servo_rate() {
        // 25 MHz / (4096 * 50 Hz) = 122.07
        assert_eq!(prescale_for(25_000_000.0, 50.0).unwrap(), 121);
    }

    #[test]
    fn prescale_is_clamped_to_chip_limits() {
        assert_eq!(prescale_for(25_000_000.0, 10_000.0).unwrap(), 3);
        assert_eq!(prescale_for(25_000_000.0, 1.0).unwrap(), 255);
        assert!(prescale_for(25_000_000.0, 0.0).is_err());
    }

    #[test]
    fn channel_range() {
        assert!(channel(ChannelId(15)).is_ok());
        assert!(matches!(channel(ChannelId(16)), Err(RigError::InvalidConfig(_))));
    }
}
