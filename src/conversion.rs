use serde::{Deserialize, Serialize};

use crate::error::RigError;

/// Full cycle resolution of a 12-bit PWM counter.
pub const COUNTS_PER_CYCLE_12BIT: u16 = 4096;

/// Calibration mapping a servo angle onto a 12-bit PWM duty-cycle count.
///
/// Servo horns differ in travel and the PCA9685 boards in use disagree on
/// whether the cycle divisor is 4095 or 4096, so every value here is
/// injected per rig rather than fixed. Conversions assume the calibration
/// has passed [`validate`](Self::validate).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseCalibration {
    pub angle_min: f64,
    pub angle_max: f64,
    pub pulse_min_ms: f64,
    pub pulse_max_ms: f64,
    pub freq_hz: f64,
    pub counts_max: u16,
}

impl Default for PulseCalibration {
    fn default() -> Self {
        Self {
            angle_min: 0.0,
            angle_max: 180.0,
            pulse_min_ms: 1.0,
            pulse_max_ms: 2.0,
            freq_hz: 50.0,
            counts_max: COUNTS_PER_CYCLE_12BIT,
        }
    }
}

impl PulseCalibration {
    pub fn new(
        angle_min: f64,
        angle_max: f64,
        pulse_min_ms: f64,
        pulse_max_ms: f64,
        freq_hz: f64,
        counts_max: u16,
    ) -> Result<Self, RigError> {
        let cal = Self { angle_min, angle_max, pulse_min_ms, pulse_max_ms, freq_hz, counts_max };
        cal.validate()?;
        Ok(cal)
    }

    pub fn validate(&self) -> Result<(), RigError> {
        if !self.angle_min.is_finite() || !self.angle_max.is_finite() {
            return Err(RigError::config("angle range must be finite"));
        }
        if self.angle_min >= self.angle_max {
            return Err(RigError::config(format!(
                "angle range is degenerate: min {} >= max {}",
                self.angle_min, self.angle_max
            )));
        }
        if !self.freq_hz.is_finite() || self.freq_hz <= 0.0 {
            return Err(RigError::config(format!("PWM frequency must be positive, got {}", self.freq_hz)));
        }
        if self.counts_max == 0 || self.counts_max > COUNTS_PER_CYCLE_12BIT {
            return Err(RigError::config(format!(
                "counts_max must be in 1..={COUNTS_PER_CYCLE_12BIT}, got {}",
                self.counts_max
            )));
        }
        let period = self.period_ms();
        for pulse in [self.pulse_min_ms, self.pulse_max_ms] {
            if !pulse.is_finite() || pulse < 0.0 {
                return Err(RigError::config(format!("pulse width must be non-negative, got {pulse} ms")));
            }
            if pulse > period {
                return Err(RigError::config(format!(
                    "pulse width {pulse} ms exceeds the {period} ms PWM period"
                )));
            }
        }
        Ok(())
    }

    /// Length of one PWM cycle in milliseconds.
    pub fn period_ms(&self) -> f64 {
        1000.0 / self.freq_hz
    }

    pub fn clamp_angle(&self, angle: f64) -> f64 {
        angle.clamp(self.angle_min, self.angle_max)
    }

    /// Pulse width for `angle`, saturating outside the angle range.
    pub fn pulse_ms(&self, angle: f64) -> f64 {
        let angle = self.clamp_angle(angle);
        self.pulse_min_ms
            + (angle - self.angle_min) / (self.angle_max - self.angle_min)
                * (self.pulse_max_ms - self.pulse_min_ms)
    }

    /// Duty-cycle count for `angle`. The fractional count is truncated.
    pub fn angle_to_count(&self, angle: f64) -> u16 {
        let count = (self.pulse_ms(angle) / self.period_ms() * f64::from(self.counts_max)).floor();
        // `as` saturates and maps NaN to zero.
        (count as u16).min(self.counts_max)
    }
}

/// One-shot form of [`PulseCalibration::angle_to_count`].
pub fn angle_to_count(
    angle: f64,
    angle_min: f64,
    angle_max: f64,
    pulse_min_ms: f64,
    pulse_max_ms: f64,
    freq_hz: f64,
    counts_max: u16,
) -> Result<u16, RigError> {
    let cal = PulseCalibration::new(angle_min, angle_max, pulse_min_ms, pulse_max_ms, freq_hz, counts_max)?;
    Ok(cal.angle_to_count(angle))
}
