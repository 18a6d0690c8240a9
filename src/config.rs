use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{conversion::PulseCalibration, error::RigError, model::ChannelId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    pub channel: ChannelId,
    pub center_deg: f64,
    /// Target interval between intermediate writes during a sweep.
    pub step_period_s: f64,
    pub calibration: PulseCalibration,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            channel: ChannelId(0),
            center_deg: 90.0,
            step_period_s: 0.02,
            calibration: PulseCalibration::default(),
        }
    }
}

impl AxisConfig {
    pub fn on_channel(channel: u8) -> Self {
        Self { channel: ChannelId(channel), ..Self::default() }
    }

    pub fn validate(&self) -> Result<(), RigError> {
        self.calibration.validate()?;
        if !self.center_deg.is_finite() {
            return Err(RigError::config("center angle must be finite"));
        }
        if !self.step_period_s.is_finite() || self.step_period_s <= 0.0 {
            return Err(RigError::config(format!(
                "step period must be positive, got {} s",
                self.step_period_s
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub pan: AxisConfig,
    pub tilt: AxisConfig,
    pub default_speed_deg_per_s: f64,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            pan: AxisConfig::on_channel(0),
            tilt: AxisConfig::on_channel(1),
            default_speed_deg_per_s: 60.0,
        }
    }
}

impl RigConfig {
    pub fn validate(&self) -> Result<(), RigError> {
        self.pan.validate()?;
        self.tilt.validate()?;
        if self.pan.channel == self.tilt.channel {
            return Err(RigError::config(format!(
                "pan and tilt both configured on channel {}",
                self.pan.channel
            )));
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<Self, RigError> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| RigError::config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| RigError::config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }
}
