use std::sync::atomic::AtomicBool;

use tracing::info;

use crate::{config::RigConfig, error::RigError, model::AxisKind, servo::ServoAxis, sink::PwmSink};

/// Pan and tilt servos, each on its own channel and its own sink handle.
pub struct PanTiltRig<S: PwmSink> {
    pan: ServoAxis<S>,
    tilt: ServoAxis<S>,
    default_speed_deg_per_s: f64,
}

impl<S: PwmSink> PanTiltRig<S> {
    /// Centers pan, then tilt.
    pub fn new(pan_sink: S, tilt_sink: S, cfg: RigConfig) -> Result<Self, RigError> {
        cfg.validate()?;
        let pan = ServoAxis::new(pan_sink, cfg.pan)?;
        let tilt = ServoAxis::new(tilt_sink, cfg.tilt)?;
        info!(pan = %cfg.pan.channel, tilt = %cfg.tilt.channel, "pan/tilt rig ready");
        Ok(Self { pan, tilt, default_speed_deg_per_s: cfg.default_speed_deg_per_s })
    }

    pub fn pan(&self) -> &ServoAxis<S> {
        &self.pan
    }

    pub fn tilt(&self) -> &ServoAxis<S> {
        &self.tilt
    }

    pub fn axis(&self, kind: AxisKind) -> &ServoAxis<S> {
        match kind {
            AxisKind::Pan => &self.pan,
            AxisKind::Tilt => &self.tilt,
        }
    }

    pub fn axis_mut(&mut self, kind: AxisKind) -> &mut ServoAxis<S> {
        match kind {
            AxisKind::Pan => &mut self.pan,
            AxisKind::Tilt => &mut self.tilt,
        }
    }

    pub fn pan_mut(&mut self) -> &mut ServoAxis<S> {
        &mut self.pan
    }

    pub fn tilt_mut(&mut self) -> &mut ServoAxis<S> {
        &mut self.tilt
    }

    /// `(pan, tilt)` in degrees.
    pub fn angles(&self) -> (f64, f64) {
        (self.pan.current_angle(), self.tilt.current_angle())
    }

    pub fn default_speed(&self) -> f64 {
        self.default_speed_deg_per_s
    }

    /// Pan completes its sweep before tilt starts.
    pub fn move_to(&mut self, pan_deg: f64, tilt_deg: f64, speed_deg_per_s: f64) -> Result<(), RigError> {
        self.pan.move_to(pan_deg, speed_deg_per_s)?;
        self.tilt.move_to(tilt_deg, speed_deg_per_s)
    }

    pub fn move_by_angles(&mut self, pan_delta: f64, tilt_delta: f64, speed_deg_per_s: f64) -> Result<(), RigError> {
        self.pan.move_by_angle(pan_delta, speed_deg_per_s)?;
        self.tilt.move_by_angle(tilt_delta, speed_deg_per_s)
    }

    pub fn move_to_center(&mut self, speed_deg_per_s: f64) -> Result<(), RigError> {
        self.pan.move_to_center(speed_deg_per_s)?;
        self.tilt.move_to_center(speed_deg_per_s)
    }

    /// Cancellable form of [`move_to`](Self::move_to), keeping pan-then-tilt order.
    pub async fn move_to_async(
        &mut self,
        pan_deg: f64,
        tilt_deg: f64,
        speed_deg_per_s: f64,
        stop: &AtomicBool,
    ) -> Result<(), RigError> {
        self.pan.move_to_async(pan_deg, speed_deg_per_s, stop).await?;
        self.tilt.move_to_async(tilt_deg, speed_deg_per_s, stop).await
    }

    /// Sweeps both axes at once. Writes are ordered within an axis only.
    pub async fn move_to_concurrent(
        &mut self,
        pan_deg: f64,
        tilt_deg: f64,
        speed_deg_per_s: f64,
        stop: &AtomicBool,
    ) -> Result<(), RigError> {
        let (pan, tilt) = (&mut self.pan, &mut self.tilt);
        tokio::try_join!(
            pan.move_to_async(pan_deg, speed_deg_per_s, stop),
            tilt.move_to_async(tilt_deg, speed_deg_per_s, stop),
        )?;
        Ok(())
    }
}
