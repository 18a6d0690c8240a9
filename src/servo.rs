use std::{
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use tracing::{debug, info, trace};

use crate::{config::AxisConfig, error::RigError, model::ChannelId, sink::PwmSink};

/// Timing of one sweep from `start` to `target`.
///
/// A sweep issues `steps` writes, each followed by a pause of `dt`. A plan
/// with a zero `dt` is an immediate jump: one write, no pause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPlan {
    pub start: f64,
    pub target: f64,
    pub steps: u64,
    pub dt: Duration,
}

impl SweepPlan {
    pub fn new(start: f64, target: f64, speed_deg_per_s: f64, step_period_s: f64) -> Result<Self, RigError> {
        if !target.is_finite() {
            return Err(RigError::InvalidAngle(target));
        }
        if !step_period_s.is_finite() || step_period_s <= 0.0 {
            return Err(RigError::config(format!("step period must be positive, got {step_period_s} s")));
        }

        let delta = target - start;
        let duration = if speed_deg_per_s > 0.0 { delta.abs() / speed_deg_per_s } else { 0.0 };
        if duration <= 0.0 {
            return Ok(Self { start, target, steps: 1, dt: Duration::ZERO });
        }

        let too_long = || {
            RigError::config(format!(
                "sweep of {delta} deg at {speed_deg_per_s} deg/s lasts {duration} s, longer than a timer can hold"
            ))
        };
        Duration::try_from_secs_f64(duration).map_err(|_| too_long())?;

        let steps = (duration / step_period_s).floor();
        // 2^64, the first step count a u64 cannot hold
        if steps >= 18_446_744_073_709_551_616.0 {
            return Err(too_long());
        }
        let steps = (steps as u64).max(1);
        let dt = Duration::try_from_secs_f64(duration / steps as f64).map_err(|_| too_long())?;
        Ok(Self { start, target, steps, dt })
    }

    pub fn is_immediate(&self) -> bool {
        self.dt.is_zero()
    }

    pub fn duration(&self) -> Duration {
        self.dt.mul_f64(self.steps as f64)
    }

    /// Angle commanded at step `i` (1-based). The last step lands exactly on
    /// the target.
    pub fn angle_at(&self, i: u64) -> f64 {
        if i >= self.steps {
            self.target
        } else {
            self.start + (self.target - self.start) * (i as f64 / self.steps as f64)
        }
    }
}

/// One servo on one PWM channel.
///
/// `current_angle` only ever holds an angle whose write succeeded.
pub struct ServoAxis<S: PwmSink> {
    sink: S,
    cfg: AxisConfig,
    current_deg: f64,
}

impl<S: PwmSink> ServoAxis<S> {
    /// Configures the sink frequency and drives the servo to its center.
    pub fn new(mut sink: S, cfg: AxisConfig) -> Result<Self, RigError> {
        cfg.validate()?;
        sink.set_frequency(cfg.calibration.freq_hz)?;

        let mut axis = Self { sink, cfg, current_deg: cfg.center_deg };
        axis.write(cfg.center_deg)?;
        info!(channel = %cfg.channel, center = cfg.center_deg, "servo axis ready");
        Ok(axis)
    }

    pub fn current_angle(&self) -> f64 {
        self.current_deg
    }

    pub fn channel(&self) -> ChannelId {
        self.cfg.channel
    }

    pub fn config(&self) -> &AxisConfig {
        &self.cfg
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn write(&mut self, angle: f64) -> Result<(), RigError> {
        let count = self.cfg.calibration.angle_to_count(angle);
        trace!(channel = %self.cfg.channel, angle, count, "servo step");
        self.sink.set_channel_count(self.cfg.channel, count)?;
        self.current_deg = angle;
        Ok(())
    }

    fn plan(&self, target: f64, speed_deg_per_s: f64, step_period_s: f64) -> Result<SweepPlan, RigError> {
        SweepPlan::new(self.current_deg, target, speed_deg_per_s, step_period_s)
    }

    /// Sweeps to `target` at `speed_deg_per_s`, blocking the calling thread
    /// for the whole sweep. A non-positive speed jumps straight to the target.
    pub fn move_to(&mut self, target: f64, speed_deg_per_s: f64) -> Result<(), RigError> {
        self.move_to_with_step(target, speed_deg_per_s, self.cfg.step_period_s)
    }

    pub fn move_to_with_step(
        &mut self,
        target: f64,
        speed_deg_per_s: f64,
        step_period_s: f64,
    ) -> Result<(), RigError> {
        let plan = self.plan(target, speed_deg_per_s, step_period_s)?;
        for i in 1..=plan.steps {
            self.write(plan.angle_at(i))?;
            if !plan.is_immediate() {
                thread::sleep(plan.dt);
            }
        }
        debug!(channel = %self.cfg.channel, target, steps = plan.steps, "servo move complete");
        Ok(())
    }

    pub fn move_to_center(&mut self, speed_deg_per_s: f64) -> Result<(), RigError> {
        self.move_to(self.cfg.center_deg, speed_deg_per_s)
    }

    pub fn move_by_angle(&mut self, delta_deg: f64, speed_deg_per_s: f64) -> Result<(), RigError> {
        self.move_to(self.current_deg + delta_deg, speed_deg_per_s)
    }

    /// Same sweep as [`move_to`](Self::move_to), yielding to the runtime
    /// between steps. Returns [`RigError::Cancelled`] once `stop` is set;
    /// the servo is left at the last angle written.
    pub async fn move_to_async(
        &mut self,
        target: f64,
        speed_deg_per_s: f64,
        stop: &AtomicBool,
    ) -> Result<(), RigError> {
        let plan = self.plan(target, speed_deg_per_s, self.cfg.step_period_s)?;
        for i in 1..=plan.steps {
            if stop.load(Ordering::Relaxed) {
                debug!(channel = %self.cfg.channel, at = self.current_deg, "servo move cancelled");
                return Err(RigError::Cancelled);
            }
            self.write(plan.angle_at(i))?;
            if !plan.is_immediate() {
                tokio::time::sleep(plan.dt).await;
            }
        }
        debug!(channel = %self.cfg.channel, target, steps = plan.steps, "servo move complete");
        Ok(())
    }
}
