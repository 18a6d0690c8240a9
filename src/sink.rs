use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tracing::{debug, info, warn};

use crate::{error::RigError, model::ChannelId};

/// Something that can hold a PWM duty cycle on an output channel.
pub trait PwmSink: Send + 'static {
    fn set_frequency(&mut self, hz: f64) -> Result<(), RigError>;
    fn set_channel_count(&mut self, channel: ChannelId, count: u16) -> Result<(), RigError>;
}

impl<S: PwmSink + ?Sized> PwmSink for Box<S> {
    fn set_frequency(&mut self, hz: f64) -> Result<(), RigError> {
        (**self).set_frequency(hz)
    }

    fn set_channel_count(&mut self, channel: ChannelId, count: u16) -> Result<(), RigError> {
        (**self).set_channel_count(channel, count)
    }
}

/// Stand-in sink for machines without the PWM board. Accepts every call,
/// logs it and moves nothing.
#[derive(Debug, Clone)]
pub struct LoggingPwmSink {
    label: String,
    writes: Arc<AtomicUsize>,
}

impl LoggingPwmSink {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        warn!(sink = %label, "no PWM hardware in use, servo commands will only be logged");
        Self { label, writes: Arc::new(AtomicUsize::new(0)) }
    }

    /// Number of channel writes accepted so far, across clones.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }
}

impl PwmSink for LoggingPwmSink {
    fn set_frequency(&mut self, hz: f64) -> Result<(), RigError> {
        info!(sink = %self.label, hz, "set PWM frequency");
        Ok(())
    }

    fn set_channel_count(&mut self, channel: ChannelId, count: u16) -> Result<(), RigError> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!(sink = %self.label, %channel, count, "set channel count");
        Ok(())
    }
}
