#![allow(dead_code)]

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

use pan_tilt_rig::{ChannelId, MotionLoopHandle, PwmSink, RigError, RigSnapshot};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Write {
    Frequency(f64),
    Count(ChannelId, u16),
}

/// Records every call into a log that clones share, so writes from both
/// axes land in one ordered sequence.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub log: Arc<Mutex<Vec<Write>>>,
    pub fail_writes: Arc<AtomicBool>,
    /// Channel writes left before every further write fails.
    pub writes_left: Option<Arc<AtomicUsize>>,
}

impl RecordingSink {
    pub fn failing_after(n: usize) -> Self {
        Self { writes_left: Some(Arc::new(AtomicUsize::new(n))), ..Self::default() }
    }

    pub fn writes(&self) -> Vec<Write> {
        self.log.lock().unwrap().clone()
    }

    pub fn counts(&self, channel: ChannelId) -> Vec<u16> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                Write::Count(ch, count) if ch == channel => Some(count),
                _ => None,
            })
            .collect()
    }

    pub fn channels(&self) -> Vec<ChannelId> {
        self.writes()
            .into_iter()
            .filter_map(|w| match w {
                Write::Count(ch, _) => Some(ch),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

impl PwmSink for RecordingSink {
    fn set_frequency(&mut self, hz: f64) -> Result<(), RigError> {
        self.log.lock().unwrap().push(Write::Frequency(hz));
        Ok(())
    }

    fn set_channel_count(&mut self, channel: ChannelId, count: u16) -> Result<(), RigError> {
        let exhausted = match &self.writes_left {
            Some(left) => left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_err(),
            None => false,
        };
        if exhausted || self.fail_writes.load(Ordering::SeqCst) {
            return Err(RigError::Write { channel, reason: "injected failure".into() });
        }
        self.log.lock().unwrap().push(Write::Count(channel, count));
        Ok(())
    }
}

/// Sink that cannot reach its device.
pub struct AbsentSink;

impl PwmSink for AbsentSink {
    fn set_frequency(&mut self, _hz: f64) -> Result<(), RigError> {
        Err(RigError::DriverUnavailable("no device at 0x40".into()))
    }

    fn set_channel_count(&mut self, _channel: ChannelId, _count: u16) -> Result<(), RigError> {
        Err(RigError::DriverUnavailable("no device at 0x40".into()))
    }
}

pub fn wait_for_completed<S: PwmSink>(handle: &MotionLoopHandle<S>, completed: u64) -> RigSnapshot {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let snap = handle.last_snapshot().unwrap();
        if snap.completed >= completed {
            return snap;
        }
        assert!(Instant::now() < deadline, "motion loop stalled at {snap:?}");
        thread::sleep(Duration::from_millis(2));
    }
}
