use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::JoinHandle,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use tokio::{runtime, sync::mpsc, time};
use tracing::{debug, warn};

use crate::{error::RigError, rig::PanTiltRig, sink::PwmSink};

#[derive(Debug, Clone, Copy)]
pub struct MotionLoopConfig {
    /// How often an idle loop checks for a stop request.
    pub poll_period: Duration,
    pub channel_capacity: usize,
    /// Sweep pan and tilt at the same time instead of pan first.
    pub concurrent_axes: bool,
}

impl Default for MotionLoopConfig {
    fn default() -> Self {
        Self { poll_period: Duration::from_millis(10), channel_capacity: 32, concurrent_axes: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigSnapshot {
    pub pan_deg: f64,
    pub tilt_deg: f64,
    /// Commands finished so far, failed ones included.
    pub completed: u64,
    pub timestamp_s: f64,
}

/// Speeds are in degrees per second; `None` uses the rig's default speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCommand {
    MoveTo { pan_deg: f64, tilt_deg: f64, speed: Option<f64> },
    MoveBy { pan_delta: f64, tilt_delta: f64, speed: Option<f64> },
    Center { speed: Option<f64> },
}

pub struct MotionLoopHandle<S: PwmSink> {
    tx: mpsc::Sender<MotionCommand>,
    last_snapshot: Arc<Mutex<RigSnapshot>>,
    stop: Arc<AtomicBool>,
    thread: JoinHandle<PanTiltRig<S>>,
}

impl<S: PwmSink> MotionLoopHandle<S> {
    /// Queues a command from synchronous code. Must not be called from
    /// inside an async runtime; use [`send`](Self::send) there.
    pub fn push(&self, cmd: MotionCommand) -> Result<(), RigError> {
        self.tx.blocking_send(cmd).map_err(|_| RigError::Closed)
    }

    pub async fn send(&self, cmd: MotionCommand) -> Result<(), RigError> {
        self.tx.send(cmd).await.map_err(|_| RigError::Closed)
    }

    pub fn last_snapshot(&self) -> Result<RigSnapshot, RigError> {
        self.last_snapshot.lock().map(|s| *s).map_err(|_| RigError::Closed)
    }

    /// Asks the loop to stop. A sweep in progress is abandoned at its next step.
    pub fn close(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Stops the loop and hands the rig back once its thread has exited.
    pub fn shutdown(self) -> Result<PanTiltRig<S>, RigError> {
        self.close();
        drop(self.tx);
        self.thread.join().map_err(|_| RigError::Closed)
    }
}

fn now_s() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO).as_secs_f64()
}

async fn run_command<S: PwmSink>(
    rig: &mut PanTiltRig<S>,
    cmd: MotionCommand,
    concurrent: bool,
    stop: &AtomicBool,
) -> Result<(), RigError> {
    let (pan, tilt, speed) = match cmd {
        MotionCommand::MoveTo { pan_deg, tilt_deg, speed } => (pan_deg, tilt_deg, speed),
        MotionCommand::MoveBy { pan_delta, tilt_delta, speed } => {
            let (pan, tilt) = rig.angles();
            (pan + pan_delta, tilt + tilt_delta, speed)
        }
        MotionCommand::Center { speed } => {
            (rig.pan().config().center_deg, rig.tilt().config().center_deg, speed)
        }
    };
    let speed = speed.unwrap_or_else(|| rig.default_speed());

    if concurrent {
        rig.move_to_concurrent(pan, tilt, speed, stop).await
    } else {
        rig.move_to_async(pan, tilt, speed, stop).await
    }
}

/// Moves `rig` onto a background thread that executes queued commands in
/// order, one at a time. Failed commands are logged and skipped.
pub fn start_motion_loop<S: PwmSink>(
    mut rig: PanTiltRig<S>,
    cfg: MotionLoopConfig,
) -> Result<MotionLoopHandle<S>, RigError> {
    let rt = runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| RigError::Runtime(format!("motion loop runtime: {e}")))?;

    let (tx, mut rx) = mpsc::channel::<MotionCommand>(cfg.channel_capacity.max(1));
    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = Arc::clone(&stop);

    let (pan, tilt) = rig.angles();
    let snapshot = Arc::new(Mutex::new(RigSnapshot { pan_deg: pan, tilt_deg: tilt, completed: 0, timestamp_s: now_s() }));
    let snapshot_clone = Arc::clone(&snapshot);

    let thread = std::thread::spawn(move || {
        rt.block_on(async {
            let mut interval = time::interval(cfg.poll_period.max(Duration::from_millis(1)));
            let mut completed = 0u64;

            loop {
                tokio::select! {
                    cmd = rx.recv() => {
                        let Some(cmd) = cmd else { break };
                        match run_command(&mut rig, cmd, cfg.concurrent_axes, &stop_clone).await {
                            Ok(()) => {}
                            Err(RigError::Cancelled) => debug!("motion command {cmd:?} cancelled"),
                            Err(e) => warn!("motion command {cmd:?} failed: {e}"),
                        }
                        completed += 1;

                        let (pan, tilt) = rig.angles();
                        if let Ok(mut guard) = snapshot_clone.lock() {
                            *guard = RigSnapshot { pan_deg: pan, tilt_deg: tilt, completed, timestamp_s: now_s() };
                        }
                    }
                    _ = interval.tick() => {}
                }

                if stop_clone.load(Ordering::Relaxed) {
                    break;
                }
            }
            debug!("motion loop stopped");
        });
        rig
    });

    Ok(MotionLoopHandle { tx, last_snapshot: snapshot, stop, thread })
}
