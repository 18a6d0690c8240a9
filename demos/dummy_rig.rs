use std::{thread, time::Duration};

use pan_tilt_rig::{start_motion_loop, LoggingPwmSink, MotionCommand, MotionLoopConfig, PanTiltRig, RigConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => RigConfig::load(path)?,
        None => RigConfig::default(),
    };

    let sink = LoggingPwmSink::new("demo");
    let rig = PanTiltRig::new(sink.clone(), sink.clone(), cfg)?;
    let handle = start_motion_loop(rig, MotionLoopConfig { concurrent_axes: true, ..MotionLoopConfig::default() })?;

    handle.push(MotionCommand::MoveTo { pan_deg: 45.0, tilt_deg: 120.0, speed: Some(90.0) })?;
    handle.push(MotionCommand::MoveBy { pan_delta: 30.0, tilt_delta: -15.0, speed: None })?;
    handle.push(MotionCommand::Center { speed: Some(180.0) })?;
    thread::sleep(Duration::from_millis(1500));

    let snap = handle.last_snapshot()?;
    println!(
        "after {} commands: pan {:.1} deg, tilt {:.1} deg ({} writes logged)",
        snap.completed,
        snap.pan_deg,
        snap.tilt_deg,
        sink.writes()
    );
    handle.shutdown()?;
    Ok(())
}
