mod common;

use std::sync::atomic::AtomicBool;

use common::{RecordingSink, Write};
use pan_tilt_rig::{AxisConfig, AxisKind, ChannelId, PanTiltRig, PulseCalibration, RigConfig, RigError};

const PAN: ChannelId = ChannelId(0);
const TILT: ChannelId = ChannelId(1);

fn fast_config() -> RigConfig {
    RigConfig {
        pan: AxisConfig { step_period_s: 0.003, ..AxisConfig::on_channel(0) },
        tilt: AxisConfig { step_period_s: 0.003, center_deg: 45.0, ..AxisConfig::on_channel(1) },
        default_speed_deg_per_s: 1000.0,
    }
}

fn rig() -> (PanTiltRig<RecordingSink>, RecordingSink) {
    let sink = RecordingSink::default();
    let rig = PanTiltRig::new(sink.clone(), sink.clone(), fast_config()).unwrap();
    (rig, sink)
}

#[test]
fn construction_centers_pan_then_tilt() {
    let (rig, sink) = rig();
    let cal = PulseCalibration::default();

    assert_eq!(rig.angles(), (90.0, 45.0));
    assert_eq!(
        sink.writes(),
        vec![
            Write::Frequency(50.0),
            Write::Count(PAN, cal.angle_to_count(90.0)),
            Write::Frequency(50.0),
            Write::Count(TILT, cal.angle_to_count(45.0)),
        ]
    );
}

#[test]
fn pan_sweep_finishes_before_tilt_starts() {
    let (mut rig, sink) = rig();
    sink.clear();

    rig.move_to(100.0, 55.0, 1000.0).unwrap();

    let channels = sink.channels();
    assert_eq!(channels, vec![PAN, PAN, PAN, TILT, TILT, TILT]);
    assert_eq!(rig.angles(), (100.0, 55.0));
}

#[test]
fn relative_moves_and_centering() {
    let (mut rig, _sink) = rig();

    rig.move_by_angles(-20.0, 10.0, 0.0).unwrap();
    assert_eq!(rig.angles(), (70.0, 55.0));

    rig.move_to_center(0.0).unwrap();
    assert_eq!(rig.angles(), (90.0, 45.0));
}

#[test]
fn failure_on_pan_leaves_tilt_untouched() {
    // two center writes, then one pan step, then failure
    let sink = RecordingSink::failing_after(3);
    let mut rig = PanTiltRig::new(sink.clone(), sink.clone(), fast_config()).unwrap();

    assert!(rig.move_to(100.0, 55.0, 1000.0).is_err());
    assert_eq!(rig.tilt().current_angle(), 45.0);
    assert_eq!(sink.counts(TILT).len(), 1);
}

#[test]
fn axes_on_one_channel_are_rejected() {
    let sink = RecordingSink::default();
    let cfg = RigConfig { tilt: AxisConfig::on_channel(0), ..RigConfig::default() };

    let err = PanTiltRig::new(sink.clone(), sink.clone(), cfg).err().unwrap();
    assert!(matches!(err, RigError::InvalidConfig(_)));
    assert!(sink.writes().is_empty());
}

#[test]
fn axis_lookup_by_kind() {
    let (mut rig, _sink) = rig();
    assert_eq!(rig.axis(AxisKind::Pan).channel(), PAN);
    assert_eq!(rig.axis(AxisKind::Tilt).channel(), TILT);

    rig.axis_mut(AxisKind::Tilt).move_to(10.0, 0.0).unwrap();
    assert_eq!(rig.angles(), (90.0, 10.0));
}

#[tokio::test]
async fn cancellable_move_keeps_sequential_order() {
    let (mut rig, sink) = rig();
    sink.clear();

    let stop = AtomicBool::new(false);
    rig.move_to_async(100.0, 55.0, 1000.0, &stop).await.unwrap();
    assert_eq!(sink.channels(), vec![PAN, PAN, PAN, TILT, TILT, TILT]);
}

#[tokio::test]
async fn concurrent_move_reaches_both_targets() {
    let (mut rig, sink) = rig();
    sink.clear();

    let stop = AtomicBool::new(false);
    rig.move_to_concurrent(100.0, 35.0, 1000.0, &stop).await.unwrap();

    let cal = PulseCalibration::default();
    let pan = sink.counts(PAN);
    let tilt = sink.counts(TILT);
    assert_eq!(pan.len(), 3);
    assert_eq!(tilt.len(), 3);
    assert!(pan.windows(2).all(|w| w[0] <= w[1]));
    assert!(tilt.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(pan.last(), Some(&cal.angle_to_count(100.0)));
    assert_eq!(tilt.last(), Some(&cal.angle_to_count(35.0)));
    assert_eq!(rig.angles(), (100.0, 35.0));

    // tilt's first write comes before pan's last when both sweep at once
    let channels = sink.channels();
    let first_tilt = channels.iter().position(|c| *c == TILT).unwrap();
    let last_pan = channels.iter().rposition(|c| *c == PAN).unwrap();
    assert!(first_tilt < last_pan);
}
