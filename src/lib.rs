pub mod config;
pub mod conversion;
pub mod error;
pub mod model;
pub mod motion_loop;
pub mod rig;
pub mod servo;
pub mod sink;
#[cfg(feature = "hardware")]
pub mod sink_pca9685;
pub mod vision;

#[cfg(feature = "python")]
mod python;

pub use config::{AxisConfig, RigConfig};
pub use conversion::{angle_to_count, PulseCalibration};
pub use error::RigError;
pub use model::{AxisKind, ChannelId};
pub use motion_loop::{start_motion_loop, MotionCommand, MotionLoopConfig, MotionLoopHandle, RigSnapshot};
pub use rig::PanTiltRig;
pub use servo::{ServoAxis, SweepPlan};
pub use sink::{LoggingPwmSink, PwmSink};
#[cfg(feature = "hardware")]
pub use sink_pca9685::{Pca9685Config, Pca9685Sink};
pub use vision::{
    capture_and_detect, BoundingBox, CameraConfig, Detection, Detector, DetectorConfig, Frame, FrameSource,
    PixelFormat,
};
