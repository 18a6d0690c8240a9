//! Camera and detector capabilities the rig is aimed with.
//!
//! Capture and inference live in vendor SDKs; this module only fixes the
//! shapes that cross into the crate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RigError;

/// Byte layout of one pixel, in memory order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Rgb888,
    Bgr888,
    /// 32-bit pixels as delivered by the camera: R, G, B, then one padding
    /// byte.
    Xrgb8888,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb888 | PixelFormat::Bgr888 => 3,
            PixelFormat::Xrgb8888 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { width: 640, height: 480, format: PixelFormat::Xrgb8888 }
    }
}

impl CameraConfig {
    pub fn frame_len(&self) -> Result<usize, RigError> {
        buffer_len(self.width, self.height, self.format)
    }
}

/// Bytes needed for a `width` x `height` buffer, failing instead of wrapping
/// where `usize` is 32 bits wide.
fn buffer_len(width: u32, height: u32, format: PixelFormat) -> Result<usize, RigError> {
    usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(w, h)| w.checked_mul(h))
        .and_then(|px| px.checked_mul(format.bytes_per_pixel()))
        .ok_or_else(|| RigError::InvalidFrame(format!("{width}x{height} {format:?} does not fit in memory")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub model_path: String,
    /// Square inference size the detector resizes frames to.
    pub image_size: u32,
    pub device: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self { model_path: "yolo12n_ncnn_model".into(), image_size: 320, device: "cpu".into() }
    }
}

/// Fixed-size pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self, RigError> {
        if width == 0 || height == 0 {
            return Err(RigError::InvalidFrame(format!("empty {width}x{height} frame")));
        }
        let expected = buffer_len(width, height, format)?;
        if data.len() != expected {
            return Err(RigError::InvalidFrame(format!(
                "{width}x{height} {format:?} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self { width, height, format, data })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn matches(&self, cfg: &CameraConfig) -> bool {
        self.width == cfg.width && self.height == cfg.height && self.format == cfg.format
    }

    /// Repacks the frame as 3-byte BGR, dropping any padding byte.
    pub fn to_bgr(&self) -> Frame {
        let data = match self.format {
            PixelFormat::Bgr888 => self.data.clone(),
            fmt => self
                .data
                .chunks_exact(fmt.bytes_per_pixel())
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect(),
        };
        Frame { width: self.width, height: self.height, format: PixelFormat::Bgr888, data }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: u32,
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

pub trait FrameSource {
    fn capture_frame(&mut self) -> Result<Frame, RigError>;
}

pub trait Detector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, RigError>;
    fn render_annotated(&self, frame: &Frame, detections: &[Detection]) -> Result<Frame, RigError>;
}

/// Captures one frame, converts it to BGR and runs the detector on it.
pub fn capture_and_detect<F, D>(source: &mut F, detector: &mut D) -> Result<(Frame, Vec<Detection>), RigError>
where
    F: FrameSource + ?Sized,
    D: Detector + ?Sized,
{
    let frame = source.capture_frame()?.to_bgr();
    let detections = detector.detect(&frame)?;
    debug!("detected {} objects", detections.len());
    Ok((frame, detections))
}
