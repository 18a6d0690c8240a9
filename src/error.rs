use thiserror::Error;

use crate::model::ChannelId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RigError {
    #[error("PWM driver unavailable: {0}")]
    DriverUnavailable(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("write to channel {channel} failed: {reason}")]
    Write { channel: ChannelId, reason: String },
    #[error("angle must be finite, got {0}")]
    InvalidAngle(f64),
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("detector failure: {0}")]
    Detection(String),
    #[error("sweep cancelled")]
    Cancelled,
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("motion loop closed")]
    Closed,
}

impl RigError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        RigError::InvalidConfig(msg.into())
    }
}
