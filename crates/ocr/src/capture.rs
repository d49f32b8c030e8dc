use std::fmt;
use thiserror::Error;

use crate::types::RawImage;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Cannot {action} while capture is {state}")]
    InvalidTransition { action: &'static str, state: &'static str },
}

/// Lifecycle of a capture device, owned by whoever drives the device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CaptureState {
    #[default]
    Inactive,
    Previewing,
    /// A frame was taken and awaits acceptance or a retake.
    Captured(RawImage),
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Inactive => "inactive",
            CaptureState::Previewing => "previewing",
            CaptureState::Captured(_) => "captured",
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, CaptureState::Inactive)
    }

    pub fn activate(&mut self) -> Result<(), CaptureError> {
        match self {
            CaptureState::Inactive => {
                *self = CaptureState::Previewing;
                Ok(())
            }
            _ => Err(self.refuse("activate")),
        }
    }

    pub fn capture(&mut self, frame: RawImage) -> Result<(), CaptureError> {
        match self {
            CaptureState::Previewing => {
                *self = CaptureState::Captured(frame);
                Ok(())
            }
            _ => Err(self.refuse("capture")),
        }
    }

    /// Hand over the captured frame and switch the device off.
    pub fn accept(&mut self) -> Result<RawImage, CaptureError> {
        match std::mem::take(self) {
            CaptureState::Captured(frame) => Ok(frame),
            other => {
                *self = other;
                Err(self.refuse("accept"))
            }
        }
    }

    /// Discard the captured frame and go back to previewing.
    pub fn retake(&mut self) -> Result<(), CaptureError> {
        match self {
            CaptureState::Captured(_) => {
                *self = CaptureState::Previewing;
                Ok(())
            }
            _ => Err(self.refuse("retake")),
        }
    }

    pub fn deactivate(&mut self) {
        *self = CaptureState::Inactive;
    }

    fn refuse(&self, action: &'static str) -> CaptureError {
        CaptureError::InvalidTransition { action, state: self.name() }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
