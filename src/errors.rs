use serde::{Deserialize, Serialize};
use std::fmt;

/// Camera-facing errors surfaced by a frame source.
///
/// "No frame yet" is not an error; sources report that as `Ok(None)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CameraError {
    /// The user or platform refused camera access.
    PermissionDenied(String),
    /// No capture device matching the requested id exists.
    DeviceNotFound(String),
    /// The device exists but another process holds it.
    DeviceBusy(String),
    /// The stream died after it had been started.
    StreamError(String),
    /// The source could not be brought up at all.
    InitializationError(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CameraError::PermissionDenied(msg) => write!(f, "Camera permission denied: {}", msg),
            CameraError::DeviceNotFound(msg) => write!(f, "Camera not found: {}", msg),
            CameraError::DeviceBusy(msg) => write!(f, "Camera busy: {}", msg),
            CameraError::StreamError(msg) => write!(f, "Camera stream error: {}", msg),
            CameraError::InitializationError(msg) => {
                write!(f, "Camera initialization failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for CameraError {}

impl CameraError {
    /// Busy devices are worth retrying; everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CameraError::DeviceBusy(_))
    }

    /// Short operator guidance matching the failure class.
    pub fn user_hint(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied(_) => {
                "Camera access was denied. Allow camera access and try again."
            }
            CameraError::DeviceNotFound(_) => "No camera was found on this device.",
            CameraError::DeviceBusy(_) => {
                "The camera is in use by another application. Close it and try again."
            }
            CameraError::StreamError(_) | CameraError::InitializationError(_) => {
                "The camera stopped working. Try restarting the capture."
            }
        }
    }
}

impl From<std::io::Error> for CameraError {
    fn from(error: std::io::Error) -> Self {
        CameraError::StreamError(error.to_string())
    }
}
