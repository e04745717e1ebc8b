use crate::detector::DetectionError;
use crate::errors::CameraError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionErrorKind {
    Closed,
    Stopped,
    AlreadyRunning,
    ModelLoad,
    Camera,
    DetectionFailed,
    InvalidArgument,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub message: String,
}

impl SessionError {
    pub fn closed() -> Self {
        Self {
            kind: SessionErrorKind::Closed,
            message: "session is closed".to_string(),
        }
    }

    pub fn stopped() -> Self {
        Self {
            kind: SessionErrorKind::Stopped,
            message: "session is stopped".to_string(),
        }
    }

    pub fn already_running() -> Self {
        Self {
            kind: SessionErrorKind::AlreadyRunning,
            message: "session is already running".to_string(),
        }
    }

    pub fn model_load(error: DetectionError) -> Self {
        Self {
            kind: SessionErrorKind::ModelLoad,
            message: error.to_string(),
        }
    }

    pub fn camera(error: CameraError) -> Self {
        Self {
            kind: SessionErrorKind::Camera,
            message: error.to_string(),
        }
    }

    pub fn detection_failed(consecutive: u32) -> Self {
        Self {
            kind: SessionErrorKind::DetectionFailed,
            message: format!("face detection failed {} times in a row", consecutive),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self {
            kind: SessionErrorKind::InvalidArgument,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SessionError {}
