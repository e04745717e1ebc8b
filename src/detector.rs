//! Face detector abstraction.
//!
//! The detection model is an external collaborator: the session loads it once,
//! feeds it sampled frames, and disposes of it on teardown. Zero faces and
//! multiple faces are ordinary detection results, never errors.

use crate::types::{FaceDetection, VideoFrame};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
    /// The feed has no decodable frame yet. Transient; does not count
    /// against the session's error budget.
    #[error("video not ready")]
    VideoNotReady,

    /// `detect` was called before `load_model` succeeded.
    #[error("detection model not loaded")]
    ModelNotLoaded,

    /// The model could not be loaded at all.
    #[error("failed to load detection model: {0}")]
    ModelLoad(String),

    /// The backend failed on a frame it should have handled.
    #[error("detection backend error: {0}")]
    Backend(String),
}

impl DetectionError {
    /// Transient errors decay the consecutive-error counter instead of
    /// incrementing it.
    pub fn is_transient(&self) -> bool {
        matches!(self, DetectionError::VideoNotReady)
    }
}

/// A pluggable face detection backend.
pub trait FaceDetector: Send {
    /// Load model weights. Must succeed before `detect` is usable.
    fn load_model(&mut self) -> Result<(), DetectionError>;

    /// Detect faces in a frame. Returns every face found, possibly none.
    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<FaceDetection>, DetectionError>;

    /// Release model resources. Safe to call more than once.
    fn dispose(&mut self);

    fn is_loaded(&self) -> bool;
}
