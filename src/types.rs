//! Core value types shared across the capture pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single RGB24 frame pulled from the live video source.
#[derive(Debug, Clone, Serialize)]
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub device_id: String,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
}

impl VideoFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, device_id: String) -> Self {
        Self {
            data,
            width,
            height,
            device_id,
            sequence: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Frame carries a complete RGB24 buffer for its stated dimensions.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width as usize * self.height as usize * 3)
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Mean luminance of a pixel, averaged channels (0-255 scale).
    #[inline]
    pub(crate) fn luma_at(&self, x: u32, y: u32) -> f32 {
        let idx = ((y * self.width + x) * 3) as usize;
        (self.data[idx] as f32 + self.data[idx + 1] as f32 + self.data[idx + 2] as f32) / 3.0
    }
}

/// Face bounding box in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FaceBox {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Longest side of the box, used for size gating.
    pub fn span(&self) -> f32 {
        self.width.max(self.height)
    }
}

/// One detected face as reported by the detector backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDetection {
    pub bounding_box: FaceBox,
    /// Detector confidence that this is a face, 0-1. None when the
    /// backend does not expose per-face scores.
    pub confidence: Option<f32>,
}

impl FaceDetection {
    pub fn new(bounding_box: FaceBox, confidence: f32) -> Self {
        Self {
            bounding_box,
            confidence: Some(confidence),
        }
    }
}

/// Where the face sits relative to the frame, recomputed every sampled frame.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FacePosition {
    pub center_x: f32,
    pub center_y: f32,
    pub width: f32,
    pub height: f32,
    /// Signed pixel offset of the face center from the frame center.
    pub offset_x: f32,
    pub offset_y: f32,
    /// Absolute offset normalized by the frame dimensions (0 = centered).
    pub normalized_offset_x: f32,
    pub normalized_offset_y: f32,
}

impl FacePosition {
    pub fn from_box(bbox: &FaceBox, frame_width: u32, frame_height: u32) -> Self {
        let (center_x, center_y) = bbox.center();
        let offset_x = center_x - frame_width as f32 / 2.0;
        let offset_y = center_y - frame_height as f32 / 2.0;
        Self {
            center_x,
            center_y,
            width: bbox.width,
            height: bbox.height,
            offset_x,
            offset_y,
            normalized_offset_x: offset_x.abs() / frame_width as f32,
            normalized_offset_y: offset_y.abs() / frame_height as f32,
        }
    }
}

/// Per-frame quality verdict for a single detected face.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FaceQuality {
    pub is_centered: bool,
    pub is_valid_size: bool,
    pub is_good_quality: bool,
    /// Composite 0-1 score.
    pub score: f32,
}

/// One accepted enrollment capture. Immutable after creation; owned by the
/// gallery until removal or successful submission.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub frame: VideoFrame,
    pub quality_score: f32,
    pub detection_confidence: f32,
    pub captured_at: DateTime<Utc>,
}

/// Progress milestone the session is currently in, derived from the 0-100
/// progress counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStep {
    Detecting,
    Aligning,
    Capturing,
    Completed,
}

impl CaptureStep {
    pub const ALIGNING_THRESHOLD: u8 = 30;
    pub const CAPTURING_THRESHOLD: u8 = 60;
    pub const COMPLETED_THRESHOLD: u8 = 90;

    pub fn from_progress(progress: u8) -> Self {
        match progress {
            p if p >= Self::COMPLETED_THRESHOLD => CaptureStep::Completed,
            p if p >= Self::CAPTURING_THRESHOLD => CaptureStep::Capturing,
            p if p >= Self::ALIGNING_THRESHOLD => CaptureStep::Aligning,
            _ => CaptureStep::Detecting,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureStep::Detecting => "detecting",
            CaptureStep::Aligning => "aligning",
            CaptureStep::Capturing => "capturing",
            CaptureStep::Completed => "completed",
        }
    }
}
