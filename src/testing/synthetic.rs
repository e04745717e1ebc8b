//! Synthetic test data and scripted pipeline doubles.
//!
//! Pattern frames exercise the quality analyzers with known-good and
//! known-bad pixel statistics; the scripted source and detector replay
//! canned sequences so session behavior is reproducible tick by tick.

use crate::detector::{DetectionError, FaceDetector};
use crate::errors::CameraError;
use crate::feedback::{FeedbackEvent, FeedbackSink};
use crate::camera::FrameSource;
use crate::types::{FaceBox, FaceDetection, VideoFrame};
use std::collections::VecDeque;

/// Pixel pattern for a synthetic frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePattern {
    /// Uniform gray at the given level. Zero contrast, zero sharpness.
    Flat(u8),
    /// Alternating light/dark pixels around mid-gray: balanced exposure
    /// and very high sharpness.
    Checkerboard,
    /// Smooth horizontal luminance ramp.
    Gradient,
    /// Uniform near-black.
    Dark,
    /// Uniform near-white.
    Bright,
}

/// Create a synthetic RGB24 frame with the requested statistics.
pub fn pattern_frame(width: u32, height: u32, pattern: FramePattern) -> VideoFrame {
    let mut data = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            let value = match pattern {
                FramePattern::Flat(v) => v,
                FramePattern::Checkerboard => {
                    if (x + y) % 2 == 0 {
                        188
                    } else {
                        68
                    }
                }
                FramePattern::Gradient => ((x * 255) / width.max(1)) as u8,
                FramePattern::Dark => 15,
                FramePattern::Bright => 245,
            };
            data[idx] = value;
            data[idx + 1] = value;
            data[idx + 2] = value;
        }
    }
    VideoFrame::new(data, width, height, "synthetic".to_string())
}

/// A face box centered in a `width` x `height` frame, spanning the given
/// fraction of the shorter dimension.
pub fn centered_face(width: u32, height: u32, span_fraction: f32) -> FaceDetection {
    let span = width.min(height) as f32 * span_fraction;
    FaceDetection::new(
        FaceBox {
            x: width as f32 / 2.0 - span / 2.0,
            y: height as f32 / 2.0 - span / 2.0,
            width: span,
            height: span,
        },
        0.92,
    )
}

/// A face box shifted from center by the given fraction of the frame width.
pub fn offset_face(width: u32, height: u32, span_fraction: f32, offset_fraction: f32) -> FaceDetection {
    let mut detection = centered_face(width, height, span_fraction);
    detection.bounding_box.x += width as f32 * offset_fraction;
    detection
}

/// Frame source replaying a fixed sequence, then repeating its last frame.
pub struct ScriptedSource {
    frames: VecDeque<VideoFrame>,
    last: Option<VideoFrame>,
    started: bool,
    start_error: Option<CameraError>,
}

impl ScriptedSource {
    pub fn new(frames: Vec<VideoFrame>) -> Self {
        Self {
            frames: frames.into(),
            last: None,
            started: false,
            start_error: None,
        }
    }

    /// Fail the next `start` call with this error.
    pub fn failing_with(error: CameraError) -> Self {
        Self {
            frames: VecDeque::new(),
            last: None,
            started: false,
            start_error: Some(error),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn start(&mut self) -> Result<(), CameraError> {
        if let Some(error) = self.start_error.take() {
            return Err(error);
        }
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.started = false;
    }

    fn try_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
        if !self.started {
            return Ok(None);
        }
        if let Some(frame) = self.frames.pop_front() {
            self.last = Some(frame.clone());
            Ok(Some(frame))
        } else {
            Ok(self.last.clone())
        }
    }

    fn device_id(&self) -> &str {
        "synthetic"
    }
}

/// Detector replaying a fixed sequence of results, then repeating the last.
pub struct ScriptedDetector {
    script: VecDeque<Result<Vec<FaceDetection>, DetectionError>>,
    last: Option<Vec<FaceDetection>>,
    loaded: bool,
    load_error: Option<DetectionError>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Result<Vec<FaceDetection>, DetectionError>>) -> Self {
        Self {
            script: script.into(),
            last: None,
            loaded: false,
            load_error: None,
        }
    }

    /// Always report the same detections.
    pub fn constant(detections: Vec<FaceDetection>) -> Self {
        Self {
            script: VecDeque::new(),
            last: Some(detections),
            loaded: false,
            load_error: None,
        }
    }

    /// Fail `load_model` with this error.
    pub fn failing_to_load(error: DetectionError) -> Self {
        Self {
            script: VecDeque::new(),
            last: None,
            loaded: false,
            load_error: Some(error),
        }
    }
}

impl FaceDetector for ScriptedDetector {
    fn load_model(&mut self) -> Result<(), DetectionError> {
        if let Some(error) = self.load_error.take() {
            return Err(error);
        }
        self.loaded = true;
        Ok(())
    }

    fn detect(&mut self, _frame: &VideoFrame) -> Result<Vec<FaceDetection>, DetectionError> {
        if !self.loaded {
            return Err(DetectionError::ModelNotLoaded);
        }
        match self.script.pop_front() {
            Some(Ok(detections)) => {
                self.last = Some(detections.clone());
                Ok(detections)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.clone().unwrap_or_default()),
        }
    }

    fn dispose(&mut self) {
        self.loaded = false;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }
}

/// Feedback sink that records every event for later assertions.
#[derive(Default)]
pub struct RecordingFeedback {
    pub events: Vec<FeedbackEvent>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackSink for RecordingFeedback {
    fn notify(&mut self, event: FeedbackEvent) {
        self.events.push(event);
    }
}
