//! Testing utilities for facegate
//!
//! Provides synthetic frames, scripted camera/detector doubles, and an
//! in-memory feedback recorder for deterministic offline tests without
//! camera hardware or a real detection model.

pub mod synthetic;

pub use synthetic::{
    centered_face, offset_face, pattern_frame, FramePattern, RecordingFeedback, ScriptedDetector,
    ScriptedSource,
};
