/// Frame quality assessment module
///
/// Provides automated quality gating for enrollment captures: blur
/// detection, exposure analysis, face geometry checks, and composite
/// scoring with a single prioritized verdict per frame.
pub mod blur;
pub mod evaluator;
pub mod exposure;

pub use blur::{BlurDetector, BlurLevel, BlurMetrics};
pub use evaluator::{
    CaptureValidation, FaceVerdict, FrameAssessment, ImageIssue, QualityEvaluator, SetIssue,
    SetValidation,
};
pub use exposure::{ExposureAnalyzer, ExposureLevel, ExposureMetrics};
