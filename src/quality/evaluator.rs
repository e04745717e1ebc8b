//! Per-frame quality gating and post-capture validation.
//!
//! Every sampled frame gets exactly one [`FaceVerdict`], picked by a fixed
//! precedence so the user always sees the most actionable problem first:
//! no face, then multiple faces, then lighting, then sharpness, then
//! centering, then size. Zero or multiple faces are normal outcomes here,
//! never errors.

use crate::config::{DetectionConfig, QualityConfig};
use crate::quality::blur::{BlurDetector, BlurMetrics};
use crate::quality::exposure::{ExposureAnalyzer, ExposureLevel, ExposureMetrics};
use crate::types::{CapturedImage, FaceDetection, FacePosition, FaceQuality, VideoFrame};
use serde::Serialize;

/// Single prioritized verdict for a sampled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceVerdict {
    NoFace,
    MultipleFaces,
    TooDark,
    TooBright,
    TooBlurry,
    NotCentered,
    TooSmall,
    TooLarge,
    Good,
}

impl FaceVerdict {
    pub fn is_good(&self) -> bool {
        matches!(self, FaceVerdict::Good)
    }

    /// User-facing guidance for this verdict.
    pub fn message(&self) -> &'static str {
        match self {
            FaceVerdict::NoFace => "No face detected. Position your face in the frame.",
            FaceVerdict::MultipleFaces => "Multiple faces detected. Only one person at a time.",
            FaceVerdict::TooDark => "Too dark. Move to a brighter spot.",
            FaceVerdict::TooBright => "Too bright. Move away from direct light.",
            FaceVerdict::TooBlurry => "Image is blurry. Hold still.",
            FaceVerdict::NotCentered => "Center your face in the frame.",
            FaceVerdict::TooSmall => "Move closer to the camera.",
            FaceVerdict::TooLarge => "Move back from the camera.",
            FaceVerdict::Good => "Perfect. Hold that position.",
        }
    }
}

/// Everything the engine needs to know about one sampled frame.
#[derive(Debug, Clone)]
pub struct FrameAssessment {
    pub verdict: FaceVerdict,
    /// Geometry/quality detail for the single detected face, when exactly
    /// one face was found.
    pub quality: Option<FaceQuality>,
    pub position: Option<FacePosition>,
    /// Detector confidence for the face, with the configured fallback when
    /// the backend reports none.
    pub confidence: f32,
    /// Composite 0-1 score; 0.0 when no single face is present.
    pub score: f32,
    pub faces_detected: usize,
}

impl FrameAssessment {
    fn rejected(verdict: FaceVerdict, faces_detected: usize) -> Self {
        Self {
            verdict,
            quality: None,
            position: None,
            confidence: 0.0,
            score: 0.0,
            faces_detected,
        }
    }
}

/// A defect found when re-validating an already captured image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageIssue {
    TooDark,
    TooBright,
    LowContrast,
    Blurry,
}

impl ImageIssue {
    /// Score penalty applied multiplicatively for this defect.
    fn penalty(&self) -> f32 {
        match self {
            ImageIssue::TooDark | ImageIssue::TooBright => 0.8,
            ImageIssue::LowContrast => 0.9,
            ImageIssue::Blurry => 0.7,
        }
    }

    pub fn remediation(&self) -> &'static str {
        match self {
            ImageIssue::TooDark => "Image too dark. Retake in better lighting.",
            ImageIssue::TooBright => "Image overexposed. Retake away from direct light.",
            ImageIssue::LowContrast => "Image lacks contrast. Retake with more even lighting.",
            ImageIssue::Blurry => "Image is blurry. Retake while holding still.",
        }
    }
}

/// Re-validation result for a single captured image.
#[derive(Debug, Clone)]
pub struct CaptureValidation {
    pub is_valid: bool,
    pub score: f32,
    pub issues: Vec<ImageIssue>,
}

/// A defect found when validating the whole image set before submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetIssue {
    LowAverageQuality,
    TooSimilar,
}

impl SetIssue {
    pub fn recommendation(&self) -> &'static str {
        match self {
            SetIssue::LowAverageQuality => {
                "Overall quality is low. Remove the weakest images and retake them."
            }
            SetIssue::TooSimilar => {
                "Images look nearly identical. Vary your angle or expression slightly."
            }
        }
    }
}

/// Whole-set validation result.
#[derive(Debug, Clone)]
pub struct SetValidation {
    pub is_valid: bool,
    pub average_score: f32,
    /// 0 = every image identical, 1 = fully distinct histograms.
    pub diversity_score: f32,
    pub issues: Vec<SetIssue>,
}

impl SetValidation {
    pub fn recommendations(&self) -> Vec<&'static str> {
        self.issues.iter().map(|i| i.recommendation()).collect()
    }
}

/// Pairwise histogram similarity above this marks a set as too uniform.
const SET_SIMILARITY_CEILING: f32 = 0.92;
/// Contrast (luminance stddev) below this is flagged on re-validation.
const MIN_CONTRAST: f32 = 20.0;
/// Re-validated images must keep at least this much of their score.
const REVALIDATION_FLOOR: f32 = 0.6;

/// Stateless quality gate built from the config thresholds.
#[derive(Debug, Clone)]
pub struct QualityEvaluator {
    thresholds: QualityConfig,
    default_confidence: f32,
    blur: BlurDetector,
    exposure: ExposureAnalyzer,
}

impl QualityEvaluator {
    pub fn new(quality: QualityConfig, detection: &DetectionConfig) -> Self {
        let exposure = ExposureAnalyzer::new(quality.min_brightness, quality.max_brightness);
        Self {
            thresholds: quality,
            default_confidence: detection.default_confidence,
            blur: BlurDetector::new(),
            exposure,
        }
    }

    pub fn exposure_metrics(&self, frame: &VideoFrame) -> ExposureMetrics {
        self.exposure.analyze_frame(frame)
    }

    pub fn blur_metrics(&self, frame: &VideoFrame) -> BlurMetrics {
        self.blur.analyze_frame(frame)
    }

    /// Assess one sampled frame against all gates.
    pub fn assess(&self, detections: &[FaceDetection], frame: &VideoFrame) -> FrameAssessment {
        match detections.len() {
            0 => return FrameAssessment::rejected(FaceVerdict::NoFace, 0),
            1 => {}
            n => return FrameAssessment::rejected(FaceVerdict::MultipleFaces, n),
        }

        let detection = &detections[0];
        let bbox = &detection.bounding_box;
        let position = FacePosition::from_box(bbox, frame.width, frame.height);

        let is_centered = position.normalized_offset_x <= self.thresholds.center_tolerance
            && position.normalized_offset_y <= self.thresholds.center_tolerance;

        let min_dim = frame.width.min(frame.height) as f32;
        let span_fraction = if min_dim > 0.0 { bbox.span() / min_dim } else { 0.0 };
        let too_small = span_fraction < self.thresholds.min_face_span;
        let too_large = span_fraction > self.thresholds.max_face_span;

        let exposure = self.exposure.analyze_frame(frame);
        let blur = self.blur.analyze_region(frame, bbox);
        let sharp_enough = blur.sharpness_score >= self.thresholds.min_sharpness_score;

        let verdict = match exposure.level {
            ExposureLevel::TooDark => FaceVerdict::TooDark,
            ExposureLevel::TooBright => FaceVerdict::TooBright,
            _ if !sharp_enough => FaceVerdict::TooBlurry,
            _ if !is_centered => FaceVerdict::NotCentered,
            _ if too_small => FaceVerdict::TooSmall,
            _ if too_large => FaceVerdict::TooLarge,
            _ => FaceVerdict::Good,
        };

        let score = (0.3 * if is_centered { 1.0 } else { 0.0 }
            + 0.3 * if !too_small && !too_large { 1.0 } else { 0.0 }
            + 0.2 * exposure.quality_score
            + 0.2 * blur.sharpness_score)
            .clamp(0.0, 1.0);

        let quality = FaceQuality {
            is_centered,
            is_valid_size: !too_small && !too_large,
            is_good_quality: verdict.is_good(),
            score,
        };

        FrameAssessment {
            verdict,
            quality: Some(quality),
            position: Some(position),
            confidence: detection.confidence.unwrap_or(self.default_confidence),
            score,
            faces_detected: 1,
        }
    }

    /// Re-validate a captured still before it is kept.
    ///
    /// Defects stack multiplicatively on the capture-time score; the image
    /// survives only with no defects and a score above the floor.
    pub fn validate_captured(&self, image: &CapturedImage) -> CaptureValidation {
        let exposure = self.exposure.analyze_frame(&image.frame);
        let blur = self.blur.analyze_frame(&image.frame);

        let mut issues = Vec::new();
        match exposure.level {
            ExposureLevel::TooDark => issues.push(ImageIssue::TooDark),
            ExposureLevel::TooBright => issues.push(ImageIssue::TooBright),
            _ => {}
        }
        if exposure.contrast < MIN_CONTRAST {
            issues.push(ImageIssue::LowContrast);
        }
        if blur.sharpness_score < self.thresholds.min_sharpness_score {
            issues.push(ImageIssue::Blurry);
        }

        let mut score = image.quality_score;
        for issue in &issues {
            score *= issue.penalty();
        }

        CaptureValidation {
            is_valid: issues.is_empty() && score >= REVALIDATION_FLOOR,
            score,
            issues,
        }
    }

    /// Validate the whole gallery before submission: average quality plus
    /// a histogram-based diversity check.
    pub fn validate_set(&self, images: &[CapturedImage]) -> SetValidation {
        if images.is_empty() {
            return SetValidation {
                is_valid: false,
                average_score: 0.0,
                diversity_score: 0.0,
                issues: vec![SetIssue::LowAverageQuality],
            };
        }

        let average_score =
            images.iter().map(|i| i.quality_score).sum::<f32>() / images.len() as f32;

        let diversity_score = if images.len() < 2 {
            1.0
        } else {
            let metrics: Vec<ExposureMetrics> = images
                .iter()
                .map(|i| self.exposure.analyze_frame(&i.frame))
                .collect();
            let mut total = 0.0f32;
            let mut pairs = 0u32;
            for i in 0..metrics.len() {
                for j in (i + 1)..metrics.len() {
                    total += metrics[i].histogram_similarity(&metrics[j]);
                    pairs += 1;
                }
            }
            1.0 - total / pairs as f32
        };

        let mut issues = Vec::new();
        if average_score < self.thresholds.min_quality_score {
            issues.push(SetIssue::LowAverageQuality);
        }
        if diversity_score < 1.0 - SET_SIMILARITY_CEILING {
            issues.push(SetIssue::TooSimilar);
        }

        SetValidation {
            is_valid: issues.is_empty(),
            average_score,
            diversity_score,
            issues,
        }
    }

    pub fn min_quality_score(&self) -> f32 {
        self.thresholds.min_quality_score
    }
}
