//! Sharpness analysis via Laplacian variance.
//!
//! Blurry frames produce a flat Laplacian response; sharp frames produce
//! strong edge transitions and therefore high variance. The variance is
//! also normalized into a 0-1 sharpness score for composite scoring.

use crate::types::{FaceBox, VideoFrame};
use serde::Serialize;

/// Variance the normalization treats as "fully sharp".
const SHARPNESS_NORM: f32 = 200.0;

/// Qualitative sharpness band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurLevel {
    Sharp,
    Good,
    Moderate,
    Blurry,
    VeryBlurry,
}

impl BlurLevel {
    pub fn from_variance(variance: f32) -> Self {
        match variance {
            v if v >= 1000.0 => BlurLevel::Sharp,
            v if v >= 500.0 => BlurLevel::Good,
            v if v >= 200.0 => BlurLevel::Moderate,
            v if v >= 50.0 => BlurLevel::Blurry,
            _ => BlurLevel::VeryBlurry,
        }
    }

    pub fn quality_score(&self) -> f32 {
        match self {
            BlurLevel::Sharp => 1.0,
            BlurLevel::Good => 0.8,
            BlurLevel::Moderate => 0.6,
            BlurLevel::Blurry => 0.3,
            BlurLevel::VeryBlurry => 0.1,
        }
    }

    pub fn is_acceptable(&self) -> bool {
        matches!(self, BlurLevel::Sharp | BlurLevel::Good | BlurLevel::Moderate)
    }
}

/// Sharpness measurements for one frame (or one face region).
#[derive(Debug, Clone, Serialize)]
pub struct BlurMetrics {
    /// Raw Laplacian variance.
    pub variance: f32,
    /// Variance clamped into 0-1 via the normalization constant.
    pub sharpness_score: f32,
    pub blur_level: BlurLevel,
}

/// Laplacian-based blur detector.
#[derive(Debug, Clone, Default)]
pub struct BlurDetector;

impl BlurDetector {
    pub fn new() -> Self {
        Self
    }

    /// Analyze the whole frame.
    pub fn analyze_frame(&self, frame: &VideoFrame) -> BlurMetrics {
        self.analyze_rect(frame, 0, 0, frame.width, frame.height)
    }

    /// Analyze only the face region, clamped to frame bounds.
    pub fn analyze_region(&self, frame: &VideoFrame, bbox: &FaceBox) -> BlurMetrics {
        let x0 = bbox.x.max(0.0) as u32;
        let y0 = bbox.y.max(0.0) as u32;
        let x1 = ((bbox.x + bbox.width) as u32).min(frame.width);
        let y1 = ((bbox.y + bbox.height) as u32).min(frame.height);
        if x1 <= x0 || y1 <= y0 {
            return self.analyze_frame(frame);
        }
        self.analyze_rect(frame, x0, y0, x1 - x0, y1 - y0)
    }

    fn analyze_rect(&self, frame: &VideoFrame, x0: u32, y0: u32, w: u32, h: u32) -> BlurMetrics {
        let variance = laplacian_variance(frame, x0, y0, w, h);
        let sharpness_score = (variance / SHARPNESS_NORM).min(1.0);
        BlurMetrics {
            variance,
            sharpness_score,
            blur_level: BlurLevel::from_variance(variance),
        }
    }
}

/// Variance of the 4-neighbor Laplacian over the interior of the rect.
fn laplacian_variance(frame: &VideoFrame, x0: u32, y0: u32, w: u32, h: u32) -> f32 {
    if w < 3 || h < 3 || !frame.is_valid() {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0u64;

    for y in (y0 + 1)..(y0 + h - 1) {
        for x in (x0 + 1)..(x0 + w - 1) {
            let center = frame.luma_at(x, y);
            let lap = -4.0 * center
                + frame.luma_at(x - 1, y)
                + frame.luma_at(x + 1, y)
                + frame.luma_at(x, y - 1)
                + frame.luma_at(x, y + 1);
            sum += lap as f64;
            sum_sq += (lap * lap) as f64;
            count += 1;
        }
    }

    if count == 0 {
        return 0.0;
    }
    let mean = sum / count as f64;
    ((sum_sq / count as f64) - mean * mean).max(0.0) as f32
}
