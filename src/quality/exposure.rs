//! Exposure analysis: mean luminance, contrast, and histogram shape.

use crate::types::VideoFrame;
use serde::Serialize;

/// Qualitative exposure band, derived from mean luminance on the 0-255 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureLevel {
    TooDark,
    SlightlyDark,
    Balanced,
    SlightlyBright,
    TooBright,
}

impl ExposureLevel {
    /// Band boundaries: hard limits at `low`/`high`, soft shoulders 20
    /// luminance units inside them.
    pub fn from_brightness(mean: f32, low: f32, high: f32) -> Self {
        if mean < low {
            ExposureLevel::TooDark
        } else if mean < low + 20.0 {
            ExposureLevel::SlightlyDark
        } else if mean > high {
            ExposureLevel::TooBright
        } else if mean > high - 20.0 {
            ExposureLevel::SlightlyBright
        } else {
            ExposureLevel::Balanced
        }
    }

    pub fn quality_score(&self) -> f32 {
        match self {
            ExposureLevel::Balanced => 1.0,
            ExposureLevel::SlightlyDark | ExposureLevel::SlightlyBright => 0.8,
            ExposureLevel::TooDark | ExposureLevel::TooBright => 0.3,
        }
    }

    pub fn is_acceptable(&self) -> bool {
        !matches!(self, ExposureLevel::TooDark | ExposureLevel::TooBright)
    }
}

/// Exposure measurements for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct ExposureMetrics {
    /// Mean luminance, 0-255.
    pub mean_brightness: f32,
    /// Luminance standard deviation; low values mean flat contrast.
    pub contrast: f32,
    /// Fraction of pixels with luminance below 30.
    pub dark_pixel_ratio: f32,
    /// Fraction of pixels with luminance above 225.
    pub bright_pixel_ratio: f32,
    /// 256-bin luminance histogram.
    pub histogram: Vec<u32>,
    pub level: ExposureLevel,
    pub quality_score: f32,
}

impl ExposureMetrics {
    /// Histogram intersection against another frame's metrics, 0-1.
    /// Used as a cheap similarity measure between captures.
    pub fn histogram_similarity(&self, other: &ExposureMetrics) -> f32 {
        let total_a: u64 = self.histogram.iter().map(|&c| c as u64).sum();
        let total_b: u64 = other.histogram.iter().map(|&c| c as u64).sum();
        if total_a == 0 || total_b == 0 {
            return 0.0;
        }
        let mut intersection = 0.0f32;
        for (a, b) in self.histogram.iter().zip(other.histogram.iter()) {
            let fa = *a as f32 / total_a as f32;
            let fb = *b as f32 / total_b as f32;
            intersection += fa.min(fb);
        }
        intersection
    }
}

/// Luminance-band exposure analyzer.
#[derive(Debug, Clone)]
pub struct ExposureAnalyzer {
    min_brightness: f32,
    max_brightness: f32,
}

impl ExposureAnalyzer {
    pub fn new(min_brightness: f32, max_brightness: f32) -> Self {
        Self {
            min_brightness,
            max_brightness,
        }
    }

    pub fn analyze_frame(&self, frame: &VideoFrame) -> ExposureMetrics {
        let mut histogram = vec![0u32; 256];
        let pixel_count = (frame.width as u64 * frame.height as u64).max(1);

        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut dark = 0u64;
        let mut bright = 0u64;

        if frame.is_valid() {
            for y in 0..frame.height {
                for x in 0..frame.width {
                    let luma = frame.luma_at(x, y);
                    histogram[(luma as usize).min(255)] += 1;
                    sum += luma as f64;
                    sum_sq += (luma * luma) as f64;
                    if luma < 30.0 {
                        dark += 1;
                    } else if luma > 225.0 {
                        bright += 1;
                    }
                }
            }
        }

        let mean = (sum / pixel_count as f64) as f32;
        let variance = ((sum_sq / pixel_count as f64) - (mean as f64 * mean as f64)).max(0.0);
        let level = ExposureLevel::from_brightness(mean, self.min_brightness, self.max_brightness);

        ExposureMetrics {
            mean_brightness: mean,
            contrast: variance.sqrt() as f32,
            dark_pixel_ratio: dark as f32 / pixel_count as f32,
            bright_pixel_ratio: bright as f32 / pixel_count as f32,
            histogram,
            level,
            quality_score: level.quality_score(),
        }
    }
}

impl Default for ExposureAnalyzer {
    fn default() -> Self {
        Self::new(80.0, 200.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_frame(value: u8) -> VideoFrame {
        VideoFrame::new(vec![value; 32 * 32 * 3], 32, 32, "test".to_string())
    }

    #[test]
    fn test_brightness_bands() {
        assert_eq!(
            ExposureLevel::from_brightness(40.0, 80.0, 200.0),
            ExposureLevel::TooDark
        );
        assert_eq!(
            ExposureLevel::from_brightness(90.0, 80.0, 200.0),
            ExposureLevel::SlightlyDark
        );
        assert_eq!(
            ExposureLevel::from_brightness(128.0, 80.0, 200.0),
            ExposureLevel::Balanced
        );
        assert_eq!(
            ExposureLevel::from_brightness(190.0, 80.0, 200.0),
            ExposureLevel::SlightlyBright
        );
        assert_eq!(
            ExposureLevel::from_brightness(230.0, 80.0, 200.0),
            ExposureLevel::TooBright
        );
    }

    #[test]
    fn test_dark_frame_metrics() {
        let metrics = ExposureAnalyzer::default().analyze_frame(&flat_frame(20));
        assert_eq!(metrics.level, ExposureLevel::TooDark);
        assert!(metrics.dark_pixel_ratio > 0.99);
        assert!(metrics.contrast < 1.0);
        assert!(!metrics.level.is_acceptable());
    }

    #[test]
    fn test_bright_frame_metrics() {
        let metrics = ExposureAnalyzer::default().analyze_frame(&flat_frame(240));
        assert_eq!(metrics.level, ExposureLevel::TooBright);
        assert!(metrics.bright_pixel_ratio > 0.99);
    }

    #[test]
    fn test_balanced_frame_metrics() {
        let metrics = ExposureAnalyzer::default().analyze_frame(&flat_frame(128));
        assert_eq!(metrics.level, ExposureLevel::Balanced);
        assert_eq!(metrics.quality_score, 1.0);
        assert!((metrics.mean_brightness - 128.0).abs() < 1.0);
    }

    #[test]
    fn test_histogram_similarity_bounds() {
        let analyzer = ExposureAnalyzer::default();
        let a = analyzer.analyze_frame(&flat_frame(128));
        let b = analyzer.analyze_frame(&flat_frame(128));
        let c = analyzer.analyze_frame(&flat_frame(20));
        assert!((a.histogram_similarity(&b) - 1.0).abs() < 1e-4);
        assert!(a.histogram_similarity(&c) < 0.01);
    }
}
