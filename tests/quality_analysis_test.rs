//! Quality analysis integration tests: pattern frames through the blur
//! detector, exposure analyzer, and the combined evaluator.

use facegate::config::FacegateConfig;
use facegate::quality::{
    BlurDetector, BlurLevel, ExposureAnalyzer, ExposureLevel, FaceVerdict, QualityEvaluator,
};
use facegate::testing::{centered_face, offset_face, pattern_frame, FramePattern};
use facegate::types::CapturedImage;
use chrono::Utc;

fn evaluator() -> QualityEvaluator {
    let config = FacegateConfig::default();
    QualityEvaluator::new(config.quality, &config.detection)
}

#[test]
fn test_blur_detection_on_patterns() {
    let detector = BlurDetector::new();

    let sharp = detector.analyze_frame(&pattern_frame(64, 64, FramePattern::Checkerboard));
    assert_eq!(sharp.blur_level, BlurLevel::Sharp);
    assert!(sharp.sharpness_score > 0.9);

    let flat = detector.analyze_frame(&pattern_frame(64, 64, FramePattern::Flat(128)));
    assert_eq!(flat.blur_level, BlurLevel::VeryBlurry);
    assert!(flat.sharpness_score < 0.1);

    let gradient = detector.analyze_frame(&pattern_frame(64, 64, FramePattern::Gradient));
    assert!(gradient.variance < sharp.variance);
}

#[test]
fn test_exposure_analysis_on_patterns() {
    let analyzer = ExposureAnalyzer::default();

    let dark = analyzer.analyze_frame(&pattern_frame(64, 64, FramePattern::Dark));
    assert_eq!(dark.level, ExposureLevel::TooDark);
    assert!(dark.dark_pixel_ratio > 0.9);

    let bright = analyzer.analyze_frame(&pattern_frame(64, 64, FramePattern::Bright));
    assert_eq!(bright.level, ExposureLevel::TooBright);
    assert!(bright.bright_pixel_ratio > 0.9);

    let balanced = analyzer.analyze_frame(&pattern_frame(64, 64, FramePattern::Checkerboard));
    assert_eq!(balanced.level, ExposureLevel::Balanced);
    assert!(balanced.contrast > 50.0);
}

#[test]
fn test_verdict_precedence_ladder() {
    let eval = evaluator();
    let good_frame = pattern_frame(64, 64, FramePattern::Checkerboard);
    let dark_frame = pattern_frame(64, 64, FramePattern::Dark);
    let flat_frame = pattern_frame(64, 64, FramePattern::Flat(128));
    let face = centered_face(64, 64, 0.45);

    // No face beats everything.
    assert_eq!(eval.assess(&[], &dark_frame).verdict, FaceVerdict::NoFace);

    // Multiple faces beats lighting.
    assert_eq!(
        eval.assess(&[face.clone(), face.clone()], &dark_frame).verdict,
        FaceVerdict::MultipleFaces
    );

    // Lighting beats sharpness and geometry.
    assert_eq!(
        eval.assess(&[offset_face(64, 64, 0.45, 0.3)], &dark_frame).verdict,
        FaceVerdict::TooDark
    );

    // Sharpness beats geometry.
    assert_eq!(
        eval.assess(&[offset_face(64, 64, 0.45, 0.3)], &flat_frame).verdict,
        FaceVerdict::TooBlurry
    );

    // Geometry: centering beats size.
    assert_eq!(
        eval.assess(&[offset_face(64, 64, 0.2, 0.3)], &good_frame).verdict,
        FaceVerdict::NotCentered
    );
    assert_eq!(
        eval.assess(&[centered_face(64, 64, 0.2)], &good_frame).verdict,
        FaceVerdict::TooSmall
    );
    assert_eq!(
        eval.assess(&[centered_face(64, 64, 0.8)], &good_frame).verdict,
        FaceVerdict::TooLarge
    );

    // Everything in order.
    let assessment = eval.assess(&[centered_face(64, 64, 0.45)], &good_frame);
    assert_eq!(assessment.verdict, FaceVerdict::Good);
    assert!(assessment.score >= 0.9);
}

#[test]
fn test_zero_and_multiple_faces_are_not_errors() {
    let eval = evaluator();
    let frame = pattern_frame(64, 64, FramePattern::Checkerboard);
    let face = centered_face(64, 64, 0.45);

    // Both produce assessments with guidance, score zero, and no panic.
    let none = eval.assess(&[], &frame);
    assert_eq!(none.score, 0.0);
    assert_eq!(none.faces_detected, 0);

    let many = eval.assess(&[face.clone(), face.clone(), face], &frame);
    assert_eq!(many.score, 0.0);
    assert_eq!(many.faces_detected, 3);
    assert!(!many.verdict.message().is_empty());
}

#[test]
fn test_captured_image_revalidation() {
    let eval = evaluator();

    let clean = CapturedImage {
        frame: pattern_frame(64, 64, FramePattern::Checkerboard),
        quality_score: 0.92,
        detection_confidence: 0.95,
        captured_at: Utc::now(),
    };
    let validation = eval.validate_captured(&clean);
    assert!(validation.is_valid);
    assert_eq!(validation.score, 0.92);

    let murky = CapturedImage {
        frame: pattern_frame(64, 64, FramePattern::Dark),
        quality_score: 0.92,
        detection_confidence: 0.95,
        captured_at: Utc::now(),
    };
    let validation = eval.validate_captured(&murky);
    assert!(!validation.is_valid);
    assert!(!validation.issues.is_empty());
    assert!(validation.score < 0.92);
    // Every issue carries actionable guidance.
    for issue in &validation.issues {
        assert!(!issue.remediation().is_empty());
    }
}

#[test]
fn test_set_validation_diversity() {
    let eval = evaluator();
    let make = |pattern| CapturedImage {
        frame: pattern_frame(64, 64, pattern),
        quality_score: 0.9,
        detection_confidence: 0.95,
        captured_at: Utc::now(),
    };

    // Identical frames: flagged as too similar.
    let uniform = vec![
        make(FramePattern::Checkerboard),
        make(FramePattern::Checkerboard),
        make(FramePattern::Checkerboard),
    ];
    let validation = eval.validate_set(&uniform);
    assert!(!validation.is_valid);
    assert!(validation.diversity_score < 0.1);

    // Distinct luminance distributions: passes.
    let varied = vec![
        make(FramePattern::Checkerboard),
        make(FramePattern::Gradient),
        make(FramePattern::Flat(150)),
    ];
    let validation = eval.validate_set(&varied);
    assert!(validation.diversity_score > 0.1);
    assert!(validation.is_valid);
}
