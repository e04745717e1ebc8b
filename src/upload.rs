//! Submission flow: encode the accepted set and push it to the backend.
//!
//! Transport is a trait seam. The flow owns validation, JPEG encoding,
//! metadata assembly, the offline fast-fail, and the retry schedule;
//! the uploader only moves bytes.

use crate::feedback::{FeedbackEvent, FeedbackSink};
use crate::quality::{QualityEvaluator, SetValidation};
use crate::session::gallery::{CaptureGallery, GalleryError};
use crate::config::UploadConfig;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    /// No network connectivity at all.
    #[error("no network connection")]
    Offline,

    /// Transport-level failure (DNS, reset connection, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// 5xx-class backend failure, retryable.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// 4xx-class rejection, not retryable.
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl UploadError {
    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::Offline | UploadError::Network(_) => true,
            UploadError::Server { .. } => true,
            UploadError::Rejected { .. } => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("{0}")]
    NotEnoughImages(GalleryError),

    /// Whole-set validation failed; carries the first recommendation.
    #[error("image set rejected: {0}")]
    SetRejected(String),

    #[error("device is offline; connect to a network and try again")]
    Offline,

    #[error("failed to encode image {index}: {message}")]
    Encoding { index: usize, message: String },

    /// Terminal upload failure after retries (or a non-retryable error).
    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// Per-image metadata attached to the submission.
#[derive(Debug, Clone, Serialize)]
pub struct ImageMetadata {
    pub quality_score: f32,
    pub detection_confidence: f32,
    pub captured_at: DateTime<Utc>,
}

/// One encoded image ready for transport.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub jpeg: Bytes,
    pub metadata: ImageMetadata,
}

/// The complete enrollment submission.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub images: Vec<EncodedImage>,
    /// Aggregate score of the whole set, 0-1.
    pub set_score: f32,
}

impl RegistrationRequest {
    /// Metadata payload as sent alongside the image parts.
    pub fn metadata_json(&self) -> serde_json::Value {
        serde_json::json!({
            "set_score": self.set_score,
            "images": self.images.iter().map(|i| &i.metadata).collect::<Vec<_>>(),
        })
    }
}

/// Transport seam for the enrollment backend.
pub trait FaceUploader: Send {
    /// Cheap connectivity probe used for the offline fast-fail.
    fn is_online(&self) -> bool {
        true
    }

    /// Push one complete submission. Called once per attempt.
    fn upload(&mut self, request: &RegistrationRequest) -> Result<(), UploadError>;
}

/// Validate, encode, and upload the gallery with retry.
///
/// Retryable failures back off exponentially from the configured base,
/// doubling per attempt and capped at the configured ceiling. 4xx
/// rejections and set-validation failures return immediately.
pub async fn submit_registration(
    gallery: &CaptureGallery,
    evaluator: &QualityEvaluator,
    uploader: &mut dyn FaceUploader,
    feedback: &mut dyn FeedbackSink,
    policy: &UploadConfig,
    jpeg_quality: u8,
) -> Result<SetValidation, SubmitError> {
    gallery
        .check_submittable()
        .map_err(SubmitError::NotEnoughImages)?;

    let validation = evaluator.validate_set(gallery.images());
    if !validation.is_valid {
        let reason = validation
            .recommendations()
            .first()
            .copied()
            .unwrap_or("Image set did not pass validation.");
        feedback.notify(FeedbackEvent::UploadFailed(reason.to_string()));
        return Err(SubmitError::SetRejected(reason.to_string()));
    }

    if !uploader.is_online() {
        feedback.notify(FeedbackEvent::UploadFailed(
            "You appear to be offline.".to_string(),
        ));
        return Err(SubmitError::Offline);
    }

    let request = encode_request(gallery, validation.average_score, jpeg_quality)?;

    let max_attempts = policy.max_retries + 1;
    let mut delay = Duration::from_millis(policy.base_delay_ms);
    let cap = Duration::from_millis(policy.max_delay_ms);

    for attempt in 1..=max_attempts {
        feedback.notify(FeedbackEvent::UploadAttempt {
            attempt,
            max_attempts,
        });
        match uploader.upload(&request) {
            Ok(()) => {
                feedback.notify(FeedbackEvent::UploadSucceeded);
                log::info!(
                    "Submitted {} images (set score {:.2}) on attempt {}",
                    request.images.len(),
                    request.set_score,
                    attempt
                );
                return Ok(validation);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                log::warn!("Upload attempt {} failed, retrying: {}", attempt, e);
                feedback.notify(FeedbackEvent::UploadRetrying {
                    attempt,
                    delay_secs: delay.as_secs(),
                });
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(cap);
            }
            Err(e) => {
                feedback.notify(FeedbackEvent::UploadFailed(e.to_string()));
                return Err(SubmitError::Upload(e));
            }
        }
    }

    unreachable!("upload loop always returns")
}

fn encode_request(
    gallery: &CaptureGallery,
    set_score: f32,
    jpeg_quality: u8,
) -> Result<RegistrationRequest, SubmitError> {
    let mut images = Vec::with_capacity(gallery.len());
    for (index, image) in gallery.images().iter().enumerate() {
        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, jpeg_quality);
        encoder
            .encode(
                &image.frame.data,
                image.frame.width,
                image.frame.height,
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| SubmitError::Encoding {
                index,
                message: e.to_string(),
            })?;
        images.push(EncodedImage {
            jpeg: Bytes::from(buffer),
            metadata: ImageMetadata {
                quality_score: image.quality_score,
                detection_confidence: image.detection_confidence,
                captured_at: image.captured_at,
            },
        });
    }
    Ok(RegistrationRequest { images, set_score })
}
