//! Configuration management for facegate
//!
//! Provides configuration loading, saving, and validation for camera
//! reconnect behavior, capture pacing, quality thresholds, detection limits,
//! and submission retry policy.

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacegateConfig {
    pub camera: CameraConfig,
    pub capture: CaptureConfig,
    pub quality: QualityConfig,
    pub detection: DetectionConfig,
    pub upload: UploadConfig,
}

/// Camera-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Preferred device id ("0" = default camera)
    pub device_id: String,
    /// Reconnect retry attempts for a busy device
    pub reconnect_attempts: u32,
    /// Reconnect delay in milliseconds
    pub reconnect_delay_ms: u64,
}

/// Auto-capture pacing and gallery bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Consecutive good frames required before the countdown starts
    pub consecutive_good_target: u32,
    /// Countdown length in seconds before an auto-capture fires
    pub countdown_secs: u32,
    /// Cooldown in seconds after every accepted capture
    pub cooldown_secs: u32,
    /// Minimum number of qualifying images required for submission
    pub min_images: usize,
    /// Maximum number of stored images
    pub max_images: usize,
    /// Discard stored images whose score sits below the quality floor
    pub prune_low_quality: bool,
}

/// Quality gate thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Maximum normalized face-center offset from frame center (0.0-0.5)
    pub center_tolerance: f32,
    /// Face span as a fraction of the shorter frame dimension, lower bound
    pub min_face_span: f32,
    /// Face span as a fraction of the shorter frame dimension, upper bound
    pub max_face_span: f32,
    /// Mean luminance floor (0-255); frames below are too dark
    pub min_brightness: f32,
    /// Mean luminance ceiling (0-255); frames above are too bright
    pub max_brightness: f32,
    /// Minimum acceptable sharpness score (0.0-1.0)
    pub min_sharpness_score: f32,
    /// Minimum composite score for an image to count toward submission (0.0-1.0)
    pub min_quality_score: f32,
    /// JPEG quality used when encoding accepted images (1-100)
    pub jpeg_quality: u8,
}

/// Detection loop limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Consecutive detector failures tolerated before the session gives up
    pub max_consecutive_errors: u32,
    /// Confidence substituted when the backend reports no per-face score
    pub default_confidence: f32,
}

/// Submission retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Retries after the first failed attempt
    pub max_retries: u32,
    /// Base backoff delay in milliseconds (doubles per retry)
    pub base_delay_ms: u64,
    /// Backoff ceiling in milliseconds
    pub max_delay_ms: u64,
}

impl Default for FacegateConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                device_id: "0".to_string(),
                reconnect_attempts: 3,
                reconnect_delay_ms: 2000,
            },
            capture: CaptureConfig {
                consecutive_good_target: 5,
                countdown_secs: 3,
                cooldown_secs: 3,
                min_images: 5,
                max_images: 10,
                prune_low_quality: true,
            },
            quality: QualityConfig {
                center_tolerance: 0.15,
                min_face_span: 0.3,
                max_face_span: 0.6,
                min_brightness: 80.0,
                max_brightness: 200.0,
                min_sharpness_score: 0.35,
                min_quality_score: 0.7,
                jpeg_quality: 85,
            },
            detection: DetectionConfig {
                max_consecutive_errors: 10,
                default_confidence: 0.95,
            },
            upload: UploadConfig {
                max_retries: 3,
                base_delay_ms: 1000,
                max_delay_ms: 5000,
            },
        }
    }
}

impl FacegateConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default().with_env_overrides());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            CameraError::InitializationError(format!("Failed to read config file: {}", e))
        })?;

        let config: FacegateConfig = toml::from_str(&contents).map_err(|e| {
            CameraError::InitializationError(format!("Failed to parse config file: {}", e))
        })?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config.with_env_overrides())
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::InitializationError(format!(
                    "Failed to create config directory: {}",
                    e
                ))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            CameraError::InitializationError(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            CameraError::InitializationError(format!("Failed to write config file: {}", e))
        })?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("facegate.toml")
    }

    /// Load from default location or create with defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default().with_env_overrides()
        })
    }

    /// Apply deployment overrides for the enrollment image bounds.
    ///
    /// `FACEGATE_MIN_REGISTRATION_IMAGES` and `FACEGATE_MAX_REGISTRATION_IMAGES`
    /// win over the file values when set and parseable.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var("FACEGATE_MIN_REGISTRATION_IMAGES") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => self.capture.min_images = n,
                _ => log::warn!("Ignoring invalid FACEGATE_MIN_REGISTRATION_IMAGES={}", raw),
            }
        }
        if let Ok(raw) = std::env::var("FACEGATE_MAX_REGISTRATION_IMAGES") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => self.capture.max_images = n,
                _ => log::warn!("Ignoring invalid FACEGATE_MAX_REGISTRATION_IMAGES={}", raw),
            }
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.camera.reconnect_attempts == 0 {
            return Err("Reconnect attempts must be at least 1".to_string());
        }

        if self.capture.min_images == 0 {
            return Err("Minimum image count must be at least 1".to_string());
        }
        if self.capture.min_images > self.capture.max_images {
            return Err("Minimum image count cannot exceed the maximum".to_string());
        }
        if self.capture.consecutive_good_target == 0 {
            return Err("Consecutive good frame target must be at least 1".to_string());
        }

        if !(0.0..=0.5).contains(&self.quality.center_tolerance) {
            return Err("Center tolerance must be between 0.0 and 0.5".to_string());
        }
        if self.quality.min_face_span <= 0.0
            || self.quality.min_face_span >= self.quality.max_face_span
            || self.quality.max_face_span > 1.0
        {
            return Err("Face span bounds must satisfy 0 < min < max <= 1".to_string());
        }
        if self.quality.min_brightness >= self.quality.max_brightness
            || self.quality.max_brightness > 255.0
        {
            return Err("Brightness band must satisfy min < max <= 255".to_string());
        }
        if !(0.0..=1.0).contains(&self.quality.min_sharpness_score) {
            return Err("Sharpness score must be between 0.0 and 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.quality.min_quality_score) {
            return Err("Quality score must be between 0.0 and 1.0".to_string());
        }
        if self.quality.jpeg_quality == 0 || self.quality.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }

        if self.detection.max_consecutive_errors == 0 {
            return Err("Detector error budget must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.detection.default_confidence) {
            return Err("Default confidence must be between 0.0 and 1.0".to_string());
        }

        if self.upload.base_delay_ms == 0 || self.upload.base_delay_ms > self.upload.max_delay_ms {
            return Err("Upload backoff must satisfy 0 < base <= max".to_string());
        }

        Ok(())
    }
}
