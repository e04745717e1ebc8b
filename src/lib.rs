//! Facegate: quality-gated auto-capture pipeline for face enrollment
//!
//! This crate turns a live video feed plus a face detection backend into a
//! guided enrollment flow: it samples frames at a device-appropriate rate,
//! gates each frame on geometry, lighting, and sharpness, auto-captures
//! after a sustained run of good frames, collects a bounded image set, and
//! submits it with retry.
//!
//! # Usage
//! ```rust,ignore
//! use facegate::config::FacegateConfig;
//! use facegate::feedback::LogFeedback;
//! use facegate::session::CaptureSession;
//!
//! # async fn demo(source: Box<dyn facegate::camera::FrameSource>,
//! #               detector: Box<dyn facegate::detector::FaceDetector>) {
//! facegate::init_logging();
//! let config = FacegateConfig::load_or_default();
//! let mut session =
//!     CaptureSession::new(config, source, detector, Box::new(LogFeedback::new())).unwrap();
//! session.start().await.unwrap();
//! let stop = session.stop_handle();
//! tokio::spawn(async move { /* stop.stop() when the user is done */ });
//! session.run().await.unwrap();
//! # }
//! ```
//!
//! The camera and detector are trait seams ([`camera::FrameSource`],
//! [`detector::FaceDetector`]); the crate ships scripted implementations in
//! [`testing`] for offline use.
pub mod camera;
pub mod config;
pub mod detector;
pub mod errors;
pub mod feedback;
pub mod quality;
pub mod session;
pub mod types;
pub mod upload;

// Testing utilities - synthetic data for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::FacegateConfig;
pub use errors::CameraError;
pub use session::{CaptureSession, SessionError, StopHandle};
pub use types::{CaptureStep, CapturedImage, FaceBox, FaceDetection, VideoFrame};

/// Initialize logging for the capture pipeline
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "facegate=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
