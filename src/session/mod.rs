/// Capture session module
///
/// Owns the full enrollment pipeline: adaptive frame pacing, the
/// tick-driven auto-capture engine, the bounded image gallery, and the
/// cooperative session loop that wires camera, detector, evaluator, and
/// feedback together.
pub mod engine;
pub mod errors;
pub mod gallery;
pub mod pacing;
#[allow(clippy::module_inception)]
pub mod session;

pub use engine::{AutoCaptureState, CaptureDenied, CaptureEngine, CaptureTrigger, EngineEvent};
pub use errors::{SessionError, SessionErrorKind};
pub use gallery::{CaptureGallery, GalleryError};
pub use pacing::{DeviceClass, DeviceProfile};
pub use session::{CaptureSession, SessionPhase, StopHandle};
