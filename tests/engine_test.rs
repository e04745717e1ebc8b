//! End-to-end capture scenarios, driven tick by tick through the session's
//! deterministic stepping API (no real timers).

use facegate::config::FacegateConfig;
use facegate::detector::DetectionError;
use facegate::errors::CameraError;
use facegate::feedback::{FeedbackEvent, FeedbackSink};
use facegate::quality::{FaceVerdict, SetValidation};
use facegate::session::{CaptureSession, SessionErrorKind, SessionPhase};
use facegate::testing::{
    centered_face, offset_face, pattern_frame, FramePattern, ScriptedDetector, ScriptedSource,
};
use facegate::types::{CaptureStep, FaceDetection};
use facegate::upload::{FaceUploader, RegistrationRequest, SubmitError, UploadError};
use std::sync::{Arc, Mutex};

/// Feedback sink the test keeps a handle to after the session takes
/// ownership of its clone.
#[derive(Clone, Default)]
struct SharedFeedback {
    events: Arc<Mutex<Vec<FeedbackEvent>>>,
}

impl SharedFeedback {
    fn events(&self) -> Vec<FeedbackEvent> {
        self.events.lock().unwrap().clone()
    }

    fn contains(&self, wanted: &FeedbackEvent) -> bool {
        self.events().iter().any(|e| e == wanted)
    }

    fn count_saved(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, FeedbackEvent::CaptureSaved { .. }))
            .count()
    }
}

impl FeedbackSink for SharedFeedback {
    fn notify(&mut self, event: FeedbackEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn good_detection() -> FaceDetection {
    centered_face(64, 64, 0.45)
}

async fn running_session(
    detector: ScriptedDetector,
) -> (CaptureSession, SharedFeedback) {
    let feedback = SharedFeedback::default();
    let source = ScriptedSource::new(vec![pattern_frame(64, 64, FramePattern::Checkerboard)]);
    let mut session = CaptureSession::new(
        FacegateConfig::default(),
        Box::new(source),
        Box::new(detector),
        Box::new(feedback.clone()),
    )
    .unwrap();
    session.start().await.unwrap();
    (session, feedback)
}

#[tokio::test]
async fn test_auto_capture_happy_path() {
    let (mut session, feedback) =
        running_session(ScriptedDetector::constant(vec![good_detection()])).await;

    // Five good frames arm the countdown.
    for _ in 0..5 {
        session.sample_once().unwrap();
    }
    assert!(feedback.contains(&FeedbackEvent::CountdownStarted(3)));

    // Quality holds through the countdown: exactly one capture fires at
    // expiry, then the cooldown starts.
    session.sample_once().unwrap();
    session.second_tick();
    session.sample_once().unwrap();
    session.second_tick();
    session.sample_once().unwrap();
    session.second_tick();

    assert_eq!(session.gallery().len(), 1);
    assert_eq!(feedback.count_saved(), 1);
    assert!(feedback.contains(&FeedbackEvent::CooldownStarted(3)));
    assert!(session.engine().in_cooldown());

    // More good frames during cooldown never fire a second capture.
    for _ in 0..10 {
        session.sample_once().unwrap();
    }
    assert_eq!(session.gallery().len(), 1);
}

#[tokio::test]
async fn test_progress_resets_on_quality_loss() {
    // 10 good frames, then the face disappears.
    let mut script: Vec<_> = (0..10).map(|_| Ok(vec![good_detection()])).collect();
    script.push(Ok(vec![]));
    let (mut session, feedback) = running_session(ScriptedDetector::new(script)).await;

    session.sample_once().unwrap();
    for _ in 0..35 {
        session.progress_tick();
    }
    assert_eq!(session.engine().progress(), 35);
    assert_eq!(session.engine().step(), CaptureStep::Aligning);
    assert!(feedback.contains(&FeedbackEvent::StepChanged(CaptureStep::Aligning)));

    // Skip to the no-face frame: progress snaps to 0 within one tick.
    for _ in 0..10 {
        session.sample_once().unwrap();
    }
    assert_eq!(session.engine().progress(), 0);
    assert_eq!(session.engine().step(), CaptureStep::Detecting);
    assert!(feedback.contains(&FeedbackEvent::Guidance(FaceVerdict::NoFace)));
}

#[tokio::test]
async fn test_second_face_aborts_countdown() {
    let mut script: Vec<_> = (0..5).map(|_| Ok(vec![good_detection()])).collect();
    script.push(Ok(vec![good_detection(), good_detection()]));
    let (mut session, feedback) = running_session(ScriptedDetector::new(script)).await;

    for _ in 0..5 {
        session.sample_once().unwrap();
    }
    assert!(feedback.contains(&FeedbackEvent::CountdownStarted(3)));

    // Second face appears mid-countdown.
    session.second_tick();
    session.sample_once().unwrap();
    assert!(feedback.contains(&FeedbackEvent::CountdownAborted));
    assert!(feedback.contains(&FeedbackEvent::Guidance(FaceVerdict::MultipleFaces)));
    assert_eq!(session.engine().consecutive_good(), 0);

    // The remaining countdown seconds fire nothing.
    session.second_tick();
    session.second_tick();
    assert_eq!(session.gallery().len(), 0);
}

#[tokio::test]
async fn test_countdown_expiry_revalidates() {
    // Good frames to arm, then the face drifts off-center for the rest.
    let mut script: Vec<_> = (0..5).map(|_| Ok(vec![good_detection()])).collect();
    for _ in 0..5 {
        script.push(Ok(vec![offset_face(64, 64, 0.45, 0.3)]));
    }
    let (mut session, feedback) = running_session(ScriptedDetector::new(script)).await;

    for _ in 0..5 {
        session.sample_once().unwrap();
    }
    session.second_tick();
    session.second_tick();
    session.sample_once().unwrap(); // degraded frame lands before expiry
    session.second_tick();

    assert_eq!(session.gallery().len(), 0);
    assert!(feedback.contains(&FeedbackEvent::CountdownAborted));
}

#[tokio::test]
async fn test_capacity_boundary_blocks_further_capture() {
    let (mut session, _feedback) =
        running_session(ScriptedDetector::constant(vec![good_detection()])).await;

    // Fill the gallery through repeated auto-capture cycles.
    for _ in 0..10 {
        for _ in 0..5 {
            session.sample_once().unwrap();
        }
        for _ in 0..3 {
            session.sample_once().unwrap();
            session.second_tick();
        }
        // Drain the cooldown.
        for _ in 0..3 {
            session.second_tick();
        }
    }
    assert_eq!(session.gallery().len(), 10);

    // At capacity: no countdown can arm, manual capture is refused.
    for _ in 0..10 {
        session.sample_once().unwrap();
        session.second_tick();
    }
    assert_eq!(session.gallery().len(), 10);
    assert!(session.manual_capture().is_err());
}

#[tokio::test]
async fn test_manual_capture_bypasses_countdown() {
    let (mut session, feedback) =
        running_session(ScriptedDetector::constant(vec![good_detection()])).await;

    session.sample_once().unwrap();
    session.manual_capture().unwrap();
    assert_eq!(session.gallery().len(), 1);
    assert_eq!(feedback.count_saved(), 1);
    // Manual captures also trigger the cooldown.
    assert!(session.engine().in_cooldown());
}

#[tokio::test]
async fn test_manual_capture_requires_good_frame() {
    let (mut session, _feedback) =
        running_session(ScriptedDetector::constant(vec![])).await;

    session.sample_once().unwrap();
    let denied = session.manual_capture().unwrap_err();
    assert!(!denied.to_string().is_empty());
    assert_eq!(session.gallery().len(), 0);
}

#[tokio::test]
async fn test_detector_error_budget_exhaustion() {
    let script: Vec<_> = (0..10)
        .map(|_| Err(DetectionError::Backend("tensor shape mismatch".into())))
        .collect();
    let (mut session, feedback) = running_session(ScriptedDetector::new(script)).await;

    for i in 0..9 {
        assert!(session.sample_once().is_ok(), "tick {} should survive", i);
    }
    let err = session.sample_once().unwrap_err();
    assert_eq!(err.kind, SessionErrorKind::DetectionFailed);
    assert!(feedback
        .events()
        .iter()
        .any(|e| matches!(e, FeedbackEvent::SessionFailed(_))));
}

#[tokio::test]
async fn test_video_not_ready_decays_error_counter() {
    // Alternate hard errors with not-ready ticks forever: the budget is
    // never exhausted.
    let mut script = Vec::new();
    for _ in 0..30 {
        script.push(Err(DetectionError::Backend("flaky".into())));
        script.push(Err(DetectionError::VideoNotReady));
    }
    let (mut session, _feedback) = running_session(ScriptedDetector::new(script)).await;

    for _ in 0..60 {
        assert!(session.sample_once().is_ok());
    }
}

#[tokio::test(start_paused = true)]
async fn test_busy_camera_retries_then_starts() {
    let feedback = SharedFeedback::default();
    // One busy failure, then the scripted source starts cleanly.
    let source = ScriptedSource::failing_with(CameraError::DeviceBusy("in use".into()));
    let mut session = CaptureSession::new(
        FacegateConfig::default(),
        Box::new(source),
        Box::new(ScriptedDetector::constant(vec![good_detection()])),
        Box::new(feedback.clone()),
    )
    .unwrap();

    session.start().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Running);
}

#[tokio::test]
async fn test_model_load_failure_is_fatal() {
    let feedback = SharedFeedback::default();
    let mut session = CaptureSession::new(
        FacegateConfig::default(),
        Box::new(ScriptedSource::new(vec![])),
        Box::new(ScriptedDetector::failing_to_load(DetectionError::ModelLoad(
            "weights missing".into(),
        ))),
        Box::new(feedback.clone()),
    )
    .unwrap();

    let err = session.start().await.unwrap_err();
    assert_eq!(err.kind, SessionErrorKind::ModelLoad);
    assert_eq!(session.phase(), SessionPhase::Failed);
}

struct CountingUploader {
    calls: u32,
}

impl FaceUploader for CountingUploader {
    fn upload(&mut self, _request: &RegistrationRequest) -> Result<(), UploadError> {
        self.calls += 1;
        Ok(())
    }
}

#[tokio::test]
async fn test_session_submit_reports_set_validation() {
    let (mut session, _feedback) =
        running_session(ScriptedDetector::constant(vec![good_detection()])).await;

    // Collect the minimum set through manual captures. The scripted
    // source repeats one frame, so every image is identical.
    for _ in 0..5 {
        session.sample_once().unwrap();
        session.manual_capture().unwrap();
        for _ in 0..3 {
            session.second_tick();
        }
    }
    assert_eq!(session.gallery().len(), 5);

    let mut uploader = CountingUploader { calls: 0 };
    let result: Result<SetValidation, SubmitError> = session.submit(&mut uploader).await;

    // An identical set fails diversity validation before any upload.
    assert!(matches!(result, Err(SubmitError::SetRejected(_))));
    assert_eq!(uploader.calls, 0);
}

#[tokio::test]
async fn test_shutdown_clears_everything() {
    let (mut session, _feedback) =
        running_session(ScriptedDetector::constant(vec![good_detection()])).await;

    session.sample_once().unwrap();
    session.manual_capture().unwrap();
    for _ in 0..4 {
        session.sample_once().unwrap();
    }
    assert!(session.overlay().is_some());

    session.shutdown();
    assert_eq!(session.phase(), SessionPhase::Stopped);
    assert!(session.overlay().is_none());
    assert_eq!(session.engine().progress(), 0);
    assert_eq!(session.engine().consecutive_good(), 0);
    // Collected images survive teardown.
    assert_eq!(session.gallery().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_loop_stops_via_handle() {
    let (mut session, _feedback) =
        running_session(ScriptedDetector::constant(vec![good_detection()])).await;

    let stop = session.stop_handle();
    stop.stop();
    session.run().await.unwrap();
    assert_eq!(session.phase(), SessionPhase::Stopped);
}
