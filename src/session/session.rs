//! The capture session: one cooperative task owning the whole pipeline.
//!
//! Exactly one unit of work happens per sampling tick: pull a frame, run
//! detection, evaluate quality, feed the engine. The next sample is never
//! scheduled until the previous detection resolved, so frames cannot be
//! processed out of order. Progress and countdown clocks run on their own
//! intervals but mutate state only through the engine's transition methods.

use crate::camera::{start_with_retry, FrameSource};
use crate::config::FacegateConfig;
use crate::detector::FaceDetector;
use crate::errors::CameraError;
use crate::feedback::{FeedbackEvent, FeedbackSink};
use crate::quality::{FrameAssessment, QualityEvaluator, SetValidation};
use crate::session::engine::{CaptureDenied, CaptureEngine, CaptureTrigger, EngineEvent};
use crate::session::errors::SessionError;
use crate::session::gallery::CaptureGallery;
use crate::session::pacing::{DeviceClass, DeviceProfile};
use crate::types::{CapturedImage, FaceBox, VideoFrame};
use crate::upload::{submit_registration, FaceUploader, SubmitError};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Open,
    Running,
    Stopped,
    Failed,
    Closed,
}

/// Clonable handle for stopping a running session from outside its task.
#[derive(Clone)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}

pub struct CaptureSession {
    id: Uuid,
    config: FacegateConfig,
    source: Box<dyn FrameSource>,
    detector: Box<dyn FaceDetector>,
    evaluator: QualityEvaluator,
    engine: CaptureEngine,
    gallery: CaptureGallery,
    feedback: Box<dyn FeedbackSink>,
    device_class: DeviceClass,
    phase: SessionPhase,
    stop_flag: Arc<AtomicBool>,
    consecutive_errors: u32,
    frame_sequence: u64,
    last_frame: Option<VideoFrame>,
    last_assessment: Option<FrameAssessment>,
    /// Face box of the most recent frame, for overlay rendering by the host.
    overlay: Option<FaceBox>,
}

impl CaptureSession {
    pub fn new(
        config: FacegateConfig,
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        feedback: Box<dyn FeedbackSink>,
    ) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::invalid_argument)?;

        let evaluator = QualityEvaluator::new(config.quality.clone(), &config.detection);
        let engine = CaptureEngine::new(&config.capture, config.quality.min_quality_score);
        let gallery = CaptureGallery::new(
            config.capture.min_images,
            config.capture.max_images,
            config.quality.min_quality_score,
        );
        let device_class = DeviceClass::from_profile(&DeviceProfile::probe());

        Ok(Self {
            id: Uuid::new_v4(),
            config,
            source,
            detector,
            evaluator,
            engine,
            gallery,
            feedback,
            device_class,
            phase: SessionPhase::Open,
            stop_flag: Arc::new(AtomicBool::new(false)),
            consecutive_errors: 0,
            frame_sequence: 0,
            last_frame: None,
            last_assessment: None,
            overlay: None,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn device_class(&self) -> DeviceClass {
        self.device_class
    }

    pub fn engine(&self) -> &CaptureEngine {
        &self.engine
    }

    pub fn gallery(&self) -> &CaptureGallery {
        &self.gallery
    }

    pub fn gallery_mut(&mut self) -> &mut CaptureGallery {
        &mut self.gallery
    }

    pub fn overlay(&self) -> Option<FaceBox> {
        self.overlay
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: self.stop_flag.clone(),
        }
    }

    /// Load the detection model and bring the camera up.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Closed => return Err(SessionError::closed()),
            SessionPhase::Running => return Err(SessionError::already_running()),
            SessionPhase::Open | SessionPhase::Stopped | SessionPhase::Failed => {}
        }

        self.feedback.notify(FeedbackEvent::ModelLoading);
        if let Err(e) = self.detector.load_model() {
            self.phase = SessionPhase::Failed;
            self.feedback
                .notify(FeedbackEvent::SessionFailed(e.to_string()));
            return Err(SessionError::model_load(e));
        }

        let attempts = self.config.camera.reconnect_attempts;
        let delay = Duration::from_millis(self.config.camera.reconnect_delay_ms);
        if let Err(e) = start_with_retry(self.source.as_mut(), attempts, delay).await {
            self.phase = SessionPhase::Failed;
            self.feedback
                .notify(FeedbackEvent::SessionFailed(e.user_hint().to_string()));
            return Err(SessionError::camera(e));
        }

        self.stop_flag.store(false, Ordering::Relaxed);
        self.consecutive_errors = 0;
        self.phase = SessionPhase::Running;
        self.feedback.notify(FeedbackEvent::Ready);
        log::info!(
            "Session {} running on camera {} ({:?} pacing, {:?})",
            self.id,
            self.source.device_id(),
            self.device_class,
            self.device_class.sampling_interval()
        );
        Ok(())
    }

    /// Drive the session until it is stopped or fails.
    pub async fn run(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Running {
            return Err(SessionError::stopped());
        }

        let mut sample = tokio::time::interval(self.device_class.sampling_interval());
        let mut progress = tokio::time::interval(Duration::from_millis(100));
        let mut seconds = tokio::time::interval(Duration::from_secs(1));
        sample.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        progress.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        seconds.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                self.shutdown();
                return Ok(());
            }

            tokio::select! {
                _ = sample.tick() => {
                    if let Err(e) = self.sample_once() {
                        self.shutdown_failed();
                        return Err(e);
                    }
                }
                _ = progress.tick() => {
                    let events = self.engine.progress_tick();
                    self.dispatch(events);
                }
                _ = seconds.tick() => {
                    let events = self.engine.second_tick(self.gallery.len());
                    self.dispatch(events);
                }
            }
        }
    }

    /// One sampling tick: frame, detection, assessment, engine transition.
    ///
    /// Public so hosts (and tests) can drive the session deterministically
    /// instead of through `run`'s timers.
    pub fn sample_once(&mut self) -> Result<(), SessionError> {
        let frame = match self.source.try_frame() {
            Ok(Some(frame)) => frame.with_sequence(self.next_sequence()),
            Ok(None) => {
                // Feed warming up; decay the error counter.
                self.consecutive_errors = self.consecutive_errors.saturating_sub(1);
                return Ok(());
            }
            Err(e) => return self.fail_camera(e),
        };

        let detections = match self.detector.detect(&frame) {
            Ok(detections) => {
                self.consecutive_errors = 0;
                detections
            }
            Err(e) if e.is_transient() => {
                self.consecutive_errors = self.consecutive_errors.saturating_sub(1);
                return Ok(());
            }
            Err(e) => {
                self.consecutive_errors += 1;
                log::warn!(
                    "Detection error {}/{}: {}",
                    self.consecutive_errors,
                    self.config.detection.max_consecutive_errors,
                    e
                );
                if self.consecutive_errors >= self.config.detection.max_consecutive_errors {
                    let err = SessionError::detection_failed(self.consecutive_errors);
                    self.feedback
                        .notify(FeedbackEvent::SessionFailed(err.message.clone()));
                    return Err(err);
                }
                return Ok(());
            }
        };

        self.overlay = detections.first().map(|d| d.bounding_box);
        let assessment = self.evaluator.assess(&detections, &frame);
        let events = self.engine.on_assessment(&assessment, self.gallery.len());
        self.last_frame = Some(frame);
        self.last_assessment = Some(assessment);
        self.dispatch(events);
        Ok(())
    }

    /// Advance the engine's 100 ms progress clock by hand.
    pub fn progress_tick(&mut self) {
        let events = self.engine.progress_tick();
        self.dispatch(events);
    }

    /// Advance the engine's 1 s countdown/cooldown clock by hand.
    pub fn second_tick(&mut self) {
        let events = self.engine.second_tick(self.gallery.len());
        self.dispatch(events);
    }

    /// User-initiated capture of the current frame.
    pub fn manual_capture(&mut self) -> Result<(), CaptureDenied> {
        let events = self
            .engine
            .manual_capture(self.last_assessment.as_ref(), self.gallery.len())?;
        self.dispatch(events);
        Ok(())
    }

    /// Validate and upload the collected set, returning the set-level
    /// validation on success.
    pub async fn submit(
        &mut self,
        uploader: &mut dyn FaceUploader,
    ) -> Result<SetValidation, SubmitError> {
        submit_registration(
            &self.gallery,
            &self.evaluator,
            uploader,
            self.feedback.as_mut(),
            &self.config.upload,
            self.config.quality.jpeg_quality,
        )
        .await
    }

    /// Synchronous teardown: camera, detector, engine clocks, and overlay
    /// all go down together.
    pub fn shutdown(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        self.stop_flag.store(true, Ordering::Relaxed);
        self.source.stop();
        self.detector.dispose();
        self.engine.reset();
        self.overlay = None;
        self.last_frame = None;
        self.last_assessment = None;
        if self.phase != SessionPhase::Failed {
            self.phase = SessionPhase::Stopped;
        }
        log::info!("Session {} stopped", self.id);
    }

    fn shutdown_failed(&mut self) {
        self.phase = SessionPhase::Failed;
        self.shutdown();
    }

    fn fail_camera(&mut self, error: CameraError) -> Result<(), SessionError> {
        self.feedback
            .notify(FeedbackEvent::SessionFailed(error.user_hint().to_string()));
        Err(SessionError::camera(error))
    }

    fn next_sequence(&mut self) -> u64 {
        self.frame_sequence = self.frame_sequence.saturating_add(1);
        self.frame_sequence
    }

    fn dispatch(&mut self, events: Vec<EngineEvent>) {
        for event in events {
            match event {
                EngineEvent::GuidanceChanged(verdict) => {
                    self.feedback.notify(FeedbackEvent::Guidance(verdict));
                }
                EngineEvent::StepChanged(step) => {
                    self.feedback.notify(FeedbackEvent::StepChanged(step));
                }
                EngineEvent::CountdownStarted(secs) => {
                    self.feedback.notify(FeedbackEvent::CountdownStarted(secs));
                }
                EngineEvent::CountdownTick(secs) => {
                    self.feedback.notify(FeedbackEvent::CountdownTick(secs));
                }
                EngineEvent::CountdownAborted => {
                    self.feedback.notify(FeedbackEvent::CountdownAborted);
                }
                EngineEvent::CaptureRequested(trigger) => {
                    self.perform_capture(trigger);
                }
                EngineEvent::CooldownStarted(secs) => {
                    self.feedback.notify(FeedbackEvent::CooldownStarted(secs));
                }
                EngineEvent::CooldownFinished => {}
            }
        }
    }

    fn perform_capture(&mut self, trigger: CaptureTrigger) {
        let (frame, assessment) = match (&self.last_frame, &self.last_assessment) {
            (Some(frame), Some(assessment)) => (frame.clone(), assessment),
            _ => {
                log::warn!("Capture requested with no frame available");
                let events = self.engine.capture_rejected();
                self.dispatch(events);
                return;
            }
        };

        let image = CapturedImage {
            frame,
            quality_score: assessment.score,
            detection_confidence: assessment.confidence,
            captured_at: Utc::now(),
        };

        let validation = self.evaluator.validate_captured(&image);
        if !validation.is_valid {
            let reason = validation
                .issues
                .first()
                .map(|i| i.remediation())
                .unwrap_or("Capture did not pass validation. Try again.");
            log::info!(
                "Discarding {:?} capture (score {:.2}): {}",
                trigger,
                validation.score,
                reason
            );
            self.feedback.notify(FeedbackEvent::CaptureRejected(reason));
            let events = self.engine.capture_rejected();
            self.dispatch(events);
            return;
        }

        match self.gallery.append(image) {
            Ok(count) => {
                self.feedback.notify(FeedbackEvent::CaptureSaved {
                    count,
                    max: self.gallery.max_images(),
                    score: validation.score,
                });
                if self.config.capture.prune_low_quality {
                    let pruned = self.gallery.prune_low_quality();
                    if pruned > 0 {
                        self.feedback.notify(FeedbackEvent::LowQualityPruned(pruned));
                    }
                }
                let events = self.engine.capture_succeeded();
                self.dispatch(events);
            }
            Err(e) => {
                log::warn!("Capture arrived with gallery full: {}", e);
                self.feedback
                    .notify(FeedbackEvent::CaptureRejected("Maximum images reached."));
                let events = self.engine.capture_rejected();
                self.dispatch(events);
            }
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if matches!(self.phase, SessionPhase::Running) {
            self.shutdown();
        }
        self.phase = SessionPhase::Closed;
    }
}
