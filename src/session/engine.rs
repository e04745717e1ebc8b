//! Tick-driven auto-capture state machine.
//!
//! The engine is synchronous: the session feeds it frame assessments,
//! 100 ms progress ticks, and 1 s countdown/cooldown ticks, and it answers
//! with the events those inputs caused. All capture state lives here, in
//! one place, behind one transition path.
//!
//! Time model:
//! - `on_assessment` runs once per sampled frame.
//! - `progress_tick` runs every 100 ms; progress gains 1 point per tick
//!   while the ticker is running and snaps to 0 on any quality loss.
//! - `second_tick` runs every second and drives the countdown and cooldown.

use crate::config::CaptureConfig;
use crate::quality::{FaceVerdict, FrameAssessment};
use crate::types::CaptureStep;
use thiserror::Error;

/// What started a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTrigger {
    Auto,
    Manual,
}

/// Countdown/cooldown phase. Exactly one of these is active at a time;
/// a capture can never be pending while a cooldown runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoCaptureState {
    Idle,
    CountingDown { remaining_secs: u32 },
    Cooldown { remaining_secs: u32 },
}

/// Outputs of a transition, in the order they occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The per-frame verdict changed since the previous frame.
    GuidanceChanged(FaceVerdict),
    StepChanged(CaptureStep),
    CountdownStarted(u32),
    CountdownTick(u32),
    CountdownAborted,
    /// The engine wants the current frame captured now.
    CaptureRequested(CaptureTrigger),
    CooldownStarted(u32),
    CooldownFinished,
}

/// Why a manual capture was refused.
#[derive(Debug, Error, PartialEq)]
pub enum CaptureDenied {
    #[error("maximum of {max} images reached")]
    AtCapacity { max: usize },

    #[error("a capture is already in progress")]
    InProgress,

    #[error("face is not ready: {}", .verdict.message())]
    FaceNotReady { verdict: FaceVerdict },

    #[error("quality score {score:.2} below required {required:.2}")]
    LowScore { score: f32, required: f32 },
}

#[derive(Debug)]
pub struct CaptureEngine {
    consecutive_good_target: u32,
    countdown_secs: u32,
    cooldown_secs: u32,
    max_images: usize,
    min_quality_score: f32,

    progress: u8,
    step: CaptureStep,
    ticker_running: bool,
    consecutive_good: u32,
    auto: AutoCaptureState,
    capturing: bool,

    last_verdict: Option<FaceVerdict>,
    last_score: f32,
}

impl CaptureEngine {
    pub fn new(capture: &CaptureConfig, min_quality_score: f32) -> Self {
        Self {
            consecutive_good_target: capture.consecutive_good_target,
            countdown_secs: capture.countdown_secs,
            cooldown_secs: capture.cooldown_secs,
            max_images: capture.max_images,
            min_quality_score,
            progress: 0,
            step: CaptureStep::Detecting,
            ticker_running: false,
            consecutive_good: 0,
            auto: AutoCaptureState::Idle,
            capturing: false,
            last_verdict: None,
            last_score: 0.0,
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn step(&self) -> CaptureStep {
        self.step
    }

    pub fn auto_state(&self) -> AutoCaptureState {
        self.auto
    }

    pub fn consecutive_good(&self) -> u32 {
        self.consecutive_good
    }

    pub fn in_cooldown(&self) -> bool {
        matches!(self.auto, AutoCaptureState::Cooldown { .. })
    }

    /// Feed one sampled frame's assessment through the machine.
    pub fn on_assessment(&mut self, assessment: &FrameAssessment, stored: usize) -> Vec<EngineEvent> {
        let mut events = Vec::new();

        if self.last_verdict != Some(assessment.verdict) {
            self.last_verdict = Some(assessment.verdict);
            events.push(EngineEvent::GuidanceChanged(assessment.verdict));
        }

        let good = assessment.verdict.is_good();
        let counts = good && assessment.score >= self.min_quality_score;

        if good {
            if self.progress == 0 {
                self.ticker_running = true;
            }
        } else {
            self.reset_progress(&mut events);
        }

        if counts {
            self.consecutive_good += 1;
            self.last_score = assessment.score;
            if self.consecutive_good >= self.consecutive_good_target
                && self.auto == AutoCaptureState::Idle
                && !self.capturing
                && stored < self.max_images
            {
                self.auto = AutoCaptureState::CountingDown {
                    remaining_secs: self.countdown_secs,
                };
                events.push(EngineEvent::CountdownStarted(self.countdown_secs));
            }
        } else {
            self.consecutive_good = 0;
            self.last_score = 0.0;
            if matches!(self.auto, AutoCaptureState::CountingDown { .. }) {
                self.auto = AutoCaptureState::Idle;
                events.push(EngineEvent::CountdownAborted);
            }
        }

        events
    }

    /// Advance the 100 ms progress ticker.
    pub fn progress_tick(&mut self) -> Vec<EngineEvent> {
        if !self.ticker_running {
            return Vec::new();
        }
        let mut events = Vec::new();
        if self.progress < 100 {
            self.progress += 1;
        }
        if self.progress >= 100 {
            self.ticker_running = false;
        }
        let step = CaptureStep::from_progress(self.progress);
        if step != self.step {
            self.step = step;
            events.push(EngineEvent::StepChanged(step));
        }
        events
    }

    /// Advance the 1 s countdown/cooldown clock.
    ///
    /// The countdown re-validates the latest frame at expiry: only a frame
    /// that is still good fires the capture, otherwise the attempt aborts
    /// and the good-frame counter restarts.
    pub fn second_tick(&mut self, stored: usize) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        match self.auto {
            AutoCaptureState::CountingDown { remaining_secs } => {
                let remaining = remaining_secs.saturating_sub(1);
                if remaining > 0 {
                    self.auto = AutoCaptureState::CountingDown {
                        remaining_secs: remaining,
                    };
                    events.push(EngineEvent::CountdownTick(remaining));
                } else {
                    self.auto = AutoCaptureState::Idle;
                    let still_good = self.last_verdict == Some(FaceVerdict::Good)
                        && self.last_score >= self.min_quality_score;
                    if still_good && !self.capturing && stored < self.max_images {
                        self.capturing = true;
                        self.reset_progress(&mut events);
                        events.push(EngineEvent::CaptureRequested(CaptureTrigger::Auto));
                    } else {
                        self.consecutive_good = 0;
                        events.push(EngineEvent::CountdownAborted);
                    }
                }
            }
            AutoCaptureState::Cooldown { remaining_secs } => {
                let remaining = remaining_secs.saturating_sub(1);
                if remaining > 0 {
                    self.auto = AutoCaptureState::Cooldown {
                        remaining_secs: remaining,
                    };
                } else {
                    self.auto = AutoCaptureState::Idle;
                    events.push(EngineEvent::CooldownFinished);
                }
            }
            AutoCaptureState::Idle => {}
        }
        events
    }

    /// Request an immediate capture, bypassing the countdown but not the
    /// quality gates.
    pub fn manual_capture(
        &mut self,
        assessment: Option<&FrameAssessment>,
        stored: usize,
    ) -> Result<Vec<EngineEvent>, CaptureDenied> {
        if stored >= self.max_images {
            return Err(CaptureDenied::AtCapacity {
                max: self.max_images,
            });
        }
        if self.capturing {
            return Err(CaptureDenied::InProgress);
        }
        let assessment = assessment.ok_or(CaptureDenied::FaceNotReady {
            verdict: FaceVerdict::NoFace,
        })?;
        if !assessment.verdict.is_good() {
            return Err(CaptureDenied::FaceNotReady {
                verdict: assessment.verdict,
            });
        }
        if assessment.score < self.min_quality_score {
            return Err(CaptureDenied::LowScore {
                score: assessment.score,
                required: self.min_quality_score,
            });
        }

        let mut events = Vec::new();
        if matches!(self.auto, AutoCaptureState::CountingDown { .. }) {
            self.auto = AutoCaptureState::Idle;
            events.push(EngineEvent::CountdownAborted);
        }
        self.capturing = true;
        self.reset_progress(&mut events);
        events.push(EngineEvent::CaptureRequested(CaptureTrigger::Manual));
        Ok(events)
    }

    /// The requested capture was validated and stored: start the cooldown.
    pub fn capture_succeeded(&mut self) -> Vec<EngineEvent> {
        self.capturing = false;
        self.consecutive_good = 0;
        self.auto = AutoCaptureState::Cooldown {
            remaining_secs: self.cooldown_secs,
        };
        vec![EngineEvent::CooldownStarted(self.cooldown_secs)]
    }

    /// The requested capture failed validation: no cooldown, no extra
    /// punishment beyond the counter restart.
    pub fn capture_rejected(&mut self) -> Vec<EngineEvent> {
        self.capturing = false;
        self.consecutive_good = 0;
        Vec::new()
    }

    /// Snap everything back to the initial state. Part of session teardown.
    pub fn reset(&mut self) {
        self.progress = 0;
        self.step = CaptureStep::Detecting;
        self.ticker_running = false;
        self.consecutive_good = 0;
        self.auto = AutoCaptureState::Idle;
        self.capturing = false;
        self.last_verdict = None;
        self.last_score = 0.0;
    }

    fn reset_progress(&mut self, events: &mut Vec<EngineEvent>) {
        self.progress = 0;
        self.ticker_running = false;
        if self.step != CaptureStep::Detecting {
            self.step = CaptureStep::Detecting;
            events.push(EngineEvent::StepChanged(CaptureStep::Detecting));
        }
    }
}
