//! One-way user feedback channel.
//!
//! The session narrates state changes (guidance prompts, countdown ticks,
//! capture results, upload progress) through a [`FeedbackSink`]. Sinks are
//! fire-and-forget; nothing in the pipeline waits on them.

use crate::quality::FaceVerdict;
use crate::types::CaptureStep;

/// A state change worth telling the user about.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackEvent {
    ModelLoading,
    Ready,
    /// The per-frame verdict changed; carries the new guidance.
    Guidance(FaceVerdict),
    StepChanged(CaptureStep),
    CountdownStarted(u32),
    CountdownTick(u32),
    CountdownAborted,
    CaptureSaved {
        count: usize,
        max: usize,
        score: f32,
    },
    CaptureRejected(&'static str),
    CooldownStarted(u32),
    LowQualityPruned(usize),
    UploadAttempt {
        attempt: u32,
        max_attempts: u32,
    },
    UploadRetrying {
        attempt: u32,
        delay_secs: u64,
    },
    UploadSucceeded,
    UploadFailed(String),
    SessionFailed(String),
}

impl FeedbackEvent {
    /// Render the event as a spoken/toast-style prompt.
    pub fn message(&self) -> String {
        match self {
            FeedbackEvent::ModelLoading => "Loading face detection...".to_string(),
            FeedbackEvent::Ready => "Position your face in the frame.".to_string(),
            FeedbackEvent::Guidance(verdict) => verdict.message().to_string(),
            FeedbackEvent::StepChanged(step) => match step {
                CaptureStep::Detecting => "Looking for your face...".to_string(),
                CaptureStep::Aligning => "Almost there, keep aligning.".to_string(),
                CaptureStep::Capturing => "Great, hold steady.".to_string(),
                CaptureStep::Completed => "Alignment complete.".to_string(),
            },
            FeedbackEvent::CountdownStarted(secs) => {
                format!("Hold still, capturing in {}...", secs)
            }
            FeedbackEvent::CountdownTick(secs) => format!("{}...", secs),
            FeedbackEvent::CountdownAborted => "Capture cancelled, realign your face.".to_string(),
            FeedbackEvent::CaptureSaved { count, max, .. } => {
                format!("Captured image {} of {}.", count, max)
            }
            FeedbackEvent::CaptureRejected(reason) => (*reason).to_string(),
            FeedbackEvent::CooldownStarted(secs) => {
                format!("Saved. Next capture in {} seconds.", secs)
            }
            FeedbackEvent::LowQualityPruned(n) => {
                format!("Removed {} low-quality image(s).", n)
            }
            FeedbackEvent::UploadAttempt { attempt, max_attempts } => {
                format!("Uploading images (attempt {} of {})...", attempt, max_attempts)
            }
            FeedbackEvent::UploadRetrying { delay_secs, .. } => {
                format!("Upload failed, retrying in {} seconds...", delay_secs)
            }
            FeedbackEvent::UploadSucceeded => "Face registration submitted.".to_string(),
            FeedbackEvent::UploadFailed(msg) => format!("Upload failed: {}", msg),
            FeedbackEvent::SessionFailed(msg) => format!("Capture stopped: {}", msg),
        }
    }
}

/// Receiver for session feedback. Implementations must not block.
pub trait FeedbackSink: Send {
    fn notify(&mut self, event: FeedbackEvent);
}

/// Default sink: logs each prompt, suppressing back-to-back repeats of the
/// same message so guidance does not spam while a condition persists.
#[derive(Debug, Default)]
pub struct LogFeedback {
    last_message: Option<String>,
}

impl LogFeedback {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedbackSink for LogFeedback {
    fn notify(&mut self, event: FeedbackEvent) {
        let message = event.message();
        if self.last_message.as_deref() == Some(message.as_str()) {
            return;
        }
        match event {
            FeedbackEvent::SessionFailed(_) | FeedbackEvent::UploadFailed(_) => {
                log::warn!("{}", message)
            }
            _ => log::info!("{}", message),
        }
        self.last_message = Some(message);
    }
}

/// Sink that drops everything. Useful for tests and embedding.
#[derive(Debug, Default)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn notify(&mut self, _event: FeedbackEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        messages: Vec<String>,
        last: Option<String>,
    }

    impl FeedbackSink for RecordingSink {
        fn notify(&mut self, event: FeedbackEvent) {
            let message = event.message();
            if self.last.as_deref() == Some(message.as_str()) {
                return;
            }
            self.last = Some(message.clone());
            self.messages.push(message);
        }
    }

    #[test]
    fn test_messages_are_user_facing() {
        let event = FeedbackEvent::CaptureSaved {
            count: 3,
            max: 10,
            score: 0.85,
        };
        assert_eq!(event.message(), "Captured image 3 of 10.");
        assert_eq!(
            FeedbackEvent::Guidance(FaceVerdict::TooSmall).message(),
            "Move closer to the camera."
        );
    }

    #[test]
    fn test_consecutive_duplicates_suppressed() {
        let mut sink = RecordingSink::default();
        sink.notify(FeedbackEvent::Guidance(FaceVerdict::NoFace));
        sink.notify(FeedbackEvent::Guidance(FaceVerdict::NoFace));
        sink.notify(FeedbackEvent::Guidance(FaceVerdict::Good));
        sink.notify(FeedbackEvent::Guidance(FaceVerdict::NoFace));
        assert_eq!(sink.messages.len(), 3);
    }
}
