//! Frame source abstraction over a live video feed.
//!
//! The capture session never talks to capture hardware directly; it pulls
//! frames through [`FrameSource`] so that platform backends, remote streams,
//! and scripted test feeds all plug in the same way.

use crate::errors::CameraError;
use crate::types::VideoFrame;
use std::time::Duration;

/// A live video feed that yields RGB frames on demand.
///
/// `try_frame` returns `Ok(None)` while the source is warming up or has no
/// fresh frame yet; that is the normal idle case, not a failure.
pub trait FrameSource: Send {
    /// Bring the stream up. Called once per session start (plus reconnect
    /// attempts for busy devices).
    fn start(&mut self) -> Result<(), CameraError>;

    /// Tear the stream down. Must be safe to call more than once.
    fn stop(&mut self);

    /// Pull the most recent frame, if one is available.
    fn try_frame(&mut self) -> Result<Option<VideoFrame>, CameraError>;

    /// Identifier of the underlying device.
    fn device_id(&self) -> &str;
}

/// Start a frame source, retrying busy devices.
///
/// Only `DeviceBusy` is retried; permission and not-found errors are final
/// on the first attempt. `attempts` counts total tries, so `attempts = 3`
/// means at most two delays.
pub async fn start_with_retry(
    source: &mut dyn FrameSource,
    attempts: u32,
    delay: Duration,
) -> Result<(), CameraError> {
    let attempts = attempts.max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        match source.start() {
            Ok(()) => {
                if attempt > 1 {
                    log::info!(
                        "Camera {} started after {} attempts",
                        source.device_id(),
                        attempt
                    );
                }
                return Ok(());
            }
            Err(e) if e.is_retryable() && attempt < attempts => {
                log::warn!(
                    "Camera {} busy (attempt {}/{}), retrying in {:?}: {}",
                    source.device_id(),
                    attempt,
                    attempts,
                    delay,
                    e
                );
                last_err = Some(e);
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }

    // Unreachable with attempts >= 1, but keep the compiler honest.
    Err(last_err.unwrap_or_else(|| {
        CameraError::InitializationError("camera start exhausted retries".to_string())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakySource {
        failures_left: u32,
        starts: u32,
    }

    impl FrameSource for FlakySource {
        fn start(&mut self) -> Result<(), CameraError> {
            self.starts += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                Err(CameraError::DeviceBusy("held elsewhere".into()))
            } else {
                Ok(())
            }
        }

        fn stop(&mut self) {}

        fn try_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
            Ok(None)
        }

        fn device_id(&self) -> &str {
            "0"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_device_is_retried() {
        let mut source = FlakySource {
            failures_left: 2,
            starts: 0,
        };
        let result = start_with_retry(&mut source, 3, Duration::from_secs(2)).await;
        assert!(result.is_ok());
        assert_eq!(source.starts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_device_gives_up_after_attempts() {
        let mut source = FlakySource {
            failures_left: 5,
            starts: 0,
        };
        let result = start_with_retry(&mut source, 3, Duration::from_secs(2)).await;
        assert_eq!(
            result,
            Err(CameraError::DeviceBusy("held elsewhere".into()))
        );
        assert_eq!(source.starts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denied_is_not_retried() {
        struct DeniedSource {
            starts: u32,
        }
        impl FrameSource for DeniedSource {
            fn start(&mut self) -> Result<(), CameraError> {
                self.starts += 1;
                Err(CameraError::PermissionDenied("blocked".into()))
            }
            fn stop(&mut self) {}
            fn try_frame(&mut self) -> Result<Option<VideoFrame>, CameraError> {
                Ok(None)
            }
            fn device_id(&self) -> &str {
                "0"
            }
        }

        let mut source = DeniedSource { starts: 0 };
        let result = start_with_retry(&mut source, 3, Duration::from_secs(2)).await;
        assert!(matches!(result, Err(CameraError::PermissionDenied(_))));
        assert_eq!(source.starts, 1);
    }
}
