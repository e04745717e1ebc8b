//! Frame sampling cadence.
//!
//! The sampling interval is picked once from a best-effort device estimate
//! at session start and never changes mid-session, so capture behavior is
//! reproducible for a given device class.

use serde::Serialize;
use std::time::Duration;

/// Rough device capability tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    High,
    Medium,
    Low,
}

impl DeviceClass {
    /// Fixed per-session frame sampling interval.
    pub fn sampling_interval(&self) -> Duration {
        match self {
            DeviceClass::High => Duration::from_millis(100),
            DeviceClass::Medium => Duration::from_millis(200),
            DeviceClass::Low => Duration::from_millis(300),
        }
    }

    pub fn from_profile(profile: &DeviceProfile) -> Self {
        if profile.low_power {
            return DeviceClass::Low;
        }
        match profile.cpu_cores {
            n if n >= 8 => DeviceClass::High,
            n if n >= 4 => DeviceClass::Medium,
            _ => DeviceClass::Low,
        }
    }
}

/// What we could find out about the host. All fields are best-effort hints;
/// a wrong guess only changes pacing, never correctness.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub cpu_cores: usize,
    pub low_power: bool,
}

impl DeviceProfile {
    pub fn probe() -> Self {
        let cpu_cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            cpu_cores,
            low_power: false,
        }
    }

    pub fn with_low_power(mut self, low_power: bool) -> Self {
        self.low_power = low_power;
        self
    }
}
