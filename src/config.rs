//! Monitor configuration.
//!
//! Every value here is fixed for the lifetime of a [`MonitorSession`](crate::session::MonitorSession).

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Encoding width of a single landmark axis when hashing a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateWidth {
    #[default]
    Bits16,
    Bits32,
}

impl CoordinateWidth {
    pub fn bits(self) -> u32 {
        match self {
            CoordinateWidth::Bits16 => 16,
            CoordinateWidth::Bits32 => 32,
        }
    }
}

// Longest interval chrono can represent comfortably; anything above is a typo.
const MAX_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Minimum time between two admitted alerts for the same subject and event.
    pub cooldown_secs: u64,

    /// Continuous absence after which the user counts as having left.
    pub absence_threshold_secs: u64,

    /// Landmarks per face produced by the landmark model.
    pub landmark_count: usize,

    pub coordinate_width: CoordinateWidth,

    /// Upper bound on a single logging or notification call.
    pub sink_timeout_ms: u64,

    /// Pause before re-reading after the camera reported off.
    pub camera_retry_pause_ms: u64,

    pub fps: u32,

    /// Oldest ledger entries are evicted past this size. Unbounded when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_capacity: Option<usize>,

    pub warning_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 10,
            absence_threshold_secs: 5,
            landmark_count: 68,
            coordinate_width: CoordinateWidth::Bits16,
            sink_timeout_ms: 2_000,
            camera_retry_pause_ms: 1_000,
            fps: 30,
            ledger_capacity: None,
            warning_capacity: 32,
        }
    }
}

impl MonitorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_interval("cooldown_secs", self.cooldown_secs)?;
        check_interval("absence_threshold_secs", self.absence_threshold_secs)?;
        if self.landmark_count == 0 {
            return Err(invalid("landmark_count", "must be positive"));
        }
        if self.sink_timeout_ms == 0 {
            return Err(invalid("sink_timeout_ms", "must be positive"));
        }
        if self.fps == 0 || self.fps > 1_000 {
            return Err(invalid("fps", format!("must be in 1..=1000, got {}", self.fps)));
        }
        if self.ledger_capacity == Some(0) {
            return Err(invalid("ledger_capacity", "must be positive when set"));
        }
        if self.warning_capacity == 0 {
            return Err(invalid("warning_capacity", "must be positive"));
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn absence_threshold(&self) -> Duration {
        Duration::from_secs(self.absence_threshold_secs)
    }

    pub fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }

    pub fn camera_retry_pause(&self) -> Duration {
        Duration::from_millis(self.camera_retry_pause_ms)
    }

    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(1000 / self.fps.max(1) as u64)
    }

    pub fn with_cooldown_secs(mut self, secs: u64) -> Self {
        self.cooldown_secs = secs;
        self
    }

    pub fn with_absence_threshold_secs(mut self, secs: u64) -> Self {
        self.absence_threshold_secs = secs;
        self
    }

    pub fn with_landmark_count(mut self, count: usize) -> Self {
        self.landmark_count = count;
        self
    }

    pub fn with_camera_retry_pause_ms(mut self, ms: u64) -> Self {
        self.camera_retry_pause_ms = ms;
        self
    }

    pub fn with_ledger_capacity(mut self, capacity: usize) -> Self {
        self.ledger_capacity = Some(capacity);
        self
    }
}

fn check_interval(field: &'static str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 {
        return Err(invalid(field, "must be positive"));
    }
    if secs > MAX_INTERVAL_SECS {
        return Err(invalid(field, format!("{secs}s exceeds one year")));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
