// Engine configuration - Loaded from RON or JSON

use crate::error::ConfigError;
use crate::sequencer::timeline::{StepGrid, Tempo};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Scheduler and transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Initial tempo (clamped to 30-300 BPM, never rejected)
    pub tempo_bpm: f64,
    pub steps_per_bar: u32,
    pub bars: u32,
    pub subdivisions_per_beat: u32,
    /// Lookahead window of the scheduler
    pub schedule_ahead_secs: f64,
    /// Period of the coarse scheduler timer
    pub tick_interval_ms: u64,
    /// Delay between start and the first step
    pub start_offset_secs: f64,
    pub command_capacity: usize,
    pub notification_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: Tempo::DEFAULT_BPM,
            steps_per_bar: StepGrid::DEFAULT_STEPS_PER_BAR,
            bars: 1,
            subdivisions_per_beat: StepGrid::DEFAULT_SUBDIVISIONS,
            schedule_ahead_secs: 0.1,
            tick_interval_ms: 25,
            start_offset_secs: 0.1,
            command_capacity: 256,
            notification_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Load from a `.ron` or `.json` file and validate
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let config = match extension.as_str() {
            "ron" => Self::from_ron(&content)?,
            "json" => Self::from_json(&content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Invalid(format!("Failed to serialize to RON: {}", e)))
    }

    /// Reject settings the scheduler cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps_per_bar == 0 {
            return Err(ConfigError::Invalid("steps_per_bar must be > 0".into()));
        }
        if self.bars == 0 {
            return Err(ConfigError::Invalid("bars must be > 0".into()));
        }
        if self.steps_per_bar.checked_mul(self.bars).is_none() {
            return Err(ConfigError::Invalid(format!(
                "{} bars of {} steps overflow the step counter",
                self.bars, self.steps_per_bar
            )));
        }
        if self.subdivisions_per_beat == 0 {
            return Err(ConfigError::Invalid(
                "subdivisions_per_beat must be > 0".into(),
            ));
        }
        if !(self.schedule_ahead_secs > 0.0 && self.schedule_ahead_secs.is_finite()) {
            return Err(ConfigError::Invalid(
                "schedule_ahead_secs must be a positive number of seconds".into(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be > 0".into()));
        }
        if self.tick_interval().as_secs_f64() >= self.schedule_ahead_secs {
            return Err(ConfigError::Invalid(format!(
                "tick interval ({} ms) must be shorter than the lookahead window ({} s)",
                self.tick_interval_ms, self.schedule_ahead_secs
            )));
        }
        if !(self.start_offset_secs >= 0.0 && self.start_offset_secs.is_finite()) {
            return Err(ConfigError::Invalid(
                "start_offset_secs must be >= 0".into(),
            ));
        }
        if self.command_capacity == 0 || self.notification_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel capacities must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Step grid described by this configuration
    pub fn grid(&self) -> StepGrid {
        StepGrid::new(self.steps_per_bar, self.bars, self.subdivisions_per_beat)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
