// Gain stage - Velocity-scaled amplitude target

use super::automation::AutomationLane;
use super::parameters::ParameterSet;
use crate::error::ListenerError;
use crate::sequencer::target::{Target, TriggerPayload};

pub struct GainStage {
    parameters: ParameterSet,
    gain: AutomationLane,
}

impl GainStage {
    pub const RELEASE_SECS: f64 = 0.01;

    pub fn new() -> Self {
        Self {
            parameters: ParameterSet::new().with("gain", 1.0, 0.0, 1.0),
            gain: AutomationLane::new(1.0),
        }
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn set_parameter(&mut self, name: &str, value: f64) -> Option<f64> {
        self.parameters.set(name, value)
    }

    pub fn level(&self) -> f64 {
        self.parameters.get("gain").unwrap_or(1.0)
    }

    pub fn gain_at(&self, t: f64) -> f64 {
        self.gain.value_at(t)
    }

    fn open(&mut self, time: f64, velocity: f64) {
        self.gain.cancel_scheduled_values(time);
        self.gain.set_value_at_time(self.level() * velocity, time);
    }

    fn release(&mut self, time: f64) {
        let held = self.gain.value_at(time);
        self.gain.cancel_scheduled_values(time);
        self.gain.set_value_at_time(held, time);
        self.gain
            .linear_ramp_to_value_at_time(0.0, time + Self::RELEASE_SECS);
    }
}

impl Default for GainStage {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for GainStage {
    fn trigger(&mut self, time: f64, payload: &TriggerPayload) -> Result<(), ListenerError> {
        self.gain.discard_before(time);
        match *payload {
            TriggerPayload::StopAll => self.release(time),
            TriggerPayload::Step { active: true, .. } => self.open(time, 1.0),
            TriggerPayload::Step { active: false, .. } => {}
            TriggerPayload::Note { velocity, .. } => self.open(time, velocity),
            TriggerPayload::Click { volume, .. } => self.open(time, volume),
        }
        Ok(())
    }
}
