// Oscillator voice - Trigger target scheduling gain and frequency automation

use super::automation::AutomationLane;
use super::parameters::ParameterSet;
use crate::error::ListenerError;
use crate::sequencer::note::midi_to_frequency;
use crate::sequencer::target::{Target, TriggerPayload};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveformType {
    Sine,
    Square,
    Saw,
    Triangle,
}

impl WaveformType {
    /// Waveform for a parameter index (0-3), wrapping out-of-range values to Sine
    pub fn from_index(index: f64) -> Self {
        match index.round() as i64 {
            1 => WaveformType::Square,
            2 => WaveformType::Saw,
            3 => WaveformType::Triangle,
            _ => WaveformType::Sine,
        }
    }

    pub fn index(&self) -> f64 {
        match self {
            WaveformType::Sine => 0.0,
            WaveformType::Square => 1.0,
            WaveformType::Saw => 2.0,
            WaveformType::Triangle => 3.0,
        }
    }
}

impl Default for WaveformType {
    fn default() -> Self {
        WaveformType::Sine
    }
}

/// Monophonic oscillator voice
///
/// Starting fades the gain in from 0 over `ATTACK_SECS`; stopping holds the
/// current gain then fades to 0 over `RELEASE_SECS`. A new start cancels any
/// pending fade scheduled at or after its time.
pub struct OscillatorVoice {
    parameters: ParameterSet,
    gain: AutomationLane,
    frequency: AutomationLane,
}

impl OscillatorVoice {
    /// Peak gain of a full-velocity note
    pub const DEFAULT_LEVEL: f64 = 0.2;
    pub const ATTACK_SECS: f64 = 0.1;
    pub const RELEASE_SECS: f64 = 0.01;
    /// Shortest note a piano roll trigger plays
    pub const MIN_NOTE_SECS: f64 = 0.1;
    pub const CLICK_SECS: f64 = 0.05;
    pub const ACCENT_CLICK_HZ: f64 = 1000.0;
    pub const CLICK_HZ: f64 = 800.0;

    pub fn new() -> Self {
        let parameters = ParameterSet::new()
            .with("frequency", 440.0, 20.0, 20000.0)
            .with("detune", 0.0, -1200.0, 1200.0)
            .with("waveform", WaveformType::Sine.index(), 0.0, 3.0)
            .with("pan", 0.0, -1.0, 1.0)
            .with("mix", 1.0, 0.0, 1.0);

        Self {
            parameters,
            gain: AutomationLane::new(0.0),
            frequency: AutomationLane::new(440.0),
        }
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Set a parameter (clamped), `None` if the name is unknown
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Option<f64> {
        self.parameters.set(name, value)
    }

    pub fn waveform(&self) -> WaveformType {
        WaveformType::from_index(self.parameters.get("waveform").unwrap_or_default())
    }

    pub fn set_waveform(&mut self, waveform: WaveformType) {
        self.parameters.set("waveform", waveform.index());
    }

    /// Base frequency used by step triggers
    pub fn base_frequency(&self) -> f64 {
        self.parameters.get("frequency").unwrap_or(440.0)
    }

    /// Peak gain, scaled by the mix parameter
    pub fn level(&self) -> f64 {
        Self::DEFAULT_LEVEL * self.parameters.get("mix").unwrap_or(1.0)
    }

    pub fn set_frequency_at(&mut self, frequency: f64, time: f64) {
        self.frequency.set_value_at_time(frequency, time);
    }

    /// Fade in to `peak` starting at `time`
    pub fn start(&mut self, time: f64, peak: f64) {
        self.gain.cancel_scheduled_values(time);
        self.gain.set_value_at_time(0.0, time);
        self.gain
            .linear_ramp_to_value_at_time(peak, time + Self::ATTACK_SECS);
    }

    /// Hold the gain reached at `time`, then fade out
    pub fn stop(&mut self, time: f64) {
        let held = self.gain.value_at(time);
        self.gain.cancel_scheduled_values(time);
        self.gain.set_value_at_time(held, time);
        self.gain
            .linear_ramp_to_value_at_time(0.0, time + Self::RELEASE_SECS);
    }

    /// Gain of the voice at time `t`
    pub fn gain_at(&self, t: f64) -> f64 {
        self.gain.value_at(t)
    }

    /// Frequency of the voice at time `t`
    pub fn frequency_at(&self, t: f64) -> f64 {
        self.frequency.value_at(t)
    }

    /// Time after which the voice stays silent, if anything is scheduled
    pub fn release_end(&self) -> Option<f64> {
        self.gain.end_time()
    }

    fn click(&mut self, time: f64, accent: bool, volume: f64) {
        let frequency = if accent {
            Self::ACCENT_CLICK_HZ
        } else {
            Self::CLICK_HZ
        };
        self.frequency.set_value_at_time(frequency, time);
        self.gain.cancel_scheduled_values(time);
        self.gain.set_value_at_time(self.level() * volume, time);
        self.gain
            .linear_ramp_to_value_at_time(0.0, time + Self::CLICK_SECS);
    }
}

impl Default for OscillatorVoice {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for OscillatorVoice {
    fn trigger(&mut self, time: f64, payload: &TriggerPayload) -> Result<(), ListenerError> {
        self.gain.discard_before(time);
        self.frequency.discard_before(time);

        match *payload {
            TriggerPayload::StopAll => self.stop(time),
            TriggerPayload::Step {
                active,
                step_duration,
                ..
            } => {
                // The previous step's note always ends here
                self.stop(time);
                if active {
                    let frequency = self.base_frequency();
                    self.set_frequency_at(frequency, time);
                    self.start(time, self.level());
                    self.stop(time + step_duration);
                }
            }
            TriggerPayload::Note {
                pitch,
                velocity,
                duration,
            } => {
                let duration = duration.max(Self::MIN_NOTE_SECS);
                self.set_frequency_at(midi_to_frequency(pitch), time);
                self.start(time, self.level() * velocity);
                self.stop(time + duration);
                debug!("Note {} scheduled {:.3}s-{:.3}s", pitch, time, time + duration);
            }
            TriggerPayload::Click { accent, volume } => self.click(time, accent, volume),
        }
        Ok(())
    }
}
