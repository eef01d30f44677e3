// Metronome - Click track driven by transport beats
// Sends a click to its targets on every beat, accented on the first beat of a bar

use super::event::{BeatInfo, TransportEvent};
use super::listener::TransportListener;
use super::target::{Target, TargetId, TargetSet, TriggerPayload, faults_to_result};
use crate::error::ListenerError;
use std::sync::{Arc, Mutex};

/// Metronome click type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// Click on first beat of bar (accent/downbeat)
    Accent,
    /// Click on other beats
    Regular,
}

impl ClickType {
    /// Click type of a beat, `None` when the step is not on a beat
    pub fn for_beat(beat: &BeatInfo) -> Option<Self> {
        if !beat.is_beat_start() {
            None
        } else if beat.is_bar_start() {
            Some(ClickType::Accent)
        } else {
            Some(ClickType::Regular)
        }
    }
}

/// Metronome listener
pub struct Metronome {
    enabled: bool,
    volume: f64,
    targets: TargetSet,
}

impl Metronome {
    pub fn new() -> Self {
        Self {
            enabled: true,
            volume: 0.5,
            targets: TargetSet::new(),
        }
    }

    /// Enable/disable metronome
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set metronome volume (0.0 to 1.0)
    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn add_target<T: Target + 'static>(&mut self, target: &Arc<Mutex<T>>) -> TargetId {
        self.targets.add(target)
    }

    pub fn remove_target(&mut self, id: TargetId) -> bool {
        self.targets.remove(id)
    }
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportListener for Metronome {
    fn on_event(&mut self, event: &TransportEvent) -> Result<(), ListenerError> {
        let TransportEvent::Beat(beat) = event else {
            return Ok(());
        };
        if !self.enabled {
            return Ok(());
        }

        let faults = match ClickType::for_beat(beat) {
            Some(click) => self.targets.trigger_all(
                beat.absolute_time,
                &TriggerPayload::Click {
                    accent: click == ClickType::Accent,
                    volume: self.volume,
                },
            ),
            None => 0,
        };
        faults_to_result(faults)
    }
}
