// Transport events - What the transport broadcasts to its listeners

use super::timeline::{BarBeatStep, locate};
use serde::Serialize;
use std::fmt;

/// Step boundary descriptor carried by a `beat` notification
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeatInfo {
    /// Absolute audio-clock time of the step, in seconds
    pub absolute_time: f64,
    /// Step index, always `< total_steps`
    pub step_index: u32,
    /// Duration of this step in seconds (tempo at the time it was scheduled)
    pub step_duration: f64,
    pub total_steps: u32,
    pub steps_per_bar: u32,
    pub subdivisions_per_beat: u32,
}

impl BeatInfo {
    /// Bar / beat / step of this beat (1-based)
    pub fn position(&self) -> BarBeatStep {
        locate(
            self.step_index,
            self.steps_per_bar,
            self.subdivisions_per_beat,
        )
    }

    /// First step of a bar
    pub fn is_bar_start(&self) -> bool {
        self.step_index % self.steps_per_bar.max(1) == 0
    }

    /// Step falls on a beat (quarter note for the default grid)
    pub fn is_beat_start(&self) -> bool {
        self.step_index % self.subdivisions_per_beat.max(1) == 0
    }
}

impl fmt::Display for BeatInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:.3}s", self.position(), self.absolute_time)
    }
}

/// Notification broadcast by the transport
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TransportEvent {
    /// Playback started; the first step fires at `time`
    #[serde(rename_all = "camelCase")]
    Start { time: f64, step_duration: f64 },
    /// Playback stopped at `time`; listeners must silence every sound
    Stop { time: f64 },
    /// A step boundary, scheduled ahead of real time
    Beat(BeatInfo),
    /// Tempo changed; takes effect from the next scheduled step
    TempoChange { bpm: f64 },
    /// Pattern length changed
    #[serde(rename_all = "camelCase")]
    BarsChange { bars: u32, total_steps: u32 },
}

impl TransportEvent {
    /// Event name as seen by listeners
    pub fn name(&self) -> &'static str {
        match self {
            TransportEvent::Start { .. } => "start",
            TransportEvent::Stop { .. } => "stop",
            TransportEvent::Beat(_) => "beat",
            TransportEvent::TempoChange { .. } => "tempoChange",
            TransportEvent::BarsChange { .. } => "barsChange",
        }
    }

    /// Beat payload, if this is a beat
    pub fn as_beat(&self) -> Option<&BeatInfo> {
        match self {
            TransportEvent::Beat(beat) => Some(beat),
            _ => None,
        }
    }
}
