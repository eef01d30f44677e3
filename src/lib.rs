// Studio Sequencer - Library exports for the binary, tests and benchmarks

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod messaging;
pub mod midi;
pub mod sequencer;
pub mod synth;

// Re-export commonly used types for convenience
pub use clock::{AudioClock, ManualClock, SampleClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{EngineChannels, EngineHandle, SchedulerEngine};
pub use error::{ConfigError, ListenerError, MidiError, NoteError};
pub use messaging::{Command, Notification, NotificationCategory, NotificationLevel};
pub use midi::{ControlAction, ControlId, MidiControl, MidiControlMap, MidiEvent};
pub use sequencer::{
    BeatInfo, EventLog, ListenerId, Metronome, Note, NoteId, PianoRoll, StepGrid, StepSequencer,
    Target, TargetId, Tempo, TickReport, Transport, TransportEvent, TransportListener,
    TransportState, TriggerLog, TriggerPayload,
};
pub use synth::{AutomationLane, GainStage, OscillatorVoice, StereoPanner};
