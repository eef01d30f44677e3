// Sequencer module
// Transport clock, event sources (step sequencer, piano roll, metronome) and the trigger contract

pub mod event;
pub mod listener;
pub mod metronome;
pub mod note;
pub mod pattern;
pub mod piano_roll;
pub mod step_sequencer;
pub mod target;
pub mod timeline;
pub mod transport;

pub use event::{BeatInfo, TransportEvent};
pub use listener::{EventLog, ListenerId, ListenerRegistry, TransportListener};
pub use metronome::{ClickType, Metronome};
pub use note::{Note, NoteId, midi_to_frequency};
pub use pattern::NotePattern;
pub use piano_roll::PianoRoll;
pub use step_sequencer::StepSequencer;
pub use target::{Target, TargetId, TargetSet, TriggerLog, TriggerPayload};
pub use timeline::{BarBeatStep, StepGrid, Tempo};
pub use transport::{TickReport, Transport, TransportState};
