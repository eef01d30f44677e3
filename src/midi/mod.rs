// MIDI module - Controller parsing, control mapping and device input

pub mod control;
pub mod event;
pub mod input;
pub mod manager;

pub use control::{ControlAction, ControlKind, MidiControl};
pub use event::MidiEvent;
pub use input::{MidiConsumer, MidiProducer, RawMidiMessage, create_midi_channel};
pub use manager::{ControlId, MidiControlMap};
