// Synthesis targets - Voices the sequencer triggers
// Only automation is scheduled here; sample rendering belongs to the host audio graph

pub mod automation;
pub mod gain;
pub mod panner;
pub mod parameters;
pub mod voice;

pub use automation::AutomationLane;
pub use gain::GainStage;
pub use panner::{StereoPanner, equal_power_gains};
pub use parameters::{Parameter, ParameterSet};
pub use voice::{OscillatorVoice, WaveformType};
