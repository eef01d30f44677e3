// Note representation for the piano roll
// A note is a pattern entry with a fractional position, pitch, duration, and velocity

use super::timeline::step_for_position;
use crate::error::NoteError;
use serde::{Deserialize, Serialize};

/// Unique identifier for notes
pub type NoteId = u64;

/// A musical note in a pattern
///
/// The position is a fraction of the pattern length rather than an absolute
/// step, so a pattern can be resized without moving its notes relative to each
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier for this note
    pub id: NoteId,

    /// Offset within the pattern, in [0, 1)
    pub position: f64,

    /// MIDI note number (0-127, where 60 = C4)
    pub pitch: u8,

    /// Length as a fraction of the pattern, > 0
    pub duration: f64,

    /// Velocity in [0, 1]
    pub velocity: f64,
}

impl Note {
    /// Creates a validated note
    pub fn new(
        id: NoteId,
        position: f64,
        pitch: u8,
        duration: f64,
        velocity: f64,
    ) -> Result<Self, NoteError> {
        let note = Self {
            id,
            position,
            pitch,
            duration,
            velocity,
        };
        note.validate()?;
        Ok(note)
    }

    /// Check every field against its allowed range
    pub fn validate(&self) -> Result<(), NoteError> {
        if !(0.0..1.0).contains(&self.position) {
            return Err(NoteError::InvalidPosition(self.position));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(NoteError::InvalidDuration(self.duration));
        }
        if !(0.0..=1.0).contains(&self.velocity) {
            return Err(NoteError::InvalidVelocity(self.velocity));
        }
        if self.pitch > 127 {
            return Err(NoteError::InvalidPitch(self.pitch));
        }
        Ok(())
    }

    /// Absolute step of this note in a loop of `total_steps`
    pub fn step(&self, total_steps: u32) -> u32 {
        step_for_position(self.position, total_steps)
    }

    /// Frequency in Hz (A4 = 440 Hz)
    pub fn frequency(&self) -> f64 {
        midi_to_frequency(self.pitch)
    }

    /// Get the note name (e.g., "C4", "A#5")
    pub fn note_name(&self) -> String {
        const NOTE_NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];

        let octave = (self.pitch / 12) as i32 - 1;
        let note_index = (self.pitch % 12) as usize;

        format!("{}{}", NOTE_NAMES[note_index], octave)
    }
}

/// Equal-tempered frequency of a MIDI pitch
pub fn midi_to_frequency(pitch: u8) -> f64 {
    440.0 * 2f64.powf((pitch as f64 - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_creation() {
        let note = Note::new(1, 0.25, 60, 0.0625, 0.8).unwrap();

        assert_eq!(note.id, 1);
        assert_eq!(note.pitch, 60);
        assert_eq!(note.velocity, 0.8);
        assert_eq!(note.step(16), 4);
        assert_eq!(note.step(32), 8);
    }

    #[test]
    fn test_note_name() {
        let note = |pitch| Note::new(1, 0.0, pitch, 0.1, 1.0).unwrap();

        // Middle C (C4) = MIDI note 60
        assert_eq!(note(60).note_name(), "C4");
        // A4 (440 Hz) = MIDI note 69
        assert_eq!(note(69).note_name(), "A4");
        assert_eq!(note(73).note_name(), "C#5");
    }

    #[test]
    fn test_frequency() {
        assert_eq!(midi_to_frequency(69), 440.0);
        assert!((midi_to_frequency(81) - 880.0).abs() < 1e-9);
        assert!((midi_to_frequency(60) - 261.6256).abs() < 1e-3);
    }

    #[test]
    fn test_invalid_position() {
        assert_eq!(
            Note::new(1, 1.0, 60, 0.1, 1.0),
            Err(NoteError::InvalidPosition(1.0))
        );
        assert!(Note::new(1, -0.1, 60, 0.1, 1.0).is_err());
        assert!(Note::new(1, f64::NAN, 60, 0.1, 1.0).is_err());
    }

    #[test]
    fn test_invalid_duration() {
        assert_eq!(
            Note::new(1, 0.0, 60, 0.0, 1.0),
            Err(NoteError::InvalidDuration(0.0))
        );
        assert!(Note::new(1, 0.0, 60, f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_invalid_velocity_and_pitch() {
        assert_eq!(
            Note::new(1, 0.0, 60, 0.1, 1.5),
            Err(NoteError::InvalidVelocity(1.5))
        );
        assert_eq!(
            Note::new(1, 0.0, 128, 0.1, 1.0),
            Err(NoteError::InvalidPitch(128))
        );
    }
}
