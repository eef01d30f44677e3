// Piano roll - Note pattern resolved against transport steps

use super::event::{BeatInfo, TransportEvent};
use super::listener::TransportListener;
use super::note::{Note, NoteId};
use super::pattern::NotePattern;
use super::target::{Target, TargetId, TargetSet, TriggerPayload, faults_to_result};
use super::timeline::StepGrid;
use crate::error::ListenerError;
use log::debug;
use std::sync::{Arc, Mutex};

/// Piano roll event source
///
/// Each note's step is `floor(position * total_steps)` of the beat being
/// processed, so notes follow the pattern when the number of bars changes.
/// Triggered notes always last one step, which keeps note-off timing
/// independent of the stored duration.
pub struct PianoRoll {
    pattern: NotePattern,
    targets: TargetSet,
    /// Loop length last seen from the transport
    total_steps: u32,
    /// Step index and time of the last processed beat; a repeat of both is a duplicate
    last_processed: Option<(u32, f64)>,
}

impl PianoRoll {
    pub fn new(grid: StepGrid) -> Self {
        Self {
            pattern: NotePattern::new(),
            targets: TargetSet::new(),
            total_steps: grid.total_steps(),
            last_processed: None,
        }
    }

    /// Add a note. False if the id already exists or the note is invalid.
    pub fn add_note(&mut self, note: Note) -> bool {
        self.pattern.add_note(note)
    }

    /// Remove a note. False if the id is unknown.
    pub fn remove_note(&mut self, id: NoteId) -> bool {
        self.pattern.remove_note(id).is_some()
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.pattern.get_note(id)
    }

    pub fn notes(&self) -> &[Note] {
        self.pattern.notes()
    }

    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    pub fn clear(&mut self) {
        self.pattern.clear();
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Absolute step a note currently falls on
    pub fn step_of(&self, id: NoteId) -> Option<u32> {
        self.pattern.step_of(id, self.total_steps)
    }

    /// Notes starting on `step` at the current pattern length
    pub fn notes_at_step(&self, step: u32) -> impl Iterator<Item = &Note> + '_ {
        self.pattern.notes_at_step(step, self.total_steps)
    }

    pub fn add_target<T: Target + 'static>(&mut self, target: &Arc<Mutex<T>>) -> TargetId {
        self.targets.add(target)
    }

    pub fn remove_target(&mut self, id: TargetId) -> bool {
        self.targets.remove(id)
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    fn process_notes(&mut self, beat: &BeatInfo) -> usize {
        let key = (beat.step_index, beat.absolute_time);
        if self.last_processed == Some(key) {
            debug!("Step {} already processed, skipping", beat.step_index);
            return 0;
        }
        self.last_processed = Some(key);
        self.total_steps = beat.total_steps;

        let mut faults = 0;
        for note in self.pattern.notes_at_step(beat.step_index, beat.total_steps) {
            let payload = TriggerPayload::Note {
                pitch: note.pitch,
                velocity: note.velocity,
                duration: beat.step_duration,
            };
            faults += self.targets.trigger_all(beat.absolute_time, &payload);
        }
        faults
    }
}

impl TransportListener for PianoRoll {
    fn on_event(&mut self, event: &TransportEvent) -> Result<(), ListenerError> {
        let faults = match event {
            TransportEvent::Beat(beat) => self.process_notes(beat),
            TransportEvent::Start { .. } => {
                self.last_processed = None;
                0
            }
            TransportEvent::Stop { time } => {
                self.last_processed = None;
                self.targets.trigger_all(*time, &TriggerPayload::StopAll)
            }
            TransportEvent::BarsChange { total_steps, .. } => {
                self.total_steps = *total_steps;
                0
            }
            TransportEvent::TempoChange { .. } => 0,
        };
        faults_to_result(faults)
    }
}
