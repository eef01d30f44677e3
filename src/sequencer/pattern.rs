// Pattern - Id-unique collection of notes with fractional positions
// Resolves which notes start on a given step of a loop of any length

use crate::sequencer::note::{Note, NoteId};
use log::warn;

/// A pattern of notes
///
/// Notes are kept sorted by position (then id) so step lookups and listings
/// come out in a stable order. Ids are unique: inserting an existing id is
/// rejected, never treated as an overwrite.
#[derive(Debug, Clone, Default)]
pub struct NotePattern {
    notes: Vec<Note>,
}

impl NotePattern {
    /// Create a new empty pattern
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all notes, sorted by position
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Add a note. Returns false (pattern unchanged) for a duplicate id or an invalid note.
    pub fn add_note(&mut self, note: Note) -> bool {
        if let Err(err) = note.validate() {
            warn!("Rejected note {}: {}", note.id, err);
            return false;
        }
        if self.contains(note.id) {
            warn!("Rejected duplicate note id {}", note.id);
            return false;
        }

        let insert_pos = self
            .notes
            .partition_point(|n| (n.position, n.id) < (note.position, note.id));
        self.notes.insert(insert_pos, note);
        true
    }

    /// Remove a note by ID
    pub fn remove_note(&mut self, note_id: NoteId) -> Option<Note> {
        let index = self.notes.iter().position(|n| n.id == note_id)?;
        Some(self.notes.remove(index))
    }

    /// Get a note by ID
    pub fn get_note(&self, note_id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == note_id)
    }

    pub fn contains(&self, note_id: NoteId) -> bool {
        self.get_note(note_id).is_some()
    }

    /// Notes whose start falls on `step` in a loop of `total_steps`
    pub fn notes_at_step(&self, step: u32, total_steps: u32) -> impl Iterator<Item = &Note> + '_ {
        self.notes
            .iter()
            .filter(move |n| n.step(total_steps) == step)
    }

    /// Absolute step of a note in a loop of `total_steps`
    pub fn step_of(&self, note_id: NoteId, total_steps: u32) -> Option<u32> {
        self.get_note(note_id).map(|n| n.step(total_steps))
    }

    /// Clear all notes
    pub fn clear(&mut self) {
        self.notes.clear();
    }

    /// Get the number of notes
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Check if pattern is empty
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Snap every note to the start of its step in a loop of `total_steps`
    pub fn quantize_all(&mut self, total_steps: u32) {
        if total_steps == 0 {
            return;
        }
        for note in self.notes.iter_mut() {
            note.position = note.step(total_steps) as f64 / total_steps as f64;
        }

        // Re-sort after quantization
        self.notes
            .sort_by(|a, b| a.position.total_cmp(&b.position).then(a.id.cmp(&b.id)));
    }
}
