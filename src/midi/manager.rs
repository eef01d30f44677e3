// MIDI control map - Routes controller messages to registered controls, with MIDI learn

use crate::midi::control::{ControlAction, MidiControl};
use crate::midi::event::MidiEvent;
use log::{debug, info};

/// Handle returned by `MidiControlMap::register`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u64);

/// Registered controls, in registration order
#[derive(Debug, Default)]
pub struct MidiControlMap {
    controls: Vec<(ControlId, MidiControl)>,
    next_id: u64,
    learning: Option<ControlId>,
}

impl MidiControlMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, control: MidiControl) -> ControlId {
        let id = ControlId(self.next_id);
        self.next_id += 1;
        self.controls.push((id, control));
        id
    }

    pub fn unregister(&mut self, id: ControlId) -> Option<MidiControl> {
        let index = self.controls.iter().position(|(cid, _)| *cid == id)?;
        if self.learning == Some(id) {
            self.learning = None;
        }
        Some(self.controls.remove(index).1)
    }

    pub fn control(&self, id: ControlId) -> Option<&MidiControl> {
        self.controls
            .iter()
            .find(|(cid, _)| *cid == id)
            .map(|(_, c)| c)
    }

    pub fn control_mut(&mut self, id: ControlId) -> Option<&mut MidiControl> {
        self.controls
            .iter_mut()
            .find(|(cid, _)| *cid == id)
            .map(|(_, c)| c)
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Bind `id` to the next controller message received
    /// Returns false if the control is unknown.
    pub fn learn(&mut self, id: ControlId) -> bool {
        if self.control(id).is_none() {
            return false;
        }
        debug!("MIDI learn armed for {:?}", id);
        self.learning = Some(id);
        true
    }

    pub fn cancel_learn(&mut self) {
        self.learning = None;
    }

    /// Control currently waiting for a binding
    pub fn learning(&self) -> Option<ControlId> {
        self.learning
    }

    /// Handle a raw MIDI message
    ///
    /// A control in learn mode takes the message as its new binding and
    /// produces no action for it. Every other matching control is fed the
    /// value, in registration order.
    pub fn handle_message(&mut self, bytes: &[u8]) -> Vec<(ControlId, ControlAction)> {
        let Some(MidiEvent::ControlChange {
            channel,
            controller,
            value,
        }) = MidiEvent::from_bytes(bytes)
        else {
            return Vec::new();
        };

        let learned = self.learning.take();
        if let Some(id) = learned {
            if let Some(control) = self.control_mut(id) {
                control.bind(channel, controller);
                info!(
                    "MIDI learn: {:?} bound to channel {} CC {}",
                    id, channel, controller
                );
            }
        }

        self.controls
            .iter_mut()
            .filter(|(id, c)| Some(*id) != learned && c.matches(channel, controller))
            .filter_map(|(id, c)| c.handle_value(value).map(|action| (*id, action)))
            .collect()
    }
}
