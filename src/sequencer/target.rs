// Trigger targets - The single capability event sources need from a voice

use super::listener::panic_message;
use crate::error::ListenerError;
use log::{error, warn};
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

/// Musical payload handed to a target with each trigger
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TriggerPayload {
    /// Step sequencer step; `active` says whether the step is on
    #[serde(rename_all = "camelCase")]
    Step {
        active: bool,
        step_index: u32,
        step_duration: f64,
    },
    /// Piano roll note; `duration` is always one step
    Note {
        pitch: u8,
        velocity: f64,
        duration: f64,
    },
    /// Metronome click
    Click { accent: bool, volume: f64 },
    /// Silence everything, deterministically, at the trigger time
    StopAll,
}

impl TriggerPayload {
    pub fn is_stop_all(&self) -> bool {
        matches!(self, TriggerPayload::StopAll)
    }
}

/// A synthesis voice that can be triggered
///
/// `time` is an absolute audio-clock time. It may be slightly in the past
/// (by less than the scheduler lookahead); implementations schedule their
/// automation at that time anyway instead of clipping it.
pub trait Target: Send {
    fn trigger(&mut self, time: f64, payload: &TriggerPayload) -> Result<(), ListenerError>;
}

/// Handle returned by `TargetSet::add`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

/// Ordered set of targets owned by an event source
#[derive(Default)]
pub struct TargetSet {
    next_id: u64,
    entries: Vec<(TargetId, Arc<Mutex<dyn Target>>)>,
}

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target. Adding the same target twice returns its existing id.
    pub fn add<T: Target + 'static>(&mut self, target: &Arc<Mutex<T>>) -> TargetId {
        let address = Arc::as_ptr(target) as *const ();
        if let Some((id, _)) = self
            .entries
            .iter()
            .find(|(_, t)| Arc::as_ptr(t) as *const () == address)
        {
            return *id;
        }

        self.next_id += 1;
        let id = TargetId(self.next_id);
        let shared: Arc<Mutex<dyn Target>> = target.clone();
        self.entries.push((id, shared));
        id
    }

    /// Remove by id. Returns false if unknown.
    pub fn remove(&mut self, id: TargetId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Remove by handle. Returns false if the target was not added.
    pub fn remove_target<T: Target + 'static>(&mut self, target: &Arc<Mutex<T>>) -> bool {
        let address = Arc::as_ptr(target) as *const ();
        let before = self.entries.len();
        self.entries
            .retain(|(_, t)| Arc::as_ptr(t) as *const () != address);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Trigger every target in insertion order. Returns the number of faulted targets.
    pub fn trigger_all(&self, time: f64, payload: &TriggerPayload) -> usize {
        let mut faults = 0;
        for (id, target) in &self.entries {
            if let Err(err) = fire(target, time, payload) {
                faults += 1;
                match err {
                    ListenerError::Panicked(_) => error!("Target {:?}: {}", id, err),
                    _ => warn!("Target {:?}: {}", id, err),
                }
            }
        }
        faults
    }
}

fn fire(
    target: &Mutex<dyn Target>,
    time: f64,
    payload: &TriggerPayload,
) -> Result<(), ListenerError> {
    let mut guard = target.lock().map_err(|_| ListenerError::Poisoned)?;
    match panic::catch_unwind(AssertUnwindSafe(|| guard.trigger(time, payload))) {
        Ok(result) => result,
        Err(payload) => Err(ListenerError::Panicked(panic_message(payload.as_ref()))),
    }
}

/// Summarise target faults as a listener result
pub(crate) fn faults_to_result(faults: usize) -> Result<(), ListenerError> {
    if faults == 0 {
        Ok(())
    } else {
        Err(ListenerError::Failed(format!("{} target(s) failed", faults)))
    }
}

/// Target that records every trigger it receives
#[derive(Debug, Default)]
pub struct TriggerLog {
    triggers: Vec<(f64, TriggerPayload)>,
}

impl TriggerLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triggers(&self) -> &[(f64, TriggerPayload)] {
        &self.triggers
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn clear(&mut self) {
        self.triggers.clear();
    }
}

impl Target for TriggerLog {
    fn trigger(&mut self, time: f64, payload: &TriggerPayload) -> Result<(), ListenerError> {
        self.triggers.push((time, *payload));
        Ok(())
    }
}
