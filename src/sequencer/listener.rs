// Listener registry - Publish/subscribe layer of the transport
//
// Listeners are held weakly and notified in registration order. A listener
// that returns an error, panics, or has a poisoned lock is logged and skipped;
// delivery always continues with the next listener.

use super::event::{BeatInfo, TransportEvent};
use crate::error::ListenerError;
use log::{error, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

/// Anything that wants to hear about transport activity
pub trait TransportListener: Send {
    fn on_event(&mut self, event: &TransportEvent) -> Result<(), ListenerError>;
}

/// Handle returned on registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

type WeakListener = Weak<Mutex<dyn TransportListener>>;

/// Ordered set of weakly referenced listeners
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: u64,
    entries: Vec<(ListenerId, WeakListener)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Registering the same listener twice returns its existing id.
    pub fn add<L: TransportListener + 'static>(&mut self, listener: &Arc<Mutex<L>>) -> ListenerId {
        let shared: Arc<Mutex<dyn TransportListener>> = listener.clone();
        let address = Arc::as_ptr(&shared) as *const ();

        if let Some((id, _)) = self
            .entries
            .iter()
            .find(|(_, weak)| weak.as_ptr() as *const () == address)
        {
            return *id;
        }

        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push((id, Arc::downgrade(&shared)));
        id
    }

    /// Unregister by id. Returns false if the id is unknown.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Unregister by handle. Returns false if the listener was not registered.
    pub fn remove_listener<L: TransportListener + 'static>(
        &mut self,
        listener: &Arc<Mutex<L>>,
    ) -> bool {
        let address = Arc::as_ptr(listener) as *const ();
        let before = self.entries.len();
        self.entries
            .retain(|(_, weak)| weak.as_ptr() as *const () != address);
        self.entries.len() != before
    }

    /// Number of registered listeners that are still alive
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver an event to every live listener, in registration order.
    /// Returns the number of listeners that faulted.
    pub fn notify(&mut self, event: &TransportEvent) -> usize {
        let mut faults = 0;
        let mut dead = false;

        for (id, weak) in &self.entries {
            let Some(listener) = weak.upgrade() else {
                dead = true;
                continue;
            };

            if let Err(err) = deliver(&listener, event) {
                faults += 1;
                match err {
                    ListenerError::Panicked(_) => {
                        error!("Listener {:?} on '{}': {}", id, event.name(), err)
                    }
                    _ => warn!("Listener {:?} on '{}': {}", id, event.name(), err),
                }
            }
        }

        if dead {
            self.entries.retain(|(_, weak)| weak.strong_count() > 0);
        }

        faults
    }
}

fn deliver(
    listener: &Mutex<dyn TransportListener>,
    event: &TransportEvent,
) -> Result<(), ListenerError> {
    let mut guard = listener.lock().map_err(|_| ListenerError::Poisoned)?;
    match panic::catch_unwind(AssertUnwindSafe(|| guard.on_event(event))) {
        Ok(result) => result,
        Err(payload) => Err(ListenerError::Panicked(panic_message(payload.as_ref()))),
    }
}

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Passive listener that records everything it hears
/// Used by beat displays and tests
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<TransportEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TransportEvent] {
        &self.events
    }

    /// Only the beat notifications, in order
    pub fn beats(&self) -> Vec<BeatInfo> {
        self.events.iter().filter_map(|e| e.as_beat().copied()).collect()
    }

    /// Last beat heard, if any
    pub fn last_beat(&self) -> Option<BeatInfo> {
        self.events.iter().rev().find_map(|e| e.as_beat().copied())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TransportListener for EventLog {
    fn on_event(&mut self, event: &TransportEvent) -> Result<(), ListenerError> {
        self.events.push(*event);
        Ok(())
    }
}
