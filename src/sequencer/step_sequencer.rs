// Step sequencer - Fixed-length on/off step pattern driving its targets

use super::event::{BeatInfo, TransportEvent};
use super::listener::TransportListener;
use super::target::{Target, TargetId, TargetSet, TriggerPayload, faults_to_result};
use crate::error::ListenerError;
use log::debug;
use std::sync::{Arc, Mutex};

/// Boolean step pattern
///
/// On every beat the step `beat.step_index % steps` is sent to every target,
/// whether it is on or off, so voices can cut the previous note.
pub struct StepSequencer {
    active_steps: Vec<bool>,
    targets: TargetSet,
}

impl StepSequencer {
    pub const DEFAULT_STEPS: usize = 16;

    pub fn new() -> Self {
        Self::with_steps(Self::DEFAULT_STEPS)
    }

    /// Sequencer with a custom number of steps (at least 1)
    pub fn with_steps(steps: usize) -> Self {
        Self {
            active_steps: vec![false; steps.max(1)],
            targets: TargetSet::new(),
        }
    }

    pub fn steps(&self) -> usize {
        self.active_steps.len()
    }

    /// Flip a step and return its new state
    /// Out-of-range steps are left alone and report false
    pub fn toggle_step(&mut self, step: usize) -> bool {
        match self.active_steps.get_mut(step) {
            Some(active) => {
                *active = !*active;
                debug!("Step {} toggled: {}", step, *active);
                *active
            }
            None => false,
        }
    }

    /// Set a step explicitly. Returns false for an out-of-range step.
    pub fn set_step(&mut self, step: usize, active: bool) -> bool {
        match self.active_steps.get_mut(step) {
            Some(slot) => {
                *slot = active;
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, step: usize) -> bool {
        self.active_steps.get(step).copied().unwrap_or(false)
    }

    pub fn active_steps(&self) -> &[bool] {
        &self.active_steps
    }

    /// Turn every step off
    pub fn clear(&mut self) {
        self.active_steps.iter_mut().for_each(|s| *s = false);
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

    fn on_beat(&self, beat: &BeatInfo) -> usize {
        let step_index = beat.step_index as usize % self.steps();
        let payload = TriggerPayload::Step {
            active: self.active_steps[step_index],
            step_index: step_index as u32,
            step_duration: beat.step_duration,
        };
        self.targets.trigger_all(beat.absolute_time, &payload)
    }
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportListener for StepSequencer {
    fn on_event(&mut self, event: &TransportEvent) -> Result<(), ListenerError> {
        let faults = match event {
            TransportEvent::Beat(beat) => self.on_beat(beat),
            TransportEvent::Stop { time } => {
                self.targets.trigger_all(*time, &TriggerPayload::StopAll)
            }
            _ => 0,
        };
        faults_to_result(faults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::target::TriggerLog;

    fn beat(step_index: u32, time: f64) -> TransportEvent {
        TransportEvent::Beat(BeatInfo {
            absolute_time: time,
            step_index,
            step_duration: 0.125,
            total_steps: 32,
            steps_per_bar: 16,
            subdivisions_per_beat: 4,
        })
    }

    fn sequencer_with_log() -> (StepSequencer, Arc<Mutex<TriggerLog>>) {
        let mut sequencer = StepSequencer::new();
        let log = Arc::new(Mutex::new(TriggerLog::new()));
        sequencer.add_target(&log);
        (sequencer, log)
    }

    #[test]
    fn test_toggle_round_trip() {
        let mut sequencer = StepSequencer::new();
        assert!(sequencer.toggle_step(3));
        assert!(sequencer.is_active(3));
        assert!(!sequencer.toggle_step(3));
        assert!(!sequencer.is_active(3));
    }

    #[test]
    fn test_toggle_out_of_range() {
        let mut sequencer = StepSequencer::new();
        assert!(!sequencer.toggle_step(16));
        assert!(!sequencer.toggle_step(usize::MAX));
        assert!(sequencer.active_steps().iter().all(|s| !s));
        assert!(!sequencer.set_step(99, true));
    }

    #[test]
    fn test_beat_triggers_every_target_with_step_state() {
        let (mut sequencer, log) = sequencer_with_log();
        sequencer.toggle_step(2);

        sequencer.on_event(&beat(2, 0.5)).unwrap();
        sequencer.on_event(&beat(3, 0.625)).unwrap();

        let log = log.lock().unwrap();
        assert_eq!(
            log.triggers()[0],
            (
                0.5,
                TriggerPayload::Step {
                    active: true,
                    step_index: 2,
                    step_duration: 0.125
                }
            )
        );
        assert!(matches!(
            log.triggers()[1].1,
            TriggerPayload::Step { active: false, step_index: 3, .. }
        ));
    }

    #[test]
    fn test_step_index_wraps_to_sequencer_length() {
        let (mut sequencer, log) = sequencer_with_log();
        sequencer.set_step(1, true);

        // Transport step 17 of a 2-bar loop lands on sequencer step 1
        sequencer.on_event(&beat(17, 2.0)).unwrap();
        assert!(matches!(
            log.lock().unwrap().triggers()[0].1,
            TriggerPayload::Step { active: true, step_index: 1, .. }
        ));
    }

    #[test]
    fn test_stop_sends_stop_all_once() {
        let (mut sequencer, log) = sequencer_with_log();
        sequencer.on_event(&TransportEvent::Stop { time: 4.0 }).unwrap();
        sequencer.on_event(&TransportEvent::TempoChange { bpm: 90.0 }).unwrap();

        assert_eq!(log.lock().unwrap().triggers(), &[(4.0, TriggerPayload::StopAll)]);
    }

    #[test]
    fn test_clear_and_custom_length() {
        let mut sequencer = StepSequencer::with_steps(8);
        assert_eq!(sequencer.steps(), 8);
        sequencer.toggle_step(7);
        sequencer.clear();
        assert!(!sequencer.is_active(7));
        assert_eq!(StepSequencer::with_steps(0).steps(), 1);
    }
}
