// Transport - Clock and lookahead scheduler
// Turns audio-clock time into step notifications computed slightly ahead of real time
//
// The coarse host timer only decides *when* the next batch of steps is computed.
// Step times are derived analytically from the tempo and handed to listeners as
// absolute audio-clock seconds, so timer jitter never reaches the audio.

use super::event::{BeatInfo, TransportEvent};
use super::listener::{ListenerId, ListenerRegistry, TransportListener};
use super::timeline::{StepGrid, Tempo};
use crate::config::EngineConfig;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};

/// Transport state (play/stop)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        matches!(self, TransportState::Playing)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, TransportState::Stopped)
    }
}

impl Default for TransportState {
    fn default() -> Self {
        TransportState::Stopped
    }
}

/// What one scheduler tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Beat notifications emitted
    pub beats: u32,
    /// Steps dropped because the clock ran past them
    pub skipped: u32,
    /// Listener deliveries that failed
    pub faults: usize,
}

/// Transport controller
/// Owns tempo, play state, step counters and the listener registry
pub struct Transport {
    state: TransportState,
    tempo: Tempo,
    grid: StepGrid,

    /// Lookahead window in seconds
    schedule_ahead: f64,
    /// Delay between `start()` and the first step, in seconds
    start_offset: f64,

    current_step: u32,
    next_event_time: f64,

    listeners: ListenerRegistry,
}

impl Transport {
    pub const DEFAULT_SCHEDULE_AHEAD: f64 = 0.1;
    pub const DEFAULT_START_OFFSET: f64 = 0.1;

    /// Create a stopped transport
    pub fn new(tempo: Tempo, grid: StepGrid) -> Self {
        Self {
            state: TransportState::Stopped,
            tempo,
            grid,
            schedule_ahead: Self::DEFAULT_SCHEDULE_AHEAD,
            start_offset: Self::DEFAULT_START_OFFSET,
            current_step: 0,
            next_event_time: 0.0,
            listeners: ListenerRegistry::new(),
        }
    }

    /// Create from an already validated configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(Tempo::new(config.tempo_bpm), config.grid())
            .with_schedule_ahead(config.schedule_ahead_secs)
            .with_start_offset(config.start_offset_secs)
    }

    /// Set the lookahead window (seconds, > 0)
    pub fn with_schedule_ahead(mut self, seconds: f64) -> Self {
        if seconds > 0.0 {
            self.schedule_ahead = seconds;
        } else {
            warn!("Ignoring non-positive lookahead window {}", seconds);
        }
        self
    }

    /// Set the delay before the first step after `start()` (seconds, >= 0)
    pub fn with_start_offset(mut self, seconds: f64) -> Self {
        self.start_offset = seconds.max(0.0);
        self
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn tempo(&self) -> &Tempo {
        &self.tempo
    }

    pub fn grid(&self) -> &StepGrid {
        &self.grid
    }

    pub fn total_steps(&self) -> u32 {
        self.grid.total_steps()
    }

    /// Index of the next step to be scheduled
    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    /// Audio-clock time of the next step to be scheduled
    pub fn next_event_time(&self) -> f64 {
        self.next_event_time
    }

    /// Duration of a step at the current tempo
    pub fn step_duration(&self) -> f64 {
        self.tempo.step_duration_seconds(self.grid.subdivisions_per_beat)
    }

    pub fn schedule_ahead(&self) -> f64 {
        self.schedule_ahead
    }

    /// Register a listener (held weakly)
    pub fn add_listener<L: TransportListener + 'static>(
        &mut self,
        listener: &Arc<Mutex<L>>,
    ) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregister a listener by id
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Unregister a listener by handle
    pub fn remove_listener_handle<L: TransportListener + 'static>(
        &mut self,
        listener: &Arc<Mutex<L>>,
    ) -> bool {
        self.listeners.remove_listener(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Start playback from step 0
    /// Returns false (and does nothing) if already playing
    pub fn start(&mut self, now: f64) -> bool {
        if self.state.is_playing() {
            return false;
        }

        self.state = TransportState::Playing;
        self.current_step = 0;
        self.next_event_time = now + self.start_offset;

        info!(
            "Transport started at {:.3}s ({}, {} steps)",
            self.next_event_time,
            self.tempo,
            self.total_steps()
        );

        self.listeners.notify(&TransportEvent::Start {
            time: self.next_event_time,
            step_duration: self.step_duration(),
        });
        true
    }

    /// Stop playback and reset the step counters
    /// Once this returns no further beat is emitted until the next `start()`.
    /// Returns false (and does nothing) if already stopped.
    pub fn stop(&mut self, now: f64) -> bool {
        if self.state.is_stopped() {
            return false;
        }

        self.state = TransportState::Stopped;
        self.current_step = 0;
        self.next_event_time = 0.0;

        info!("Transport stopped at {:.3}s", now);

        self.listeners.notify(&TransportEvent::Stop { time: now });
        true
    }

    /// Toggle between playing and stopped
    pub fn toggle_play(&mut self, now: f64) {
        if self.state.is_playing() {
            self.stop(now);
        } else {
            self.start(now);
        }
    }

    /// Run one scheduler pass: emit every step that starts before `now + lookahead`
    pub fn tick(&mut self, now: f64) -> TickReport {
        let mut report = TickReport::default();
        if !self.state.is_playing() {
            return report;
        }

        let total_steps = self.total_steps();

        // The clock ran past whole steps (host stalled): drop them rather than
        // flooding targets with notes in the past. Phase on the grid is kept.
        let step_duration = self.step_duration();
        if now - self.next_event_time > step_duration {
            let missed = ((now - self.next_event_time) / step_duration).floor() as u64;
            self.current_step = ((self.current_step as u64 + missed) % total_steps as u64) as u32;
            self.next_event_time += missed as f64 * step_duration;
            report.skipped = missed.min(u32::MAX as u64) as u32;
            warn!(
                "Scheduler fell behind by {} steps, resuming at step {}",
                missed, self.current_step
            );
        }

        let horizon = now + self.schedule_ahead;
        while self.next_event_time < horizon {
            let step_duration = self.step_duration();
            let beat = BeatInfo {
                absolute_time: self.next_event_time,
                step_index: self.current_step,
                step_duration,
                total_steps,
                steps_per_bar: self.grid.steps_per_bar,
                subdivisions_per_beat: self.grid.subdivisions_per_beat,
            };

            debug!("Beat {}", beat);
            report.faults += self.listeners.notify(&TransportEvent::Beat(beat));
            report.beats += 1;

            self.current_step = (self.current_step + 1) % total_steps;
            self.next_event_time += step_duration;
        }

        report
    }

    /// Set the tempo (clamped to 30-300 BPM), returns the effective BPM
    ///
    /// The step already computed as `next_event_time` keeps its time; only the
    /// durations of steps scheduled after it change.
    pub fn set_tempo(&mut self, bpm: f64) -> f64 {
        let effective = self.tempo.set_bpm(bpm);
        if effective != bpm {
            debug!("Tempo {} clamped to {}", bpm, effective);
        }
        self.listeners
            .notify(&TransportEvent::TempoChange { bpm: effective });
        effective
    }

    /// Change the pattern length in bars
    ///
    /// Returns false for 0 bars or a length whose step count does not fit in `u32`.
    pub fn set_number_of_bars(&mut self, bars: u32) -> bool {
        let Some(grid) = self.grid.try_with_bars(bars) else {
            warn!("Rejected pattern length of {} bars", bars);
            return false;
        };

        self.grid = grid;
        self.current_step %= self.grid.total_steps();

        self.listeners.notify(&TransportEvent::BarsChange {
            bars,
            total_steps: self.grid.total_steps(),
        });
        true
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(Tempo::default(), StepGrid::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::listener::EventLog;

    const EPSILON: f64 = 1e-9;

    fn transport_with_log() -> (Transport, Arc<Mutex<EventLog>>) {
        let mut transport = Transport::new(Tempo::new(120.0), StepGrid::sixteenths(1));
        let log = Arc::new(Mutex::new(EventLog::new()));
        transport.add_listener(&log);
        (transport, log)
    }

    #[test]
    fn test_transport_state() {
        assert!(TransportState::Playing.is_playing());
        assert!(TransportState::Stopped.is_stopped());
        assert_eq!(TransportState::default(), TransportState::Stopped);
    }

    #[test]
    fn test_start_stop_are_idempotent() {
        let (mut transport, log) = transport_with_log();

        assert!(transport.start(0.0));
        assert!(!transport.start(0.5));
        assert!(transport.stop(1.0));
        assert!(!transport.stop(1.5));

        let names: Vec<_> = log.lock().unwrap().events().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["start", "stop"]);
    }

    #[test]
    fn test_start_schedules_first_step_after_offset() {
        let (mut transport, log) = transport_with_log();
        transport.start(2.0);

        assert!((transport.next_event_time() - 2.1).abs() < EPSILON);
        match log.lock().unwrap().events()[0] {
            TransportEvent::Start { time, step_duration } => {
                assert!((time - 2.1).abs() < EPSILON);
                assert_eq!(step_duration, 0.125);
            }
            other => panic!("Expected start, got {:?}", other),
        }
    }

    #[test]
    fn test_tick_emits_steps_inside_lookahead() {
        let (mut transport, log) = transport_with_log();
        transport.start(0.0);

        // First step at 0.1, window [.., 0.0 + 0.1): nothing yet
        assert_eq!(transport.tick(0.0).beats, 0);

        // Window up to 0.2: step 0 at 0.1
        assert_eq!(transport.tick(0.1).beats, 1);

        // Then one step per coarse tick: 0.225, 0.35, 0.475
        assert_eq!(transport.tick(0.2).beats, 1);
        assert_eq!(transport.tick(0.3).beats, 1);
        assert_eq!(transport.tick(0.4).beats, 1);

        let beats = log.lock().unwrap().beats();
        let indices: Vec<_> = beats.iter().map(|b| b.step_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!((beats[3].absolute_time - 0.475).abs() < EPSILON);
    }

    #[test]
    fn test_tick_while_stopped_is_silent() {
        let (mut transport, log) = transport_with_log();
        assert_eq!(transport.tick(10.0), TickReport::default());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_step_index_wraps() {
        let (mut transport, log) = transport_with_log();
        transport.start(0.0);

        // 20 steps of 0.125s
        let mut now = 0.0;
        while log.lock().unwrap().beats().len() < 20 {
            transport.tick(now);
            now += 0.025;
        }

        let beats = log.lock().unwrap().beats();
        assert_eq!(beats[15].step_index, 15);
        assert_eq!(beats[16].step_index, 0);
        assert!(beats.iter().all(|b| b.total_steps == 16));
    }

    #[test]
    fn test_tempo_change_applies_from_next_step() {
        let (mut transport, log) = transport_with_log();
        transport.start(0.0);
        transport.tick(0.1); // step 0 at 0.1

        // Step 1 is already computed at 0.225
        transport.set_tempo(60.0);
        transport.tick(0.2);
        transport.tick(0.4);

        let beats = log.lock().unwrap().beats();
        assert!((beats[1].absolute_time - 0.225).abs() < EPSILON);
        // From there on, 60 BPM sixteenths = 0.25s
        assert!((beats[2].absolute_time - beats[1].absolute_time - 0.25).abs() < EPSILON);
        assert_eq!(beats[1].step_duration, 0.25);
    }

    #[test]
    fn test_set_tempo_clamps_and_notifies() {
        let (mut transport, log) = transport_with_log();
        assert_eq!(transport.set_tempo(10.0), 30.0);
        assert_eq!(transport.set_tempo(1000.0), 300.0);
        assert_eq!(transport.tempo().bpm(), 300.0);

        let events = log.lock().unwrap();
        assert_eq!(events.events()[0], TransportEvent::TempoChange { bpm: 30.0 });
        assert_eq!(events.events()[1], TransportEvent::TempoChange { bpm: 300.0 });
    }

    #[test]
    fn test_stop_resets_counters() {
        let (mut transport, log) = transport_with_log();
        transport.start(0.0);
        for now in [0.1, 0.2, 0.3, 0.4, 0.5] {
            transport.tick(now);
        }
        assert!(transport.current_step() > 0);

        transport.stop(0.6);
        assert_eq!(transport.current_step(), 0);
        assert_eq!(transport.next_event_time(), 0.0);

        log.lock().unwrap().clear();
        transport.start(1.0);
        transport.tick(1.1);
        assert_eq!(log.lock().unwrap().beats()[0].step_index, 0);
    }

    #[test]
    fn test_no_beats_after_stop() {
        let (mut transport, log) = transport_with_log();
        transport.start(0.0);
        transport.tick(0.1);
        transport.tick(0.2);
        transport.stop(0.25);

        let count = log.lock().unwrap().len();
        assert_eq!(transport.tick(5.0).beats, 0);
        assert_eq!(log.lock().unwrap().len(), count);
        assert!(matches!(
            log.lock().unwrap().events().last(),
            Some(TransportEvent::Stop { .. })
        ));
    }

    #[test]
    fn test_set_number_of_bars() {
        let (mut transport, log) = transport_with_log();
        assert!(!transport.set_number_of_bars(0));
        assert!(transport.set_number_of_bars(2));
        assert_eq!(transport.total_steps(), 32);
        assert_eq!(
            log.lock().unwrap().events()[0],
            TransportEvent::BarsChange {
                bars: 2,
                total_steps: 32
            }
        );
    }

    #[test]
    fn test_oversized_bar_count_is_rejected() {
        let (mut transport, log) = transport_with_log();
        assert!(!transport.set_number_of_bars(300_000_000));
        assert!(!transport.set_number_of_bars(u32::MAX));
        assert_eq!(transport.total_steps(), 16);
        assert!(log.lock().unwrap().is_empty());

        // Still the largest countable loop
        assert!(transport.set_number_of_bars(u32::MAX / 16));
        assert_eq!(transport.total_steps(), u32::MAX / 16 * 16);
    }

    #[test]
    fn test_shrinking_bars_wraps_current_step() {
        let (mut transport, _log) = transport_with_log();
        transport.set_number_of_bars(2);
        transport.start(0.0);

        // Advance past step 16
        let mut now = 0.0;
        while transport.current_step() < 20 {
            transport.tick(now);
            now += 0.025;
        }

        transport.set_number_of_bars(1);
        assert!(transport.current_step() < 16);
    }

    #[test]
    fn test_stalled_clock_skips_missed_steps() {
        let (mut transport, log) = transport_with_log();
        transport.start(0.0);
        transport.tick(0.1);

        // Host froze for ten seconds
        let report = transport.tick(10.1);
        assert!(report.skipped > 0);
        // Only the lookahead worth of steps is emitted
        assert!(report.beats <= 2);

        let beats = log.lock().unwrap().beats();
        let last = beats.last().unwrap();
        assert!(last.absolute_time >= 10.1 - transport.step_duration());
        // Steps stay on the original grid
        let phase = (last.absolute_time - 0.1) / 0.125;
        assert!((phase - phase.round()).abs() < 1e-6);
        assert_eq!(last.step_index as f64, phase.round() % 16.0);
    }

    #[test]
    fn test_dropped_listener_is_forgotten() {
        let mut transport = Transport::default();
        let log = Arc::new(Mutex::new(EventLog::new()));
        transport.add_listener(&log);
        assert_eq!(transport.listener_count(), 1);
        drop(log);
        assert_eq!(transport.listener_count(), 0);
        transport.start(0.0);
        assert_eq!(transport.tick(0.2).faults, 0);
    }

    #[test]
    fn test_toggle_play() {
        let mut transport = Transport::default();
        transport.toggle_play(0.0);
        assert!(transport.is_playing());
        transport.toggle_play(0.1);
        assert!(!transport.is_playing());
    }
}
