//! Scheduler engine: command channel, notifications and the threaded runner

use ringbuf::traits::{Consumer, Producer};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use studio_sequencer::messaging::NotificationCategory;
use studio_sequencer::sequencer::{
    EventLog, Note, PianoRoll, StepSequencer, TransportEvent, TransportListener, TransportState,
    TriggerLog, TriggerPayload,
};
use studio_sequencer::{
    AudioClock, Command, EngineConfig, ListenerError, ManualClock, SchedulerEngine, SystemClock,
};

struct AlwaysFails;

impl TransportListener for AlwaysFails {
    fn on_event(&mut self, event: &TransportEvent) -> Result<(), ListenerError> {
        match event {
            TransportEvent::Beat(_) => Err(ListenerError::Failed("voice unavailable".into())),
            _ => Ok(()),
        }
    }
}

/// Test a full session driven through commands on a simulated clock
#[test]
fn test_commands_drive_transport() {
    let clock = ManualClock::new(0.0);
    let (mut engine, mut channels) =
        SchedulerEngine::from_config(&EngineConfig::default(), Box::new(clock.clone()));

    let roll = Arc::new(Mutex::new(PianoRoll::new(EngineConfig::default().grid())));
    let voice = Arc::new(Mutex::new(TriggerLog::new()));
    {
        let mut roll = roll.lock().unwrap();
        roll.add_note(Note::new(1, 0.5, 64, 0.5, 1.0).unwrap());
        roll.add_target(&voice);
    }
    engine.transport_mut().add_listener(&roll);

    channels.commands.try_push(Command::SetBars(2)).unwrap();
    channels.commands.try_push(Command::Start).unwrap();

    // 1 bar at 120 BPM is 2 s; the note sits at step 16 of 32
    while clock.now() < 2.5 {
        assert!(engine.step());
        clock.advance(0.025);
    }
    assert_eq!(engine.transport().total_steps(), 32);

    channels.commands.try_push(Command::Stop).unwrap();
    engine.step();
    assert_eq!(engine.transport().state(), TransportState::Stopped);

    let voice = voice.lock().unwrap();
    let notes: Vec<_> = voice
        .triggers()
        .iter()
        .filter(|(_, p)| matches!(p, TriggerPayload::Note { .. }))
        .collect();
    assert_eq!(notes.len(), 1);
    assert!((notes[0].0 - 2.1).abs() < 1e-9);
    assert!(voice.triggers().last().unwrap().1.is_stop_all());
}

/// Test listener faults surface as notifications without stopping the engine
#[test]
fn test_faults_are_reported() {
    let clock = ManualClock::new(0.0);
    let (mut engine, mut channels) =
        SchedulerEngine::from_config(&EngineConfig::default(), Box::new(clock.clone()));
    let failing = Arc::new(Mutex::new(AlwaysFails));
    let log = Arc::new(Mutex::new(EventLog::new()));
    engine.transport_mut().add_listener(&failing);
    engine.transport_mut().add_listener(&log);

    channels.commands.try_push(Command::Start).unwrap();
    for _ in 0..10 {
        engine.step();
        clock.advance(0.025);
    }

    let notifications: Vec<_> = channels.notifications.pop_iter().collect();
    assert!(!notifications.is_empty());
    assert!(
        notifications
            .iter()
            .all(|n| n.category == NotificationCategory::Listener)
    );
    assert!(log.lock().unwrap().beats().len() >= 1);
}

/// Test the engine thread plays in real time and hands back its transport
#[test]
fn test_spawned_engine_plays_and_shuts_down() {
    let config = EngineConfig::default();
    let (mut engine, channels) =
        SchedulerEngine::from_config(&config, Box::new(SystemClock::new()));

    let sequencer = Arc::new(Mutex::new(StepSequencer::new()));
    let target = Arc::new(Mutex::new(TriggerLog::new()));
    sequencer.lock().unwrap().add_target(&target);
    engine.transport_mut().add_listener(&sequencer);

    let mut handle = engine.spawn(channels).unwrap();
    assert!(handle.start());
    thread::sleep(Duration::from_millis(400));

    let transport = handle.shutdown().expect("engine thread joined");
    assert_eq!(transport.state(), TransportState::Stopped);

    let target = target.lock().unwrap();
    let steps = target
        .triggers()
        .iter()
        .filter(|(_, p)| matches!(p, TriggerPayload::Step { .. }))
        .count();
    // 0.4 s at 8 steps per second, plus lookahead, minus start offset
    assert!(steps >= 2, "only {} steps", steps);
    assert!(target.triggers().last().unwrap().1.is_stop_all());
}

/// Test a full command buffer rejects commands instead of blocking
#[test]
fn test_full_command_buffer() {
    let config = EngineConfig {
        command_capacity: 2,
        ..Default::default()
    };
    let (engine, channels) = SchedulerEngine::from_config(&config, Box::new(SystemClock::new()));
    let mut handle = engine.spawn(channels).unwrap();

    let accepted: Vec<bool> = (0..100)
        .map(|i| handle.set_tempo(60.0 + i as f64))
        .collect();
    assert!(accepted.iter().any(|ok| !ok));

    // Dropping the handle still quits the engine
    drop(handle);
}
