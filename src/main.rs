// Studio Sequencer - Demo runner: transport, step sequencer, piano roll and metronome

use clap::Parser;
use log::{error, info, warn};
use ringbuf::traits::{Consumer, Producer};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use studio_sequencer::{
    AudioClock, Command, EngineConfig, ListenerError, ManualClock, Metronome, Note, OscillatorVoice,
    PianoRoll, SchedulerEngine, StepSequencer, SystemClock, Target, TriggerPayload,
};

/// Run the sequencer demo and print every scheduled trigger
#[derive(Parser, Debug)]
#[command(name = "studio_sequencer")]
#[command(about = "Lookahead transport driving a step sequencer, a piano roll and a metronome")]
#[command(version)]
struct Cli {
    /// Engine configuration file (.ron or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tempo in BPM (clamped to 30-300)
    #[arg(long)]
    bpm: Option<f64>,

    /// Pattern length in bars
    #[arg(long)]
    bars: Option<u32>,

    /// How long to play, in seconds
    #[arg(long, default_value = "4.0", value_parser = parse_seconds)]
    seconds: f64,

    /// Step pattern, one character per step: 'x' plays, anything else rests
    #[arg(long, default_value = "x...x...x...x...")]
    steps: String,

    /// Disable the metronome
    #[arg(long)]
    no_metronome: bool,

    /// Render as fast as possible on a simulated clock instead of real time
    #[arg(long)]
    offline: bool,

    /// Print triggers as JSON lines
    #[arg(long)]
    json: bool,

    /// MIDI input port (first available port when omitted)
    #[cfg(feature = "midi-input")]
    #[arg(long)]
    midi_port: Option<String>,
}

/// Target that prints the triggers it receives
struct PrintTarget {
    source: &'static str,
    json: bool,
}

impl Target for PrintTarget {
    fn trigger(&mut self, time: f64, payload: &TriggerPayload) -> Result<(), ListenerError> {
        if self.json {
            let line = serde_json::json!({
                "source": self.source,
                "time": time,
                "payload": payload,
            });
            println!("{}", line);
        } else {
            println!("{:>9.3}s  {:<14} {:?}", time, self.source, payload);
        }
        Ok(())
    }
}

/// Play length: a finite, non-negative number of seconds
fn parse_seconds(value: &str) -> Result<f64, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|e| format!("'{}' is not a number: {}", value, e))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("'{}' is not a finite, non-negative duration", value));
    }
    Ok(seconds)
}

fn load_config(cli: &Cli) -> Result<EngineConfig, studio_sequencer::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(bpm) = cli.bpm {
        config.tempo_bpm = bpm;
    }
    if let Some(bars) = cli.bars {
        config.bars = bars;
    }
    config.validate()?;
    Ok(config)
}

/// Demo arpeggio: C major over one pattern
fn demo_notes() -> Vec<Note> {
    [(0.0, 60), (0.25, 64), (0.5, 67), (0.75, 72)]
        .into_iter()
        .enumerate()
        .filter_map(|(i, (position, pitch))| Note::new(i as u64, position, pitch, 0.25, 0.8).ok())
        .collect()
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Event sources
    let mut sequencer = StepSequencer::with_steps(cli.steps.chars().count().max(1));
    for (i, c) in cli.steps.chars().enumerate() {
        sequencer.set_step(i, matches!(c, 'x' | 'X' | '1'));
    }
    let sequencer = Arc::new(Mutex::new(sequencer));

    let mut piano_roll = PianoRoll::new(config.grid());
    for note in demo_notes() {
        piano_roll.add_note(note);
    }
    let piano_roll = Arc::new(Mutex::new(piano_roll));

    let mut metronome = Metronome::new();
    metronome.set_enabled(!cli.no_metronome);
    let metronome = Arc::new(Mutex::new(metronome));

    // Targets
    let step_printer = Arc::new(Mutex::new(PrintTarget {
        source: "stepSequencer",
        json: cli.json,
    }));
    let roll_printer = Arc::new(Mutex::new(PrintTarget {
        source: "pianoRoll",
        json: cli.json,
    }));
    let click_printer = Arc::new(Mutex::new(PrintTarget {
        source: "metronome",
        json: cli.json,
    }));
    let lead = Arc::new(Mutex::new(OscillatorVoice::new()));

    if let Ok(mut s) = sequencer.lock() {
        s.add_target(&step_printer);
    }
    if let Ok(mut r) = piano_roll.lock() {
        r.add_target(&roll_printer);
        r.add_target(&lead);
    }
    if let Ok(mut m) = metronome.lock() {
        m.add_target(&click_printer);
    }

    if cli.offline {
        run_offline(&cli, &config, &sequencer, &piano_roll, &metronome);
    } else if let Err(e) = run_realtime(&cli, &config, &sequencer, &piano_roll, &metronome) {
        eprintln!("ERROR: {}", e);
        return ExitCode::FAILURE;
    }

    if let Ok(voice) = lead.lock() {
        info!("Lead voice silent after {:?}", voice.release_end());
    }
    ExitCode::SUCCESS
}

fn run_offline(
    cli: &Cli,
    config: &EngineConfig,
    sequencer: &Arc<Mutex<StepSequencer>>,
    piano_roll: &Arc<Mutex<PianoRoll>>,
    metronome: &Arc<Mutex<Metronome>>,
) {
    let clock = ManualClock::new(0.0);
    let (mut engine, mut channels) = SchedulerEngine::from_config(config, Box::new(clock.clone()));
    engine.transport_mut().add_listener(sequencer);
    engine.transport_mut().add_listener(piano_roll);
    engine.transport_mut().add_listener(metronome);

    let interval = config.tick_interval().as_secs_f64();
    if channels.commands.try_push(Command::Start).is_err() {
        warn!("Could not queue start command");
    }
    while clock.now() < cli.seconds {
        engine.step();
        clock.advance(interval);
    }
    if channels.commands.try_push(Command::Quit).is_err() {
        warn!("Could not queue quit command");
    }
    engine.step();

    for notification in channels.notifications.pop_iter() {
        warn!("{:?}: {}", notification.category, notification.message);
    }
}

fn run_realtime(
    cli: &Cli,
    config: &EngineConfig,
    sequencer: &Arc<Mutex<StepSequencer>>,
    piano_roll: &Arc<Mutex<PianoRoll>>,
    metronome: &Arc<Mutex<Metronome>>,
) -> std::io::Result<()> {
    let (mut engine, channels) = SchedulerEngine::from_config(config, Box::new(SystemClock::new()));
    engine.transport_mut().add_listener(sequencer);
    engine.transport_mut().add_listener(piano_roll);
    engine.transport_mut().add_listener(metronome);

    let mut handle = engine.spawn(channels)?;

    #[cfg(feature = "midi-input")]
    let mut midi = midi_control::MidiControls::connect(cli.midi_port.as_deref());

    handle.start();
    let deadline = Instant::now() + Duration::from_secs_f64(cli.seconds);
    while Instant::now() < deadline {
        #[cfg(feature = "midi-input")]
        if let Some(midi) = midi.as_mut() {
            for cmd in midi.poll() {
                handle.send(cmd);
            }
        }

        for notification in handle.drain_notifications() {
            warn!("{:?}: {}", notification.category, notification.message);
        }
        thread::sleep(Duration::from_millis(10));
    }

    if handle.shutdown().is_none() {
        error!("Scheduler thread did not shut down cleanly");
    }
    Ok(())
}

/// Hardware controller mapping: CC 20 sets tempo, CC 21 toggles play
#[cfg(feature = "midi-input")]
mod midi_control {
    use log::warn;
    use ringbuf::traits::Consumer;
    use studio_sequencer::midi::input::{MidiInput, create_midi_channel};
    use studio_sequencer::midi::{MidiConsumer, MidiControl};
    use studio_sequencer::sequencer::Tempo;
    use studio_sequencer::{Command, ControlAction, ControlId, MidiControlMap};

    pub struct MidiControls {
        _input: MidiInput,
        messages: MidiConsumer,
        map: MidiControlMap,
        tempo: ControlId,
        play: ControlId,
    }

    impl MidiControls {
        pub fn connect(port: Option<&str>) -> Option<Self> {
            let (producer, messages) = create_midi_channel(512);
            let input = match MidiInput::connect(port, producer) {
                Ok(input) => input,
                Err(e) => {
                    warn!("{}. Continuing without MIDI.", e);
                    return None;
                }
            };

            let mut map = MidiControlMap::new();
            let tempo = map.register(MidiControl::range(0, 20, Tempo::MIN_BPM, Tempo::MAX_BPM));
            let play = map.register(MidiControl::trigger(0, 21));
            Some(Self {
                _input: input,
                messages,
                map,
                tempo,
                play,
            })
        }

        /// Commands produced by messages received since the last poll
        pub fn poll(&mut self) -> Vec<Command> {
            let mut commands = Vec::new();
            while let Some(message) = self.messages.try_pop() {
                for (id, action) in self.map.handle_message(message.as_bytes()) {
                    match action {
                        ControlAction::Value(bpm) if id == self.tempo => {
                            commands.push(Command::SetTempo(bpm))
                        }
                        ControlAction::Pressed if id == self.play => {
                            commands.push(Command::TogglePlay)
                        }
                        _ => {}
                    }
                }
            }
            commands
        }
    }
}
