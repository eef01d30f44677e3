// Scheduler engine - Coarse-timer loop driving the transport
// The engine thread owns the Transport; the control thread talks to it through ring buffers

use crate::clock::AudioClock;
use crate::config::EngineConfig;
use crate::messaging::channels::{
    CommandConsumer, CommandProducer, NotificationConsumer, NotificationProducer,
    create_command_channel, create_notification_channel,
};
use crate::messaging::command::Command;
use crate::messaging::notification::{Notification, NotificationCategory};
use crate::sequencer::transport::{TickReport, Transport};
use log::{debug, info, warn};
use ringbuf::traits::{Consumer, Producer};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Control-side ends of the engine channels
pub struct EngineChannels {
    pub commands: CommandProducer,
    pub notifications: NotificationConsumer,
}

pub struct SchedulerEngine {
    transport: Transport,
    clock: Box<dyn AudioClock>,
    commands: CommandConsumer,
    notifications: NotificationProducer,
    tick_interval: Duration,
    quit: bool,
}

impl SchedulerEngine {
    pub fn new(
        transport: Transport,
        clock: Box<dyn AudioClock>,
        tick_interval: Duration,
        command_capacity: usize,
        notification_capacity: usize,
    ) -> (Self, EngineChannels) {
        let (command_tx, command_rx) = create_command_channel(command_capacity);
        let (notification_tx, notification_rx) = create_notification_channel(notification_capacity);

        let engine = Self {
            transport,
            clock,
            commands: command_rx,
            notifications: notification_tx,
            tick_interval,
            quit: false,
        };
        let channels = EngineChannels {
            commands: command_tx,
            notifications: notification_rx,
        };
        (engine, channels)
    }

    pub fn from_config(config: &EngineConfig, clock: Box<dyn AudioClock>) -> (Self, EngineChannels) {
        Self::new(
            Transport::from_config(config),
            clock,
            config.tick_interval(),
            config.command_capacity,
            config.notification_capacity,
        )
    }

    /// Register listeners here before spawning
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut Transport {
        &mut self.transport
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// One loop iteration without sleeping: apply pending commands, then tick
    /// Returns false once `Command::Quit` has been received.
    pub fn step(&mut self) -> bool {
        if self.quit {
            return false;
        }

        while let Some(cmd) = self.commands.try_pop() {
            self.apply(cmd);
            if self.quit {
                return false;
            }
        }

        let report = self.transport.tick(self.clock.now());
        self.report(report);
        true
    }

    fn apply(&mut self, cmd: Command) {
        debug!("Command {:?}", cmd);
        let now = self.clock.now();
        match cmd {
            Command::Start => {
                self.transport.start(now);
            }
            Command::Stop => {
                self.transport.stop(now);
            }
            Command::TogglePlay => self.transport.toggle_play(now),
            Command::SetTempo(bpm) => {
                self.transport.set_tempo(bpm);
            }
            Command::SetBars(bars) => {
                if !self.transport.set_number_of_bars(bars) {
                    self.notify(Notification::warning(
                        NotificationCategory::Transport,
                        format!("Rejected pattern length of {} bars", bars),
                    ));
                }
            }
            Command::Quit => {
                self.transport.stop(now);
                self.quit = true;
            }
        }
    }

    fn report(&mut self, report: TickReport) {
        if report.skipped > 0 {
            self.notify(Notification::warning(
                NotificationCategory::Transport,
                format!("Scheduler fell behind, skipped {} steps", report.skipped),
            ));
        }
        if report.faults > 0 {
            self.notify(Notification::error(
                NotificationCategory::Listener,
                format!("{} listener deliveries failed", report.faults),
            ));
        }
    }

    fn notify(&mut self, notification: Notification) {
        if self.notifications.try_push(notification).is_err() {
            debug!("Notification buffer full, dropping notification");
        }
    }

    /// Run until `Command::Quit`, sleeping one tick interval between iterations
    pub fn run(mut self) -> Transport {
        info!(
            "Scheduler running (tick {:?}, lookahead {:.3}s)",
            self.tick_interval,
            self.transport.schedule_ahead()
        );
        while self.step() {
            thread::sleep(self.tick_interval);
        }
        info!("Scheduler stopped");
        self.transport
    }

    /// Run the loop on its own thread
    pub fn spawn(self, channels: EngineChannels) -> std::io::Result<EngineHandle> {
        let thread = thread::Builder::new()
            .name("scheduler".into())
            .spawn(move || self.run())?;

        Ok(EngineHandle {
            commands: channels.commands,
            notifications: channels.notifications,
            thread: Some(thread),
        })
    }
}

/// Control-thread handle to a running engine
/// Dropping the handle quits the engine and joins its thread.
pub struct EngineHandle {
    commands: CommandProducer,
    notifications: NotificationConsumer,
    thread: Option<JoinHandle<Transport>>,
}

impl EngineHandle {
    /// Queue a command. Never blocks; false if the command buffer is full.
    pub fn send(&mut self, cmd: Command) -> bool {
        match self.commands.try_push(cmd) {
            Ok(()) => true,
            Err(cmd) => {
                warn!("Command buffer full, dropping {:?}", cmd);
                false
            }
        }
    }

    pub fn start(&mut self) -> bool {
        self.send(Command::Start)
    }

    pub fn stop(&mut self) -> bool {
        self.send(Command::Stop)
    }

    pub fn set_tempo(&mut self, bpm: f64) -> bool {
        self.send(Command::SetTempo(bpm))
    }

    pub fn set_bars(&mut self, bars: u32) -> bool {
        self.send(Command::SetBars(bars))
    }

    /// Notifications raised since the last call
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.notifications.pop_iter().collect()
    }

    /// Quit the engine and wait for its thread; returns the transport it owned
    pub fn shutdown(mut self) -> Option<Transport> {
        self.quit_and_join()
    }

    fn quit_and_join(&mut self) -> Option<Transport> {
        let thread = self.thread.take()?;
        // Retry until Quit fits; the engine drains the buffer every tick
        while self.commands.try_push(Command::Quit).is_err() {
            thread::sleep(Duration::from_millis(1));
        }
        match thread.join() {
            Ok(transport) => Some(transport),
            Err(_) => {
                warn!("Scheduler thread panicked");
                None
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.quit_and_join();
    }
}
