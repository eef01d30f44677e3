// MIDI input - Raw messages from a device into a lock-free buffer

use ringbuf::{HeapRb, traits::Split};

/// Raw MIDI message of at most three bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawMidiMessage {
    bytes: [u8; 3],
    len: u8,
}

impl RawMidiMessage {
    /// Copy a device message; longer messages (SysEx) are rejected
    pub fn from_slice(message: &[u8]) -> Option<Self> {
        if message.is_empty() || message.len() > 3 {
            return None;
        }
        let mut bytes = [0u8; 3];
        bytes[..message.len()].copy_from_slice(message);
        Some(Self {
            bytes,
            len: message.len() as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

pub type MidiProducer = ringbuf::HeapProd<RawMidiMessage>;
pub type MidiConsumer = ringbuf::HeapCons<RawMidiMessage>;

pub fn create_midi_channel(capacity: usize) -> (MidiProducer, MidiConsumer) {
    let rb = HeapRb::<RawMidiMessage>::new(capacity);
    rb.split()
}

#[cfg(feature = "midi-input")]
pub use device::{MidiDeviceInfo, MidiInput, list_input_ports};

#[cfg(feature = "midi-input")]
mod device {
    use super::{MidiProducer, RawMidiMessage};
    use crate::error::MidiError;
    use log::{info, warn};
    use midir::{MidiInput as MidirInput, MidiInputConnection};
    use ringbuf::traits::Producer;

    const CLIENT_NAME: &str = "studio_sequencer";

    #[derive(Clone, Debug)]
    pub struct MidiDeviceInfo {
        pub index: usize,
        pub name: String,
    }

    /// Available MIDI input ports
    pub fn list_input_ports() -> Result<Vec<MidiDeviceInfo>, MidiError> {
        let midi_in = MidirInput::new(CLIENT_NAME).map_err(|e| MidiError::Init(e.to_string()))?;
        Ok(midi_in
            .ports()
            .iter()
            .enumerate()
            .filter_map(|(index, port)| {
                midi_in
                    .port_name(port)
                    .ok()
                    .map(|name| MidiDeviceInfo { index, name })
            })
            .collect())
    }

    /// Open connection; dropping it closes the port
    pub struct MidiInput {
        _connection: MidiInputConnection<()>,
        port_name: String,
    }

    impl MidiInput {
        /// Connect to the named port, or the first available one
        pub fn connect(
            device_name: Option<&str>,
            mut producer: MidiProducer,
        ) -> Result<Self, MidiError> {
            let midi_in =
                MidirInput::new(CLIENT_NAME).map_err(|e| MidiError::Init(e.to_string()))?;
            let ports = midi_in.ports();

            let port = match device_name {
                Some(wanted) => ports
                    .into_iter()
                    .find(|p| midi_in.port_name(p).is_ok_and(|name| name == wanted))
                    .ok_or_else(|| MidiError::PortNotFound(wanted.to_string()))?,
                None => ports.into_iter().next().ok_or(MidiError::NoPorts)?,
            };
            let port_name = midi_in
                .port_name(&port)
                .unwrap_or_else(|_| "Unknown".to_string());

            let connection = midi_in
                .connect(
                    &port,
                    "studio-sequencer-input",
                    move |_timestamp, message, _| {
                        // Runs on the midir thread
                        let Some(raw) = RawMidiMessage::from_slice(message) else {
                            return;
                        };
                        if producer.try_push(raw).is_err() {
                            warn!("MIDI buffer full, message dropped");
                        }
                    },
                    (),
                )
                .map_err(|e| MidiError::Connect(e.to_string()))?;

            info!("Connected to MIDI port: {}", port_name);
            Ok(Self {
                _connection: connection,
                port_name,
            })
        }

        pub fn port_name(&self) -> &str {
            &self.port_name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::{Consumer, Producer};

    #[test]
    fn test_raw_message() {
        let msg = RawMidiMessage::from_slice(&[0xB0, 7, 100]).unwrap();
        assert_eq!(msg.as_bytes(), &[0xB0, 7, 100]);

        let short = RawMidiMessage::from_slice(&[0xC0, 5]).unwrap();
        assert_eq!(short.as_bytes(), &[0xC0, 5]);

        assert!(RawMidiMessage::from_slice(&[]).is_none());
        assert!(RawMidiMessage::from_slice(&[0xF0, 1, 2, 3, 0xF7]).is_none());
    }

    #[test]
    fn test_midi_channel() {
        let (mut tx, mut rx) = create_midi_channel(4);
        let msg = RawMidiMessage::from_slice(&[0x90, 60, 100]).unwrap();
        tx.try_push(msg).unwrap();
        assert_eq!(rx.try_pop(), Some(msg));
        assert_eq!(rx.try_pop(), None);
    }
}
