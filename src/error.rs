// Error types

/// Rejected note construction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NoteError {
    #[error("Note position must be in [0, 1), got {0}")]
    InvalidPosition(f64),

    #[error("Note duration must be > 0, got {0}")]
    InvalidDuration(f64),

    #[error("Note velocity must be in [0, 1], got {0}")]
    InvalidVelocity(f64),

    #[error("MIDI pitch must be 0-127, got {0}")]
    InvalidPitch(u8),
}

/// Failure reported by a transport listener or a trigger target
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListenerError {
    #[error("Listener failed: {0}")]
    Failed(String),

    #[error("Listener panicked: {0}")]
    Panicked(String),

    #[error("Listener lock poisoned")]
    Poisoned,
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// MIDI device errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MidiError {
    #[error("MIDI init error: {0}")]
    Init(String),

    #[error("No MIDI input port available")]
    NoPorts,

    #[error("MIDI port not found: {0}")]
    PortNotFound(String),

    #[error("MIDI connection failed: {0}")]
    Connect(String),
}
