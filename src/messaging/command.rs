// Command types - Control thread → scheduler thread

/// Transport commands applied at the start of the next scheduler tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Start,
    Stop,
    TogglePlay,
    SetTempo(f64),
    SetBars(u32),
    Quit,
}
