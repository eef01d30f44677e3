// Timeline - Musical time representation
// Tempo, step grid and conversions between steps, pattern fractions and seconds

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tempo in BPM (Beats Per Minute)
///
/// Always held inside [`Tempo::MIN_BPM`, `Tempo::MAX_BPM`]: out-of-range
/// requests are clamped instead of rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    bpm: f64,
}

impl Tempo {
    pub const MIN_BPM: f64 = 30.0;
    pub const MAX_BPM: f64 = 300.0;
    pub const DEFAULT_BPM: f64 = 120.0;

    /// Creates a new tempo, clamped to the supported range
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: Self::clamp_bpm(bpm),
        }
    }

    /// Clamp a requested BPM into the supported range
    /// NaN falls back to the default tempo
    pub fn clamp_bpm(bpm: f64) -> f64 {
        if bpm.is_nan() {
            Self::DEFAULT_BPM
        } else {
            bpm.clamp(Self::MIN_BPM, Self::MAX_BPM)
        }
    }

    /// Get BPM value
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Set BPM value, returns the effective (clamped) BPM
    pub fn set_bpm(&mut self, bpm: f64) -> f64 {
        self.bpm = Self::clamp_bpm(bpm);
        self.bpm
    }

    /// Duration of one beat (quarter note) in seconds
    pub fn beat_duration_seconds(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Duration of one grid step in seconds
    /// `60 / (bpm * subdivisions_per_beat)`, e.g. a sixteenth note for 4 subdivisions
    pub fn step_duration_seconds(&self, subdivisions_per_beat: u32) -> f64 {
        60.0 / (self.bpm * subdivisions_per_beat.max(1) as f64)
    }

    /// Duration of one bar of the given grid in seconds
    pub fn bar_duration_seconds(&self, grid: &StepGrid) -> f64 {
        self.step_duration_seconds(grid.subdivisions_per_beat) * grid.steps_per_bar as f64
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BPM)
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} BPM", self.bpm)
    }
}

/// Step grid of a looping pattern
/// Example: 16 steps per bar with 4 subdivisions per beat = sixteenth notes in 4/4
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepGrid {
    pub steps_per_bar: u32,
    pub bars: u32,
    pub subdivisions_per_beat: u32,
}

impl StepGrid {
    pub const DEFAULT_STEPS_PER_BAR: u32 = 16;
    pub const DEFAULT_SUBDIVISIONS: u32 = 4;

    /// Creates a new step grid
    pub fn new(steps_per_bar: u32, bars: u32, subdivisions_per_beat: u32) -> Self {
        assert!(steps_per_bar > 0, "Steps per bar must be > 0");
        assert!(bars > 0, "Pattern length must be at least 1 bar");
        assert!(
            steps_per_bar.checked_mul(bars).is_some(),
            "Pattern length overflows the step counter"
        );
        assert!(
            subdivisions_per_beat > 0,
            "Subdivisions per beat must be > 0"
        );
        Self {
            steps_per_bar,
            bars,
            subdivisions_per_beat,
        }
    }

    /// Sixteenth-note grid of the given number of bars
    pub fn sixteenths(bars: u32) -> Self {
        Self::new(Self::DEFAULT_STEPS_PER_BAR, bars, Self::DEFAULT_SUBDIVISIONS)
    }

    /// Same grid with a different number of bars
    pub fn with_bars(&self, bars: u32) -> Self {
        Self::new(self.steps_per_bar, bars, self.subdivisions_per_beat)
    }

    /// Same grid with a different number of bars, if the loop stays countable
    pub fn try_with_bars(&self, bars: u32) -> Option<Self> {
        if bars == 0 || self.steps_per_bar.checked_mul(bars).is_none() {
            return None;
        }
        Some(self.with_bars(bars))
    }

    /// Total number of steps in the loop
    pub fn total_steps(&self) -> u32 {
        self.steps_per_bar * self.bars
    }

    /// Number of beats per bar (4 for the default grid)
    pub fn beats_per_bar(&self) -> f64 {
        self.steps_per_bar as f64 / self.subdivisions_per_beat as f64
    }

    /// Absolute step of a fractional pattern position in [0, 1)
    pub fn step_for_position(&self, position: f64) -> u32 {
        step_for_position(position, self.total_steps())
    }

    /// Fractional pattern position of the start of a step
    pub fn position_for_step(&self, step: u32) -> f64 {
        (step % self.total_steps()) as f64 / self.total_steps() as f64
    }

    /// Locate a step index on the bar/beat/step grid
    pub fn locate(&self, step_index: u32) -> BarBeatStep {
        locate(step_index, self.steps_per_bar, self.subdivisions_per_beat)
    }
}

impl Default for StepGrid {
    fn default() -> Self {
        Self::sixteenths(1)
    }
}

/// `floor(position * total_steps)`, kept inside the loop
pub fn step_for_position(position: f64, total_steps: u32) -> u32 {
    if total_steps == 0 {
        return 0;
    }
    let step = (position * total_steps as f64).floor();
    if step <= 0.0 {
        0
    } else {
        (step as u32).min(total_steps - 1)
    }
}

/// Split a step index into bar / beat / step-in-beat
pub fn locate(step_index: u32, steps_per_bar: u32, subdivisions_per_beat: u32) -> BarBeatStep {
    let steps_per_bar = steps_per_bar.max(1);
    let subdivisions = subdivisions_per_beat.max(1);
    let in_bar = step_index % steps_per_bar;
    BarBeatStep {
        bar: step_index / steps_per_bar + 1,
        beat: in_bar / subdivisions + 1,
        step: in_bar % subdivisions + 1,
    }
}

/// Position on the step grid (all fields 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BarBeatStep {
    pub bar: u32,
    pub beat: u32,
    pub step: u32,
}

impl fmt::Display for BarBeatStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.bar, self.beat, self.step)
    }
}
