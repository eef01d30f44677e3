// MIDI controls - Continuous controllers mapped to ranges, toggles and triggers

use serde::{Deserialize, Serialize};

/// How a control interprets incoming 0-127 values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ControlKind {
    /// Scale 0-127 linearly onto [min, max]
    Range { min: f64, max: f64 },
    /// Flip on/off each time the value rises across the threshold
    Toggle { threshold: u8 },
    /// Press when the value reaches the threshold, release when it drops below
    Trigger { threshold: u8 },
}

impl ControlKind {
    pub const DEFAULT_THRESHOLD: u8 = 64;
}

/// Result of feeding a value to a control
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    Value(f64),
    ToggledOn,
    ToggledOff,
    Pressed,
    Released,
}

/// A control bound to one (channel, controller) pair
#[derive(Debug, Clone)]
pub struct MidiControl {
    channel: u8,
    controller: u8,
    kind: ControlKind,
    enabled: bool,
    raw: u8,
    on: bool,
    pressed: bool,
}

impl MidiControl {
    pub fn new(channel: u8, controller: u8, kind: ControlKind) -> Self {
        Self {
            channel: channel & 0x0F,
            controller,
            kind,
            enabled: true,
            raw: 0,
            on: false,
            pressed: false,
        }
    }

    pub fn range(channel: u8, controller: u8, min: f64, max: f64) -> Self {
        Self::new(channel, controller, ControlKind::Range { min, max })
    }

    pub fn toggle(channel: u8, controller: u8) -> Self {
        Self::new(
            channel,
            controller,
            ControlKind::Toggle {
                threshold: ControlKind::DEFAULT_THRESHOLD,
            },
        )
    }

    pub fn trigger(channel: u8, controller: u8) -> Self {
        Self::new(
            channel,
            controller,
            ControlKind::Trigger {
                threshold: ControlKind::DEFAULT_THRESHOLD,
            },
        )
    }

    pub fn kind(&self) -> ControlKind {
        self.kind
    }

    /// (channel, controller) this control listens to
    pub fn binding(&self) -> (u8, u8) {
        (self.channel, self.controller)
    }

    pub fn bind(&mut self, channel: u8, controller: u8) {
        self.channel = channel & 0x0F;
        self.controller = controller;
    }

    pub fn matches(&self, channel: u8, controller: u8) -> bool {
        self.channel == channel && self.controller == controller
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Last raw value received
    pub fn raw_value(&self) -> u8 {
        self.raw
    }

    /// Current value: scaled for ranges, raw otherwise
    pub fn value(&self) -> f64 {
        match self.kind {
            ControlKind::Range { min, max } => scale(self.raw, min, max),
            _ => self.raw as f64,
        }
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Raw 0-127 value corresponding to a scaled range value (for controller feedback)
    pub fn unscale(&self, value: f64) -> u8 {
        match self.kind {
            ControlKind::Range { min, max } if max != min => {
                let lo = min.min(max);
                let hi = min.max(max);
                let clamped = value.clamp(lo, hi);
                ((clamped - min) / (max - min) * 127.0).round() as u8
            }
            _ => value.clamp(0.0, 127.0).round() as u8,
        }
    }

    /// Feed a raw controller value. `None` when disabled or nothing changed state.
    pub fn handle_value(&mut self, value: u8) -> Option<ControlAction> {
        if !self.enabled {
            return None;
        }
        let value = value.min(127);
        self.raw = value;

        match self.kind {
            ControlKind::Range { min, max } => Some(ControlAction::Value(scale(value, min, max))),
            ControlKind::Toggle { threshold } => {
                let pressed = value >= threshold;
                let rising = pressed && !self.pressed;
                self.pressed = pressed;
                if rising {
                    self.on = !self.on;
                    Some(if self.on {
                        ControlAction::ToggledOn
                    } else {
                        ControlAction::ToggledOff
                    })
                } else {
                    None
                }
            }
            ControlKind::Trigger { threshold } => {
                let triggered = value >= threshold;
                if triggered && !self.pressed {
                    self.pressed = true;
                    Some(ControlAction::Pressed)
                } else if !triggered && self.pressed {
                    self.pressed = false;
                    Some(ControlAction::Released)
                } else {
                    None
                }
            }
        }
    }
}

fn scale(value: u8, min: f64, max: f64) -> f64 {
    min + (value as f64 / 127.0) * (max - min)
}
