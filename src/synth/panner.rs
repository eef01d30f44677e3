// Stereo panner - Equal-power pan law with automated position

use super::automation::AutomationLane;
use super::parameters::ParameterSet;
use crate::error::ListenerError;
use crate::sequencer::target::{Target, TriggerPayload};
use std::f64::consts::FRAC_PI_4;

/// Left/right gains for a pan position in [-1, 1]
/// -1 is hard left, 0 is centre (both channels at cos(π/4)), 1 is hard right.
pub fn equal_power_gains(pan: f64) -> (f64, f64) {
    let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
    (angle.cos(), angle.sin())
}

pub struct StereoPanner {
    parameters: ParameterSet,
    pan: AutomationLane,
}

impl StereoPanner {
    pub fn new() -> Self {
        Self {
            parameters: ParameterSet::new().with("pan", 0.0, -1.0, 1.0),
            pan: AutomationLane::new(0.0),
        }
    }

    /// Set the pan position now and from `time` on
    pub fn set_pan(&mut self, pan: f64, time: f64) -> f64 {
        let pan = self.parameters.set("pan", pan).unwrap_or(0.0);
        self.pan.cancel_scheduled_values(time);
        self.pan.set_value_at_time(pan, time);
        pan
    }

    pub fn pan(&self) -> f64 {
        self.parameters.get("pan").unwrap_or(0.0)
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn pan_at(&self, t: f64) -> f64 {
        self.pan.value_at(t)
    }

    /// (left, right) gains at time `t`
    pub fn channel_gains(&self, t: f64) -> (f64, f64) {
        equal_power_gains(self.pan_at(t))
    }
}

impl Default for StereoPanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Target for StereoPanner {
    fn trigger(&mut self, time: f64, payload: &TriggerPayload) -> Result<(), ListenerError> {
        // Pan has nothing to release on stop
        if !payload.is_stop_all() {
            let pan = self.pan();
            self.pan.set_value_at_time(pan, time);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_equal_power_law() {
        let (l, r) = equal_power_gains(0.0);
        assert!((l - r).abs() < EPS);
        assert!((l * l + r * r - 1.0).abs() < EPS);

        let (l, r) = equal_power_gains(-1.0);
        assert!((l - 1.0).abs() < EPS && r.abs() < EPS);

        let (l, r) = equal_power_gains(1.0);
        assert!(l.abs() < EPS && (r - 1.0).abs() < EPS);

        // Out of range is clamped
        assert_eq!(equal_power_gains(5.0), equal_power_gains(1.0));
    }

    #[test]
    fn test_scheduled_pan() {
        let mut panner = StereoPanner::new();
        assert_eq!(panner.set_pan(-3.0, 1.0), -1.0);

        let (l, _) = panner.channel_gains(0.5);
        assert!((l - FRAC_PI_4.cos()).abs() < EPS);
        let (l, r) = panner.channel_gains(1.0);
        assert!((l - 1.0).abs() < EPS && r.abs() < EPS);
    }

    #[test]
    fn test_trigger_applies_current_pan() {
        let mut panner = StereoPanner::new();
        panner.set_pan(0.5, 0.0);
        panner.trigger(2.0, &TriggerPayload::StopAll).unwrap();
        panner
            .trigger(
                3.0,
                &TriggerPayload::Click {
                    accent: false,
                    volume: 1.0,
                },
            )
            .unwrap();
        assert_eq!(panner.pan_at(3.0), 0.5);
    }
}
