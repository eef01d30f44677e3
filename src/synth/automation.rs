// Parameter automation - Timed value changes on the audio clock
//
// A lane holds set-value and linear-ramp events sorted by time, the way a
// host audio parameter schedules changes ahead of the render thread.

#[derive(Debug, Clone, Copy, PartialEq)]
enum AutomationEvent {
    /// Jump to `value` at `time`
    Set { time: f64, value: f64 },
    /// Ramp linearly from the previous event to `value`, reached at `time`
    LinearRamp { time: f64, value: f64 },
}

impl AutomationEvent {
    fn time(&self) -> f64 {
        match self {
            AutomationEvent::Set { time, .. } | AutomationEvent::LinearRamp { time, .. } => *time,
        }
    }

    fn value(&self) -> f64 {
        match self {
            AutomationEvent::Set { value, .. } | AutomationEvent::LinearRamp { value, .. } => {
                *value
            }
        }
    }
}

/// Automation timeline of a single parameter
#[derive(Debug, Clone)]
pub struct AutomationLane {
    initial: f64,
    events: Vec<AutomationEvent>,
}

impl AutomationLane {
    pub fn new(initial: f64) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    /// Schedule a jump to `value` at `time`
    pub fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(AutomationEvent::Set { time, value });
    }

    /// Schedule a linear ramp from the preceding event, reaching `value` at `end_time`
    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, end_time: f64) {
        self.insert(AutomationEvent::LinearRamp {
            time: end_time,
            value,
        });
    }

    /// Drop every event scheduled at or after `from`
    pub fn cancel_scheduled_values(&mut self, from: f64) {
        self.events.retain(|e| e.time() < from);
    }

    /// Forget events that no longer shape the value at or after `t`
    ///
    /// The last event at or before `t` stays as the baseline, so values from
    /// `t` on are unchanged. Earlier values are no longer tracked.
    pub fn discard_before(&mut self, t: f64) {
        let settled = self.events.partition_point(|e| e.time() <= t);
        if settled > 1 {
            self.events.drain(..settled - 1);
        }
    }

    /// Value of the parameter at time `t`
    pub fn value_at(&self, t: f64) -> f64 {
        let mut prev_time = f64::NEG_INFINITY;
        let mut prev_value = self.initial;

        for event in &self.events {
            if event.time() <= t {
                prev_time = event.time();
                prev_value = event.value();
                continue;
            }
            return match *event {
                AutomationEvent::Set { .. } => prev_value,
                AutomationEvent::LinearRamp { time, value } => {
                    if prev_time.is_finite() && time > prev_time {
                        let progress = (t - prev_time) / (time - prev_time);
                        prev_value + (value - prev_value) * progress
                    } else {
                        prev_value
                    }
                }
            };
        }
        prev_value
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Time of the last scheduled event
    pub fn end_time(&self) -> Option<f64> {
        self.events.last().map(|e| e.time())
    }

    fn insert(&mut self, event: AutomationEvent) {
        // Events at equal times keep insertion order
        let index = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(index, event);
    }
}

impl Default for AutomationLane {
    fn default() -> Self {
        Self::new(0.0)
    }
}
