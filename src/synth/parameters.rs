// Component parameters - Named values with a clamped range

use log::debug;

/// One named parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

impl Parameter {
    /// Normalized position in [0, 1] (used for MIDI feedback)
    pub fn normalized(&self) -> f64 {
        if self.max > self.min && self.max.is_finite() && self.min.is_finite() {
            (self.value - self.min) / (self.max - self.min)
        } else {
            0.0
        }
    }
}

/// Parameters of a synthesis component, in registration order
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    parameters: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter; re-adding a name replaces it
    pub fn add(&mut self, name: &str, default: f64, min: f64, max: f64) {
        let parameter = Parameter {
            name: name.to_string(),
            value: default.clamp(min, max),
            default,
            min,
            max,
        };
        match self.parameters.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = parameter,
            None => self.parameters.push(parameter),
        }
    }

    /// Builder form of `add`
    pub fn with(mut self, name: &str, default: f64, min: f64, max: f64) -> Self {
        self.add(name, default, min, max);
        self
    }

    /// Set a value, clamped to the parameter range
    /// Returns the stored value, `None` for an unknown name.
    pub fn set(&mut self, name: &str, value: f64) -> Option<f64> {
        let Some(parameter) = self.parameters.iter_mut().find(|p| p.name == name) else {
            debug!("Unknown parameter '{}'", name);
            return None;
        };
        if value.is_nan() {
            return Some(parameter.value);
        }
        parameter.value = value.clamp(parameter.min, parameter.max);
        Some(parameter.value)
    }

    /// Set from a normalized [0, 1] position across the range
    pub fn set_normalized(&mut self, name: &str, position: f64) -> Option<f64> {
        let (min, max) = {
            let p = self.parameter(name)?;
            (p.min, p.max)
        };
        self.set(name, min + (max - min) * position.clamp(0.0, 1.0))
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.parameter(name).map(|p| p.value)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Restore every parameter to its default
    pub fn reset(&mut self) {
        for p in &mut self.parameters {
            p.value = p.default.clamp(p.min, p.max);
        }
    }
}
