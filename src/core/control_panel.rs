use std::collections::BTreeSet;
use std::fmt;

use crate::error::FrameMutationError;
use crate::math::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Number(f32),
    Toggle(bool),
    Color(Color),
}

impl ControlValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ControlValue::Number(_) => "number",
            ControlValue::Toggle(_) => "toggle",
            ControlValue::Color(_) => "color",
        }
    }
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlValue::Number(v) => write!(f, "{v}"),
            ControlValue::Toggle(v) => write!(f, "{v}"),
            ControlValue::Color(c) => write!(f, "#{:06x}", c.to_hex()),
        }
    }
}

/// One named control. Numeric controls carry inclusive bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub name: String,
    pub value: ControlValue,
    pub min: f32,
    pub max: f32,
    pub step: Option<f32>,
}

/// Values edited through the debug panel and read by the frame loop.
///
/// Numeric writes are clamped into the declared bounds, so readers always
/// see an in-range value. Each write marks the control pending until the
/// frame loop takes it.
#[derive(Debug, Clone, Default)]
pub struct ControlPanelState {
    controls: Vec<Control>,
    pending: BTreeSet<String>,
}

impl ControlPanelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a numeric control. Swapped bounds are
    /// reordered and the initial value is clamped. A NaN bound leaves that
    /// side open.
    pub fn add_number(&mut self, name: &str, value: f32, min: f32, max: f32) -> &mut Self {
        let min = if min.is_nan() { f32::MIN } else { min };
        let max = if max.is_nan() { f32::MAX } else { max };
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let value = if value.is_nan() { min } else { value.clamp(min, max) };
        self.insert(Control {
            name: name.to_string(),
            value: ControlValue::Number(value),
            min,
            max,
            step: None,
        })
    }

    pub fn add_toggle(&mut self, name: &str, value: bool) -> &mut Self {
        self.insert(Control {
            name: name.to_string(),
            value: ControlValue::Toggle(value),
            min: 0.0,
            max: 0.0,
            step: None,
        })
    }

    pub fn add_color(&mut self, name: &str, value: Color) -> &mut Self {
        self.insert(Control {
            name: name.to_string(),
            value: ControlValue::Color(value),
            min: 0.0,
            max: 0.0,
            step: None,
        })
    }

    /// Sets the UI step of an already registered numeric control
    pub fn with_step(&mut self, name: &str, step: f32) -> &mut Self {
        if let Some(control) = self.controls.iter_mut().find(|c| c.name == name) {
            control.step = Some(step);
        }
        self
    }

    fn insert(&mut self, control: Control) -> &mut Self {
        match self.controls.iter_mut().find(|c| c.name == control.name) {
            Some(existing) => *existing = control,
            None => self.controls.push(control),
        }
        self
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Writes a value, returning what was actually stored.
    ///
    /// Numbers are clamped into bounds; NaN leaves the previous value in
    /// place. The kind of a control never changes.
    pub fn set(&mut self, name: &str, value: ControlValue) -> Result<ControlValue, FrameMutationError> {
        let control = self
            .controls
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| FrameMutationError::UnknownControl(name.to_string()))?;

        let stored = match (control.value, value) {
            (ControlValue::Number(previous), ControlValue::Number(v)) => {
                ControlValue::Number(if v.is_nan() { previous } else { v.clamp(control.min, control.max) })
            }
            (ControlValue::Toggle(_), ControlValue::Toggle(_)) | (ControlValue::Color(_), ControlValue::Color(_)) => value,
            (current, _) => {
                return Err(FrameMutationError::ControlType {
                    name: name.to_string(),
                    expected: current.kind_name(),
                    found: value.kind_name(),
                })
            }
        };

        control.value = stored;
        self.pending.insert(name.to_string());
        Ok(stored)
    }

    pub fn value(&self, name: &str) -> Result<ControlValue, FrameMutationError> {
        self.controls
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
            .ok_or_else(|| FrameMutationError::UnknownControl(name.to_string()))
    }

    pub fn number(&self, name: &str) -> Result<f32, FrameMutationError> {
        match self.value(name)? {
            ControlValue::Number(v) => Ok(v),
            other => Err(Self::mismatch(name, "number", other)),
        }
    }

    pub fn toggle(&self, name: &str) -> Result<bool, FrameMutationError> {
        match self.value(name)? {
            ControlValue::Toggle(v) => Ok(v),
            other => Err(Self::mismatch(name, "toggle", other)),
        }
    }

    pub fn color(&self, name: &str) -> Result<Color, FrameMutationError> {
        match self.value(name)? {
            ControlValue::Color(v) => Ok(v),
            other => Err(Self::mismatch(name, "color", other)),
        }
    }

    fn mismatch(name: &str, expected: &'static str, found: ControlValue) -> FrameMutationError {
        FrameMutationError::ControlType {
            name: name.to_string(),
            expected,
            found: found.kind_name(),
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drains the names written since the last call, in name order
    pub fn take_pending(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    pub fn mark_all_pending(&mut self) {
        self.pending.extend(self.controls.iter().map(|c| c.name.clone()));
    }
}
