//! Attributes: typed, named value slots owned by a prim.

use std::sync::Arc;

use crate::core::{
    FromValue, Interpolation, MetaData, Path, TimeCode, TimeSamples, Value, ValueType,
};
use crate::util::{Error, Result};

/// A typed value slot on a prim.
///
/// Holds an optional default value and optional time samples. Every stored
/// value has passed the attribute's [`ValueType`] validator. Attributes are
/// only reachable mutably through their owning stage.
#[derive(Clone, Debug)]
pub struct Attribute {
    path: Path,
    value_type: Arc<ValueType>,
    default: Option<Value>,
    samples: TimeSamples,
    interpolation: Interpolation,
    metadata: MetaData,
}

impl Attribute {
    pub(crate) fn new(path: Path, value_type: Arc<ValueType>, interpolation: Interpolation) -> Self {
        Self {
            path,
            value_type,
            default: None,
            samples: TimeSamples::new(),
            interpolation,
            metadata: MetaData::new(),
        }
    }

    /// Attribute name (unique within its prim).
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Property path, e.g. `/hello.test`.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the owning prim.
    pub fn prim_path(&self) -> Path {
        self.path.prim_path()
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Name of the declared value type, e.g. "Int".
    pub fn type_name(&self) -> &str {
        self.value_type.name()
    }

    pub fn metadata(&self) -> &MetaData {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut MetaData {
        &mut self.metadata
    }

    /// Returns true if a default or any time sample is authored.
    pub fn has_value(&self) -> bool {
        self.default.is_some() || !self.samples.is_empty()
    }

    pub fn has_authored_default(&self) -> bool {
        self.default.is_some()
    }

    /// The authored default value.
    pub fn get(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The authored default value as a Rust type.
    pub fn get_as<T: FromValue>(&self) -> Option<T> {
        self.default.as_ref().and_then(Value::get)
    }

    /// The authored default, or the value type's fallback when unauthored.
    pub fn get_or_fallback(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.value_type.default_value())
    }

    /// Interpolation used by [`get_at`](Self::get_at), taken from the
    /// owning stage's settings.
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Resolve the value at `time` with the stage's interpolation.
    ///
    /// Time samples win over the default; with no samples the default is
    /// returned.
    pub fn get_at(&self, time: impl Into<TimeCode>) -> Option<Value> {
        self.get_at_with(time, self.interpolation)
    }

    /// Resolve the value at `time` with the given interpolation.
    pub fn get_at_with(&self, time: impl Into<TimeCode>, interpolation: Interpolation) -> Option<Value> {
        if self.samples.is_empty() {
            return self.default.clone();
        }
        self.samples.resolve(time.into(), interpolation)
    }

    pub fn time_samples(&self) -> &TimeSamples {
        &self.samples
    }

    pub fn num_time_samples(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if more than one time sample is authored.
    pub fn might_be_time_varying(&self) -> bool {
        self.samples.len() > 1
    }

    /// Sample times surrounding `time`; see [`TimeSamples::bracketing`].
    pub fn bracketing_time_samples(&self, time: impl Into<TimeCode>) -> Option<(TimeCode, TimeCode)> {
        self.samples.bracketing(time.into())
    }

    /// Author the default value.
    pub fn set(&mut self, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        self.value_type.validate(&value)?;
        self.default = Some(value);
        Ok(())
    }

    /// Author a time sample.
    pub fn set_at(&mut self, time: impl Into<TimeCode>, value: impl Into<Value>) -> Result<()> {
        let time = time.into();
        if !time.is_finite() {
            return Err(Error::invalid_value(
                "TimeCode",
                format!("time code must be finite, got {}", time),
            ));
        }
        let value = value.into();
        self.value_type.validate(&value)?;
        self.samples.insert(time, value);
        Ok(())
    }

    /// Remove the authored default. Returns the previous value.
    pub fn clear_default(&mut self) -> Option<Value> {
        self.default.take()
    }

    /// Remove the sample at `time`. Returns the previous value.
    pub fn clear_at(&mut self, time: impl Into<TimeCode>) -> Option<Value> {
        self.samples.remove(time.into())
    }

    /// Remove the default and all time samples.
    pub fn clear(&mut self) {
        self.default = None;
        self.samples.clear();
    }
}
