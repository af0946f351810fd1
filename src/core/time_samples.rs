//! Time-sampled attribute data.
//!
//! Attributes may carry values authored at specific time codes. Resolving a
//! value between two samples either holds the earlier sample or linearly
//! interpolates, depending on [`Interpolation`]. Outside the authored range
//! the first or last sample is held.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use super::Value;

/// A point on the stage timeline.
///
/// Totally ordered so it can key ordered maps. `-0.0` is stored as `0.0`.
/// Non-finite time codes are rejected at the authoring boundary.
#[derive(Clone, Copy, Default)]
pub struct TimeCode(f64);

impl TimeCode {
    #[inline]
    pub fn new(time: f64) -> Self {
        // Adding +0.0 folds -0.0 into 0.0 and leaves everything else alone
        Self(time + 0.0)
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl From<f64> for TimeCode {
    fn from(time: f64) -> Self {
        Self::new(time)
    }
}

impl PartialEq for TimeCode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TimeCode {}

impl PartialOrd for TimeCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Debug for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeCode({})", self.0)
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How values between two samples are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpolation {
    /// Hold the earlier sample.
    Held,
    /// Linearly interpolate interpolatable kinds; hold everything else.
    #[default]
    Linear,
}

/// Ordered time code → value map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeSamples {
    samples: BTreeMap<TimeCode, Value>,
}

impl TimeSamples {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the sample at `time`.
    pub fn insert(&mut self, time: TimeCode, value: Value) -> Option<Value> {
        self.samples.insert(time, value)
    }

    /// Remove the sample at `time`.
    pub fn remove(&mut self, time: TimeCode) -> Option<Value> {
        self.samples.remove(&time)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// The sample authored exactly at `time`.
    pub fn get(&self, time: TimeCode) -> Option<&Value> {
        self.samples.get(&time)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Authored times in increasing order.
    pub fn times(&self) -> impl Iterator<Item = TimeCode> + '_ {
        self.samples.keys().copied()
    }

    /// Samples in increasing time order.
    pub fn iter(&self) -> impl Iterator<Item = (TimeCode, &Value)> {
        self.samples.iter().map(|(t, v)| (*t, v))
    }

    /// The samples surrounding `time`.
    ///
    /// Returns `(t, t)` for an exact hit, the first (last) sample twice when
    /// `time` is before (after) the authored range, and `None` when empty.
    pub fn bracketing(&self, time: TimeCode) -> Option<(TimeCode, TimeCode)> {
        let lower = self.samples.range(..=time).next_back().map(|(t, _)| *t);
        let upper = self.samples.range(time..).next().map(|(t, _)| *t);
        match (lower, upper) {
            (Some(lo), Some(hi)) => Some((lo, hi)),
            (Some(lo), None) => Some((lo, lo)),
            (None, Some(hi)) => Some((hi, hi)),
            (None, None) => None,
        }
    }

    /// Resolve the value at `time`.
    pub fn resolve(&self, time: TimeCode, interpolation: Interpolation) -> Option<Value> {
        let (lo, hi) = self.bracketing(time)?;
        let lo_value = self.samples.get(&lo)?;
        if lo == hi || interpolation == Interpolation::Held {
            return Some(lo_value.clone());
        }

        let hi_value = self.samples.get(&hi)?;
        let alpha = (time.value() - lo.value()) / (hi.value() - lo.value());
        Some(
            lo_value
                .lerp(hi_value, alpha)
                .unwrap_or_else(|| lo_value.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> TimeSamples {
        let mut ts = TimeSamples::new();
        ts.insert(TimeCode::new(1.0), Value::Double(10.0));
        ts.insert(TimeCode::new(3.0), Value::Double(30.0));
        ts.insert(TimeCode::new(2.0), Value::Double(20.0));
        ts
    }

    #[test]
    fn test_times_are_ordered() {
        let times: Vec<f64> = samples().times().map(TimeCode::value).collect();
        assert_eq!(times, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_bracketing() {
        let ts = samples();
        let b = |t: f64| ts.bracketing(TimeCode::new(t)).map(|(a, b)| (a.value(), b.value()));
        assert_eq!(b(0.0), Some((1.0, 1.0)));
        assert_eq!(b(1.5), Some((1.0, 2.0)));
        assert_eq!(b(2.0), Some((2.0, 2.0)));
        assert_eq!(b(9.0), Some((3.0, 3.0)));
        assert_eq!(TimeSamples::new().bracketing(TimeCode::new(1.0)), None);
    }

    #[test]
    fn test_resolve_held_and_linear() {
        let ts = samples();
        assert_eq!(
            ts.resolve(TimeCode::new(1.5), Interpolation::Held),
            Some(Value::Double(10.0))
        );
        assert_eq!(
            ts.resolve(TimeCode::new(1.5), Interpolation::Linear),
            Some(Value::Double(15.0))
        );
        // Clamped outside the authored range
        assert_eq!(
            ts.resolve(TimeCode::new(-5.0), Interpolation::Linear),
            Some(Value::Double(10.0))
        );
        assert_eq!(
            ts.resolve(TimeCode::new(50.0), Interpolation::Linear),
            Some(Value::Double(30.0))
        );
    }

    #[test]
    fn test_linear_falls_back_to_held() {
        let mut ts = TimeSamples::new();
        ts.insert(TimeCode::new(0.0), Value::Int(0));
        ts.insert(TimeCode::new(10.0), Value::Int(100));
        assert_eq!(
            ts.resolve(TimeCode::new(5.0), Interpolation::Linear),
            Some(Value::Int(0))
        );
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let mut ts = TimeSamples::new();
        ts.insert(TimeCode::new(0.0), Value::Double(1.0));
        ts.insert(TimeCode::from(-0.0), Value::Double(2.0));
        assert_eq!(ts.len(), 1);
        assert_eq!(ts.get(TimeCode::new(0.0)), Some(&Value::Double(2.0)));
        assert!(TimeCode::new(-0.0).value().is_sign_positive());
    }

    #[test]
    fn test_replace_and_remove() {
        let mut ts = samples();
        assert_eq!(
            ts.insert(TimeCode::new(2.0), Value::Double(25.0)),
            Some(Value::Double(20.0))
        );
        assert_eq!(ts.len(), 3);
        assert_eq!(ts.remove(TimeCode::new(2.0)), Some(Value::Double(25.0)));
        assert_eq!(ts.get(TimeCode::new(2.0)), None);
        assert_eq!(ts.len(), 2);
    }
}
