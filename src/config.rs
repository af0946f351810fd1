//! Stage settings.
//!
//! Settings are plain serde structs persisted as JSON. Missing fields fall
//! back to their defaults, so partial files are valid.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::Interpolation;
use crate::usd::UpAxis;
use crate::util::Result;

/// What `define` does when a prim already exists with a different type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeConflictPolicy {
    /// Fail with `TypeConflict`.
    #[default]
    Error,
    /// Retype the existing prim and log a warning.
    Override,
}

/// Metadata applied to every new stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageDefaults {
    pub up_axis: UpAxis,
    pub meters_per_unit: f64,
    pub time_codes_per_second: f64,
}

impl Default for StageDefaults {
    fn default() -> Self {
        Self {
            up_axis: UpAxis::Y,
            meters_per_unit: 0.01,
            time_codes_per_second: 24.0,
        }
    }
}

/// Behavior switches for a stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub type_conflict_policy: TypeConflictPolicy,
    pub interpolation: Interpolation,
    pub stage_defaults: StageDefaults,
}

impl Settings {
    /// Parse settings from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Serialize settings to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults if the file is missing or
    /// malformed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "using default settings");
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    // Non-positive scales are meaningless; reset them.
    fn sanitized(mut self) -> Self {
        let defaults = StageDefaults::default();
        if !(self.stage_defaults.meters_per_unit > 0.0) {
            self.stage_defaults.meters_per_unit = defaults.meters_per_unit;
        }
        if !(self.stage_defaults.time_codes_per_second > 0.0) {
            self.stage_defaults.time_codes_per_second = defaults.time_codes_per_second;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.type_conflict_policy, TypeConflictPolicy::Error);
        assert_eq!(s.interpolation, Interpolation::Linear);
        assert_eq!(s.stage_defaults.up_axis, UpAxis::Y);
        assert_eq!(s.stage_defaults.time_codes_per_second, 24.0);
    }

    #[test]
    fn test_partial_json() {
        let s = Settings::from_json(r#"{ "type_conflict_policy": "Override" }"#).unwrap();
        assert_eq!(s.type_conflict_policy, TypeConflictPolicy::Override);
        assert_eq!(s.interpolation, Interpolation::Linear);

        let s = Settings::from_json(r#"{ "stage_defaults": { "up_axis": "Z" } }"#).unwrap();
        assert_eq!(s.stage_defaults.up_axis, UpAxis::Z);
        assert_eq!(s.stage_defaults.meters_per_unit, 0.01);
    }

    #[test]
    fn test_sanitize() {
        let s = Settings::from_json(
            r#"{ "stage_defaults": { "meters_per_unit": 0.0, "time_codes_per_second": -1.0 } }"#,
        )
        .unwrap();
        assert_eq!(s.stage_defaults, StageDefaults::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut s = Settings::default();
        s.interpolation = Interpolation::Held;
        let parsed = Settings::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(parsed, s);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            Settings::from_json("not json"),
            Err(crate::Error::Json(_))
        ));
    }
}
