//! Layer-level metadata of a stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::StageDefaults;
use crate::core::Value;

/// Which axis points up in the scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpAxis {
    #[default]
    Y,
    Z,
}

impl UpAxis {
    pub fn as_str(self) -> &'static str {
        match self {
            UpAxis::Y => "Y",
            UpAxis::Z => "Z",
        }
    }
}

impl fmt::Display for UpAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage metadata.
///
/// Read freely through [`Stage::metadata`](crate::Stage::metadata); authored
/// through the validating setters on [`Stage`](crate::Stage).
#[derive(Debug, Clone, PartialEq)]
pub struct StageMetadata {
    pub doc: Option<String>,
    pub comment: Option<String>,
    pub up_axis: UpAxis,
    pub meters_per_unit: f64,
    pub time_codes_per_second: f64,
    pub start_time_code: Option<f64>,
    pub end_time_code: Option<f64>,
    /// Name of a root prim.
    pub default_prim: Option<String>,
    pub custom_layer_data: BTreeMap<String, Value>,
}

impl StageMetadata {
    pub(crate) fn from_defaults(defaults: &StageDefaults) -> Self {
        Self {
            doc: None,
            comment: None,
            up_axis: defaults.up_axis,
            meters_per_unit: defaults.meters_per_unit,
            time_codes_per_second: defaults.time_codes_per_second,
            start_time_code: None,
            end_time_code: None,
            default_prim: None,
            custom_layer_data: BTreeMap::new(),
        }
    }

    /// Authored time range, if both ends are set.
    pub fn time_code_range(&self) -> Option<(f64, f64)> {
        Some((self.start_time_code?, self.end_time_code?))
    }

    /// Duration of the authored range in seconds.
    pub fn duration_seconds(&self) -> Option<f64> {
        let (start, end) = self.time_code_range()?;
        Some((end - start) / self.time_codes_per_second)
    }
}

impl Default for StageMetadata {
    fn default() -> Self {
        Self::from_defaults(&StageDefaults::default())
    }
}
