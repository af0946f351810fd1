//! Core layer - scene description value types.
//!
//! This module provides:
//! - [`Path`] - Hierarchical addresses for prims and properties
//! - [`Value`] / [`ScalarType`] - Typed attribute values
//! - [`ValueType`] / [`ValueTypeRegistry`] - The value type catalog
//! - [`TimeSamples`] / [`TimeCode`] - Time-sampled data
//! - [`MetaData`] - Key-value metadata storage

mod path;
mod value;
mod value_type;
mod time_samples;
mod metadata;

pub use path::{IntoPath, Path, PATH_SEPARATOR, PROPERTY_DELIMITER};
pub use value::{AssetPath, FromValue, ScalarType, Value};
pub use value_type::{DefaultFactory, Validator, ValueType, ValueTypeRegistry};
pub use time_samples::{Interpolation, TimeCode, TimeSamples};
pub use metadata::MetaData;
