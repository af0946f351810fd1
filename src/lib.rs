//! # usd-scene
//!
//! In-memory scene description core in the style of USD: a stage holding a
//! tree of prims, each with typed, time-sampled attributes addressed by
//! canonical paths.
//!
//! Serialization is left to external writers, which receive an owned
//! [`usd::LayerSnapshot`] through the [`usd::LayerSink`] trait.
//!
//! ## Modules
//!
//! - [`util`] - Errors and identifier rules
//! - [`core`] - Paths, values, the value type registry and time samples
//! - [`usd`] - Stage, prims and attributes
//! - [`geom`] - Schemas (Xform)
//! - [`config`] - Stage settings
//! - [`logging`] - Tracing subscriber setup
//!
//! ## Example
//!
//! ```ignore
//! use usd_scene::prelude::*;
//!
//! let mut stage = Stage::create_new("hello.usda")?;
//! let mut xform = Xform::define(&mut stage, "/hello")?;
//! xform.create_attribute("test", "Int")?.set(1)?;
//!
//! assert!(stage.prim_at_path("/hello").is_some());
//! stage.remove_prim_at_path("/hello")?;
//! assert!(stage.prim_at_path("/hello").is_none());
//! ```

pub mod util;
pub mod core;
pub mod usd;
pub mod geom;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use crate::util::{Error, Result};
pub use crate::core::{Path, Value, ValueType, ValueTypeRegistry};
pub use crate::usd::{Attribute, Prim, PrimHandle, PrimMut, SharedStage, Stage};
pub use crate::config::Settings;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::core::{
        AssetPath, Interpolation, Path, ScalarType, TimeCode, Value, ValueType, ValueTypeRegistry,
    };
    pub use crate::usd::{
        Attribute, LayerSink, LayerSnapshot, Prim, PrimHandle, PrimMut, SharedStage, Stage,
        UpAxis,
    };
    pub use crate::config::{Settings, TypeConflictPolicy};
    pub use crate::geom::*;
}
