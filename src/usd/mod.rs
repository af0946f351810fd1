//! Scene layer - stage, prims and attributes.
//!
//! This module provides:
//! - [`Stage`] - Root container and sole mutation point
//! - [`Prim`] / [`PrimMut`] - Read and authoring views of prims
//! - [`Attribute`] - Typed value slots with time samples
//! - [`SharedStage`] - A stage shared across threads
//! - [`LayerSnapshot`] / [`LayerSink`] - The persistence boundary

mod attribute;
mod prim;
mod shared;
mod snapshot;
mod stage;
mod stage_metadata;
mod traverse;

pub use attribute::Attribute;
pub use prim::{Prim, PrimHandle, PrimMut};
pub use shared::SharedStage;
pub use snapshot::{AttributeSnapshot, LayerSink, LayerSnapshot, PrimSnapshot};
pub use stage::Stage;
pub use stage_metadata::{StageMetadata, UpAxis};
pub use traverse::Traverse;
