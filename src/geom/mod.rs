//! Geometry schemas.
//!
//! This module provides typed schemas layered over plain prims:
//! - [`Xform`] - Transform nodes with an ordered op stack

pub mod xform;

pub use xform::{
    local_transform, world_transform, Xform, XformOpType, XFORM_OP_ORDER, XFORM_TYPE,
};
