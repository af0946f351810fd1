//! Persistence boundary.
//!
//! A [`LayerSnapshot`] is a self-contained, owned copy of a stage's layer
//! content. Serializers implement [`LayerSink`] and never see the live stage.

use crate::core::{MetaData, Path, TimeCode, Value};
use crate::util::Result;

use super::attribute::Attribute;
use super::prim::Prim;
use super::stage::Stage;
use super::stage_metadata::StageMetadata;

/// Owned copy of one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSnapshot {
    pub name: String,
    /// Canonical value type name, e.g. "Int".
    pub type_name: String,
    pub default: Option<Value>,
    /// Samples in ascending time order.
    pub time_samples: Vec<(TimeCode, Value)>,
    pub metadata: MetaData,
}

impl AttributeSnapshot {
    fn capture(attr: &Attribute) -> Self {
        Self {
            name: attr.name().to_string(),
            type_name: attr.type_name().to_string(),
            default: attr.get().cloned(),
            time_samples: attr
                .time_samples()
                .iter()
                .map(|(t, v)| (t, v.clone()))
                .collect(),
            metadata: attr.metadata().clone(),
        }
    }
}

/// Owned copy of one prim, without its children.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimSnapshot {
    pub path: Path,
    pub type_name: String,
    pub active: bool,
    pub metadata: MetaData,
    pub attributes: Vec<AttributeSnapshot>,
}

impl PrimSnapshot {
    fn capture(prim: &Prim<'_>) -> Self {
        Self {
            path: prim.path().clone(),
            type_name: prim.type_name().to_string(),
            active: prim.is_active(),
            metadata: prim.metadata().clone(),
            attributes: prim.attributes().map(AttributeSnapshot::capture).collect(),
        }
    }
}

/// Owned copy of a whole stage.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSnapshot {
    pub identity: String,
    pub metadata: StageMetadata,
    /// Every prim, depth-first with parents first. Excludes the pseudo-root.
    pub prims: Vec<PrimSnapshot>,
}

impl LayerSnapshot {
    pub fn find(&self, path: &Path) -> Option<&PrimSnapshot> {
        self.prims.iter().find(|p| &p.path == path)
    }

    /// Total number of attributes over all prims.
    pub fn num_attributes(&self) -> usize {
        self.prims.iter().map(|p| p.attributes.len()).sum()
    }
}

/// Consumer of stage content, e.g. a text or binary layer writer.
pub trait LayerSink {
    /// Persist one layer.
    fn write_layer(&mut self, layer: &LayerSnapshot) -> Result<()>;
}

impl Stage {
    /// Capture the stage content.
    pub fn snapshot(&self) -> LayerSnapshot {
        LayerSnapshot {
            identity: self.identity().to_string(),
            metadata: self.metadata().clone(),
            prims: self.traverse().map(|p| PrimSnapshot::capture(&p)).collect(),
        }
    }

    /// Hand a snapshot of the stage to `sink`.
    pub fn export_to(&self, sink: &mut dyn LayerSink) -> Result<()> {
        let snapshot = self.snapshot();
        tracing::debug!(
            identity = %snapshot.identity,
            prims = snapshot.prims.len(),
            "exporting layer"
        );
        sink.write_layer(&snapshot)
    }
}
