//! Prims: nodes of the stage's namespace tree.
//!
//! Prim data lives in the stage's arena. [`Prim`] is a shared read view and
//! [`PrimMut`] an exclusive authoring view; both are cheap handles that
//! borrow the stage.

use std::fmt;

use crate::core::{MetaData, Path, TimeCode, Value};
use crate::util::{Error, Result};

use super::attribute::Attribute;
use super::stage::Stage;
use super::traverse::Traverse;

/// Stable identifier of a prim within one stage.
///
/// Handles are generational: once a prim is removed its handle never
/// resolves again, even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Arena-resident prim node.
#[derive(Debug, Clone)]
pub(crate) struct PrimData {
    pub(crate) path: Path,
    pub(crate) type_name: String,
    pub(crate) parent: Option<PrimHandle>,
    pub(crate) children: Vec<PrimHandle>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) metadata: MetaData,
    pub(crate) active: bool,
}

impl PrimData {
    pub(crate) fn new(path: Path, type_name: &str, parent: Option<PrimHandle>) -> Self {
        Self {
            path,
            type_name: type_name.to_string(),
            parent,
            children: Vec::new(),
            attributes: Vec::new(),
            metadata: MetaData::new(),
            active: true,
        }
    }

    pub(crate) fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }

    fn attribute_position(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name() == name)
    }
}

// ============================================================================
// Prim (read view)
// ============================================================================

/// Read-only view of a prim on a stage.
#[derive(Clone, Copy)]
pub struct Prim<'a> {
    stage: &'a Stage,
    handle: PrimHandle,
    data: &'a PrimData,
}

impl<'a> Prim<'a> {
    pub(crate) fn new(stage: &'a Stage, handle: PrimHandle, data: &'a PrimData) -> Self {
        Self { stage, handle, data }
    }

    pub fn handle(&self) -> PrimHandle {
        self.handle
    }

    /// The stage this prim belongs to.
    pub fn stage(&self) -> &'a Stage {
        self.stage
    }

    /// Absolute path of this prim.
    pub fn path(&self) -> &'a Path {
        &self.data.path
    }

    /// Prim name ("" for the pseudo-root).
    pub fn name(&self) -> &'a str {
        self.data.path.name()
    }

    /// Schema type token ("" when untyped).
    pub fn type_name(&self) -> &'a str {
        &self.data.type_name
    }

    /// Returns true if this prim has the given type token.
    pub fn is_a(&self, type_name: &str) -> bool {
        !type_name.is_empty() && self.data.type_name == type_name
    }

    pub fn is_typed(&self) -> bool {
        !self.data.type_name.is_empty()
    }

    pub fn is_pseudo_root(&self) -> bool {
        self.data.parent.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.data.active
    }

    pub fn metadata(&self) -> &'a MetaData {
        &self.data.metadata
    }

    /// Parent prim; `None` for the pseudo-root.
    pub fn parent(&self) -> Option<Prim<'a>> {
        self.data.parent.and_then(|h| self.stage.prim(h))
    }

    /// Direct children in insertion order.
    pub fn children(&self) -> impl Iterator<Item = Prim<'a>> + 'a {
        let stage = self.stage;
        self.data.children.iter().filter_map(move |&h| stage.prim(h))
    }

    /// Look up a direct child by name.
    pub fn child(&self, name: &str) -> Option<Prim<'a>> {
        let path = self.data.path.append_child(name).ok()?;
        self.stage.prim_at_path(&path)
    }

    pub fn num_children(&self) -> usize {
        self.data.children.len()
    }

    pub fn has_children(&self) -> bool {
        !self.data.children.is_empty()
    }

    /// All descendants, depth-first, parents before children. Excludes
    /// this prim.
    pub fn descendants(&self) -> Traverse<'a> {
        Traverse::below(self.stage, self.handle)
    }

    /// Attributes in creation order.
    pub fn attributes(&self) -> impl Iterator<Item = &'a Attribute> + 'a {
        self.data.attributes.iter()
    }

    pub fn attribute(&self, name: &str) -> Option<&'a Attribute> {
        self.data.attribute(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.data.attribute(name).is_some()
    }

    pub fn num_attributes(&self) -> usize {
        self.data.attributes.len()
    }

    /// Resolve an attribute at `time` using the stage's interpolation setting.
    pub fn attribute_value_at(&self, name: &str, time: impl Into<TimeCode>) -> Option<Value> {
        self.data
            .attribute(name)?
            .get_at(time)
    }
}

impl fmt::Debug for Prim<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prim")
            .field("path", &self.data.path)
            .field("type_name", &self.data.type_name)
            .finish()
    }
}

impl PartialEq for Prim<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.stage, other.stage) && self.handle == other.handle
    }
}

// ============================================================================
// PrimMut (authoring view)
// ============================================================================

/// Exclusive authoring view of a prim.
///
/// Holds the stage mutably, so at most one exists at a time. Only
/// operations that keep the prim itself alive are exposed; use
/// [`into_stage`](Self::into_stage) to give up the view for anything else.
pub struct PrimMut<'a> {
    stage: &'a mut Stage,
    handle: PrimHandle,
}

impl<'a> PrimMut<'a> {
    pub(crate) fn new(stage: &'a mut Stage, handle: PrimHandle) -> Self {
        Self { stage, handle }
    }

    fn data(&self) -> &PrimData {
        self.stage
            .node(self.handle)
            .expect("PrimMut always refers to a live prim")
    }

    fn data_mut(&mut self) -> &mut PrimData {
        self.stage
            .node_mut(self.handle)
            .expect("PrimMut always refers to a live prim")
    }

    pub fn handle(&self) -> PrimHandle {
        self.handle
    }

    /// Read view of the same prim.
    pub fn as_prim(&self) -> Prim<'_> {
        Prim::new(&*self.stage, self.handle, self.data())
    }

    pub fn path(&self) -> &Path {
        &self.data().path
    }

    pub fn name(&self) -> &str {
        self.data().path.name()
    }

    pub fn type_name(&self) -> &str {
        &self.data().type_name
    }

    pub fn stage(&self) -> &Stage {
        &*self.stage
    }

    /// End the view and hand the stage back for arbitrary edits.
    pub fn into_stage(self) -> &'a mut Stage {
        self.stage
    }

    /// Get or create the child `name` with define semantics.
    ///
    /// Same rules as [`Stage::define_prim`] for the last path element.
    pub fn define_child(&mut self, name: &str, type_name: &str) -> Result<PrimMut<'_>> {
        let child = self.stage.define_child(self.handle, name, type_name)?;
        Ok(PrimMut::new(self.stage, child))
    }

    /// Remove the child `name` and its whole subtree.
    pub fn remove_child(&mut self, name: &str) -> Result<()> {
        self.stage.remove_child(self.handle, name)
    }

    /// Get or create an attribute.
    ///
    /// Creating an attribute that already exists with the same value type
    /// returns the existing one. A different type fails with
    /// [`Error::AttributeTypeConflict`]; the existing attribute is untouched.
    pub fn create_attribute(&mut self, name: &str, type_name: &str) -> Result<&mut Attribute> {
        let path = self.data().path.append_property(name)?;
        let value_type = self.stage.registry().resolve(type_name)?;
        let interpolation = self.stage.settings().interpolation;

        let data = self.data_mut();
        if let Some(pos) = data.attribute_position(name) {
            let existing = &data.attributes[pos];
            if existing.type_name() != value_type.name() {
                return Err(Error::AttributeTypeConflict {
                    path: path.to_string(),
                    existing: existing.type_name().to_string(),
                    requested: value_type.name().to_string(),
                });
            }
            return Ok(&mut data.attributes[pos]);
        }

        tracing::debug!(path = %path, value_type = value_type.name(), "created attribute");
        let pos = data.attributes.len();
        data.attributes.push(Attribute::new(path, value_type, interpolation));
        Ok(&mut data.attributes[pos])
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.data().attribute(name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        let data = self.data_mut();
        let pos = data.attribute_position(name)?;
        Some(&mut data.attributes[pos])
    }

    /// Remove an attribute, returning it.
    pub fn remove_attribute(&mut self, name: &str) -> Result<Attribute> {
        let data = self.data_mut();
        let pos = data
            .attribute_position(name)
            .ok_or_else(|| Error::not_found(format!("attribute '{}' on <{}>", name, data.path)))?;
        let removed = data.attributes.remove(pos);
        tracing::debug!(path = %removed.path(), "removed attribute");
        Ok(removed)
    }

    pub fn set_active(&mut self, active: bool) {
        self.data_mut().active = active;
    }

    pub fn metadata_mut(&mut self) -> &mut MetaData {
        &mut self.data_mut().metadata
    }
}

impl fmt::Debug for PrimMut<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimMut")
            .field("path", self.path())
            .field("type_name", &self.type_name())
            .finish()
    }
}
