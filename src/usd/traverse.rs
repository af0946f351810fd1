//! Stage traversal and queries.

use std::ops::ControlFlow;

use crate::core::IntoPath;
use crate::util::{Error, Result};

use super::attribute::Attribute;
use super::prim::{Prim, PrimHandle};
use super::stage::Stage;

/// Depth-first, pre-order iterator over prims.
///
/// Parents come before their children and siblings keep insertion order.
pub struct Traverse<'a> {
    stage: &'a Stage,
    stack: Vec<PrimHandle>,
}

impl<'a> Traverse<'a> {
    /// Iterate the descendants of `handle`, excluding `handle` itself.
    pub(crate) fn below(stage: &'a Stage, handle: PrimHandle) -> Self {
        let stack = stage
            .node(handle)
            .map(|data| data.children.iter().rev().copied().collect())
            .unwrap_or_default();
        Self { stage, stack }
    }
}

impl<'a> Iterator for Traverse<'a> {
    type Item = Prim<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(handle) = self.stack.pop() {
            let Some(data) = self.stage.node(handle) else { continue };
            self.stack.extend(data.children.iter().rev().copied());
            return Some(Prim::new(self.stage, handle, data));
        }
        None
    }
}

impl Stage {
    /// Every prim on the stage, depth-first. Excludes the pseudo-root.
    pub fn traverse(&self) -> Traverse<'_> {
        Traverse::below(self, self.root_handle())
    }

    /// Visit every prim depth-first with its nesting level (0 for root
    /// prims). Returning `ControlFlow::Break` stops the walk.
    pub fn visit_prims<F>(&self, mut visitor: F) -> ControlFlow<()>
    where
        F: FnMut(Prim<'_>, usize) -> ControlFlow<()>,
    {
        let mut stack: Vec<(PrimHandle, usize)> = self
            .pseudo_root()
            .children()
            .map(|p| (p.handle(), 0))
            .collect();
        stack.reverse();

        while let Some((handle, level)) = stack.pop() {
            let Some(prim) = self.prim(handle) else { continue };
            visitor(prim, level)?;
            let first = stack.len();
            stack.extend(prim.children().map(|c| (c.handle(), level + 1)));
            stack[first..].reverse();
        }
        ControlFlow::Continue(())
    }

    /// Direct children of the pseudo-root.
    pub fn root_prims(&self) -> impl Iterator<Item = Prim<'_>> + '_ {
        self.pseudo_root().children()
    }

    /// All prims with the given type token, in traversal order.
    pub fn prims_of_type(&self, type_name: &str) -> Vec<Prim<'_>> {
        self.traverse().filter(|p| p.is_a(type_name)).collect()
    }

    /// Parent of the prim at `path`.
    ///
    /// Root prims have no parent prim (the pseudo-root is not one), so they
    /// fail with [`Error::NotFound`] like the pseudo-root and missing paths.
    pub fn parent_prim(&self, path: impl IntoPath) -> Result<Prim<'_>> {
        let path = path.into_path()?;
        let prim = self
            .prim_at_path(&path)
            .ok_or_else(|| Error::not_found(format!("prim <{}>", path)))?;
        prim.parent()
            .filter(|parent| !parent.is_pseudo_root())
            .ok_or_else(|| Error::not_found(format!("parent prim of <{}>", path)))
    }

    /// Look up an attribute by property path, e.g. `/hello.test`.
    pub fn attribute_at_path(&self, path: impl IntoPath) -> Option<&Attribute> {
        let path = path.into_path().ok()?;
        let name = path.property_name()?;
        self.prim_at_path(path.prim_path())?.attribute(name)
    }

    pub fn attribute_at_path_mut(&mut self, path: impl IntoPath) -> Option<&mut Attribute> {
        let path = path.into_path().ok()?;
        let name = path.property_name()?;
        let handle = self.handle_at_path(path.prim_path())?;
        self.node_mut(handle)?
            .attributes
            .iter_mut()
            .find(|a| a.name() == name)
    }
}
