//! The stage: root container of one in-memory scene.
//!
//! A stage owns every prim in a generational arena plus a path index, and is
//! the only place the tree is mutated. Index and tree are updated together in
//! each operation, so a lookup by path always agrees with the hierarchy.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::config::{Settings, TypeConflictPolicy};
use crate::core::{IntoPath, Path, Value, ValueTypeRegistry};
use crate::util::{is_valid_layer_identity, Error, Result};

use super::prim::{Prim, PrimData, PrimHandle, PrimMut};
use super::stage_metadata::{StageMetadata, UpAxis};

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    data: Option<PrimData>,
}

/// In-memory scene: a prim hierarchy rooted at the pseudo-root `/`.
#[derive(Clone)]
pub struct Stage {
    identity: String,
    registry: Arc<ValueTypeRegistry>,
    settings: Settings,
    metadata: StageMetadata,
    slots: Vec<Slot>,
    free: Vec<u32>,
    index: HashMap<Path, PrimHandle>,
    root: PrimHandle,
}

// ============================================================================
// Construction and accessors
// ============================================================================

impl Stage {
    /// Create an empty stage using the built-in value types and default
    /// settings.
    ///
    /// # Example
    /// ```ignore
    /// let mut stage = Stage::create_new("hello.usda")?;
    /// stage.define_prim("/hello", "Xform")?;
    /// ```
    pub fn create_new(identity: &str) -> Result<Self> {
        Self::create_with(identity, ValueTypeRegistry::builtin(), Settings::default())
    }

    /// Create an empty stage with an explicit registry and settings.
    pub fn create_with(
        identity: &str,
        registry: Arc<ValueTypeRegistry>,
        settings: Settings,
    ) -> Result<Self> {
        if !is_valid_layer_identity(identity) {
            return Err(Error::InvalidIdentity(identity.to_string()));
        }

        let metadata = StageMetadata::from_defaults(&settings.stage_defaults);
        let mut stage = Self {
            identity: identity.to_string(),
            registry,
            settings,
            metadata,
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            root: PrimHandle {
                index: 0,
                generation: 0,
            },
        };

        let root_path = Path::absolute_root();
        stage.root = stage.alloc(PrimData::new(root_path.clone(), "", None));
        stage.index.insert(root_path, stage.root);

        tracing::debug!(identity, "created stage");
        Ok(stage)
    }

    /// Layer identity the stage was created with, e.g. `hello.usda`.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn registry(&self) -> &Arc<ValueTypeRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn metadata(&self) -> &StageMetadata {
        &self.metadata
    }

    /// Number of prims, not counting the pseudo-root.
    pub fn num_prims(&self) -> usize {
        self.index.len().saturating_sub(1)
    }
}

// ============================================================================
// Arena
// ============================================================================

impl Stage {
    fn alloc(&mut self, data: PrimData) -> PrimHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.data = Some(data);
            return PrimHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            data: Some(data),
        });
        PrimHandle {
            index,
            generation: 0,
        }
    }

    fn release(&mut self, handle: PrimHandle) -> Option<PrimData> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let data = slot.data.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(data)
    }

    pub(crate) fn node(&self, handle: PrimHandle) -> Option<&PrimData> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.data.as_ref()
    }

    pub(crate) fn node_mut(&mut self, handle: PrimHandle) -> Option<&mut PrimData> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.data.as_mut()
    }

    pub(crate) fn root_handle(&self) -> PrimHandle {
        self.root
    }
}

// ============================================================================
// Lookup
// ============================================================================

impl Stage {
    /// The pseudo-root prim `/`.
    pub fn pseudo_root(&self) -> Prim<'_> {
        self.prim(self.root)
            .expect("pseudo-root is always live")
    }

    /// Resolve a handle. Returns `None` once the prim has been removed.
    pub fn prim(&self, handle: PrimHandle) -> Option<Prim<'_>> {
        self.node(handle).map(|data| Prim::new(self, handle, data))
    }

    /// Authoring view for a handle.
    pub fn prim_mut(&mut self, handle: PrimHandle) -> Option<PrimMut<'_>> {
        self.node(handle)?;
        Some(PrimMut::new(self, handle))
    }

    /// Handle of the prim at `path`, if live.
    pub fn handle_at_path(&self, path: impl IntoPath) -> Option<PrimHandle> {
        let path = path.into_path().ok()?;
        self.index.get(&path).copied()
    }

    /// Look up a prim by absolute path. Never creates anything.
    pub fn prim_at_path(&self, path: impl IntoPath) -> Option<Prim<'_>> {
        let handle = self.handle_at_path(path)?;
        self.prim(handle)
    }

    pub fn prim_at_path_mut(&mut self, path: impl IntoPath) -> Option<PrimMut<'_>> {
        let handle = self.handle_at_path(path)?;
        self.prim_mut(handle)
    }
}

// ============================================================================
// Define / remove
// ============================================================================

impl Stage {
    /// Define a prim at an absolute path.
    ///
    /// Missing ancestors are created untyped; existing ancestors are left
    /// as they are. The last element gets define semantics: an existing prim
    /// with an empty or equal type is returned (and typed if it was
    /// untyped), a different non-empty type is a [`Error::TypeConflict`]
    /// unless the settings allow overriding. An empty `type_name` never
    /// conflicts.
    ///
    /// Ancestors created before a failing last step stay defined.
    pub fn define_prim(&mut self, path: impl IntoPath, type_name: &str) -> Result<PrimMut<'_>> {
        let path = path.into_path()?;
        if !path.is_absolute() {
            return Err(Error::path_syntax(path.to_string(), "prim path must be absolute"));
        }
        if path.is_property_path() {
            return Err(Error::path_syntax(path.to_string(), "expected a prim path"));
        }

        let segments: Vec<&str> = path.segments().collect();
        let Some((last, ancestors)) = segments.split_last() else {
            return Err(Error::path_syntax(path.to_string(), "cannot define the pseudo-root"));
        };

        let mut parent = self.root;
        for name in ancestors {
            parent = self.ensure_child(parent, name)?;
        }
        let handle = self.define_child(parent, last, type_name)?;
        Ok(PrimMut::new(self, handle))
    }

    /// Remove the prim at `path` and its whole subtree.
    ///
    /// Fails with [`Error::NotFound`] if no prim lives there or `path` is the
    /// pseudo-root.
    pub fn remove_prim_at_path(&mut self, path: impl IntoPath) -> Result<()> {
        let path = path.into_path()?;
        if path.is_root() {
            return Err(Error::not_found("the pseudo-root cannot be removed"));
        }
        let handle = self
            .index
            .get(&path)
            .copied()
            .ok_or_else(|| Error::not_found(format!("prim <{}>", path)))?;
        self.remove_subtree(handle)
    }

    pub(crate) fn define_child(
        &mut self,
        parent: PrimHandle,
        name: &str,
        type_name: &str,
    ) -> Result<PrimHandle> {
        let path = self.child_path(parent, name)?;
        if let Some(&existing) = self.index.get(&path) {
            self.reconcile_type(existing, type_name)?;
            return Ok(existing);
        }

        let handle = self.insert_child(parent, path, type_name);
        if let Some(data) = self.node(handle) {
            tracing::debug!(path = %data.path, type_name, "defined prim");
        }
        Ok(handle)
    }

    pub(crate) fn remove_child(&mut self, parent: PrimHandle, name: &str) -> Result<()> {
        let handle = self
            .child_path(parent, name)
            .ok()
            .and_then(|path| self.index.get(&path).copied())
            .ok_or_else(|| Error::not_found(format!("child prim '{}'", name)))?;
        self.remove_subtree(handle)
    }

    fn child_path(&self, parent: PrimHandle, name: &str) -> Result<Path> {
        let parent = self
            .node(parent)
            .ok_or_else(|| Error::not_found("parent prim"))?;
        parent.path.append_child(name)
    }

    // Get or create an untyped ancestor.
    fn ensure_child(&mut self, parent: PrimHandle, name: &str) -> Result<PrimHandle> {
        let path = self.child_path(parent, name)?;
        if let Some(&existing) = self.index.get(&path) {
            return Ok(existing);
        }
        tracing::trace!(path = %path, "created ancestor prim");
        Ok(self.insert_child(parent, path, ""))
    }

    fn insert_child(&mut self, parent: PrimHandle, path: Path, type_name: &str) -> PrimHandle {
        let handle = self.alloc(PrimData::new(path.clone(), type_name, Some(parent)));
        if let Some(parent) = self.node_mut(parent) {
            parent.children.push(handle);
        }
        self.index.insert(path, handle);
        handle
    }

    fn reconcile_type(&mut self, handle: PrimHandle, requested: &str) -> Result<()> {
        let policy = self.settings.type_conflict_policy;
        let data = self
            .node_mut(handle)
            .ok_or_else(|| Error::not_found("prim"))?;

        if requested.is_empty() || data.type_name == requested {
            return Ok(());
        }
        if data.type_name.is_empty() {
            data.type_name = requested.to_string();
            return Ok(());
        }

        match policy {
            TypeConflictPolicy::Error => Err(Error::TypeConflict {
                path: data.path.to_string(),
                existing: data.type_name.clone(),
                requested: requested.to_string(),
            }),
            TypeConflictPolicy::Override => {
                tracing::warn!(
                    path = %data.path,
                    existing = %data.type_name,
                    requested,
                    "overriding prim type"
                );
                data.type_name = requested.to_string();
                Ok(())
            }
        }
    }

    fn remove_subtree(&mut self, handle: PrimHandle) -> Result<()> {
        let data = self
            .node(handle)
            .ok_or_else(|| Error::not_found("prim"))?;
        let parent = data
            .parent
            .ok_or_else(|| Error::not_found("the pseudo-root cannot be removed"))?;
        let path = data.path.clone();

        if let Some(parent) = self.node_mut(parent) {
            parent.children.retain(|&child| child != handle);
        }

        let mut removed = 0usize;
        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            if let Some(data) = self.release(h) {
                self.index.remove(&data.path);
                stack.extend(data.children);
                removed += 1;
            }
        }
        tracing::trace!(count = removed, "pruned index entries");

        if path.depth() == 1 && self.metadata.default_prim.as_deref() == Some(path.name()) {
            self.metadata.default_prim = None;
        }

        tracing::debug!(path = %path, removed, "removed prim");
        Ok(())
    }
}

// ============================================================================
// Stage metadata
// ============================================================================

impl Stage {
    pub fn set_doc(&mut self, doc: impl Into<String>) {
        self.metadata.doc = Some(doc.into());
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.metadata.comment = Some(comment.into());
    }

    pub fn set_up_axis(&mut self, up_axis: UpAxis) {
        self.metadata.up_axis = up_axis;
    }

    pub fn set_meters_per_unit(&mut self, meters_per_unit: f64) -> Result<()> {
        self.metadata.meters_per_unit = positive("metersPerUnit", meters_per_unit)?;
        Ok(())
    }

    pub fn set_time_codes_per_second(&mut self, fps: f64) -> Result<()> {
        self.metadata.time_codes_per_second = positive("timeCodesPerSecond", fps)?;
        Ok(())
    }

    /// Set the authored start and end time codes.
    pub fn set_time_code_range(&mut self, start: f64, end: f64) -> Result<()> {
        if !start.is_finite() || !end.is_finite() {
            return Err(Error::invalid_value("timeCode", "time codes must be finite"));
        }
        if start > end {
            return Err(Error::invalid_value(
                "timeCode",
                format!("start {} is after end {}", start, end),
            ));
        }
        self.metadata.start_time_code = Some(start);
        self.metadata.end_time_code = Some(end);
        Ok(())
    }

    /// Set the default prim by root prim name.
    pub fn set_default_prim(&mut self, name: &str) -> Result<()> {
        let is_root_prim = Path::absolute_root()
            .append_child(name)
            .ok()
            .is_some_and(|path| self.index.contains_key(&path));
        if !is_root_prim {
            return Err(Error::not_found(format!("root prim '{}'", name)));
        }
        self.metadata.default_prim = Some(name.to_string());
        Ok(())
    }

    pub fn clear_default_prim(&mut self) {
        self.metadata.default_prim = None;
    }

    /// The default prim, if one is set.
    pub fn default_prim(&self) -> Option<Prim<'_>> {
        let name = self.metadata.default_prim.as_deref()?;
        self.pseudo_root().child(name)
    }

    pub fn set_custom_layer_data(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.custom_layer_data.insert(key.into(), value.into());
    }
}

fn positive(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::invalid_value(field, format!("must be positive, got {}", value)))
    }
}

// ============================================================================
// Integrity
// ============================================================================

impl Stage {
    /// Check that the path index and the tree agree.
    ///
    /// Verifies that every index entry resolves to a live prim with that
    /// path, every live prim is indexed, every path is its parent's path
    /// joined with its name, and names are unique among siblings and
    /// among a prim's attributes.
    pub fn verify_integrity(&self) -> Result<()> {
        for (path, &handle) in &self.index {
            let data = self
                .node(handle)
                .ok_or_else(|| Error::other(format!("index entry <{}> is stale", path)))?;
            if &data.path != path {
                return Err(Error::other(format!(
                    "index entry <{}> points at <{}>",
                    path, data.path
                )));
            }
        }

        let live = self.slots.iter().filter(|slot| slot.data.is_some()).count();
        if live != self.index.len() {
            return Err(Error::other(format!(
                "{} live prims but {} index entries",
                live,
                self.index.len()
            )));
        }

        for slot in &self.slots {
            let Some(data) = &slot.data else { continue };

            if let Some(parent) = data.parent {
                let parent = self
                    .node(parent)
                    .ok_or_else(|| Error::other(format!("<{}> has a dead parent", data.path)))?;
                if parent.path.append_child(data.path.name()).ok().as_ref() != Some(&data.path) {
                    return Err(Error::other(format!(
                        "<{}> is not a child path of <{}>",
                        data.path, parent.path
                    )));
                }
            }

            let mut names = HashSet::new();
            for &child in &data.children {
                let child = self
                    .node(child)
                    .ok_or_else(|| Error::other(format!("<{}> has a dead child", data.path)))?;
                if !names.insert(child.path.name()) {
                    return Err(Error::other(format!("duplicate child <{}>", child.path)));
                }
            }

            let mut names = HashSet::new();
            for attr in &data.attributes {
                if !names.insert(attr.name()) {
                    return Err(Error::other(format!("duplicate attribute <{}>", attr.path())));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("identity", &self.identity)
            .field("num_prims", &self.num_prims())
            .field("metadata", &self.metadata)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_new() {
        let stage = Stage::create_new("hello.usda").unwrap();
        assert_eq!(stage.identity(), "hello.usda");
        assert_eq!(stage.num_prims(), 0);
        assert!(stage.pseudo_root().is_pseudo_root());
        assert_eq!(stage.pseudo_root().path().to_string(), "/");
        assert_eq!(stage.metadata().up_axis, UpAxis::Y);
    }

    #[test]
    fn test_invalid_identity() {
        for bad in ["", "  hello.usda", "dir/", "a\nb"] {
            assert!(
                matches!(Stage::create_new(bad), Err(Error::InvalidIdentity(_))),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_define_creates_ancestors_untyped() {
        let mut stage = Stage::create_new("s.usda").unwrap();
        stage.define_prim("/a/b/c", "Mesh").unwrap();

        assert_eq!(stage.num_prims(), 3);
        assert_eq!(stage.prim_at_path("/a").unwrap().type_name(), "");
        assert_eq!(stage.prim_at_path("/a/b").unwrap().type_name(), "");
        assert_eq!(stage.prim_at_path("/a/b/c").unwrap().type_name(), "Mesh");
        stage.verify_integrity().unwrap();
    }

    #[test]
    fn test_define_is_idempotent() {
        let mut stage = Stage::create_new("s.usda").unwrap();
        let first = stage.define_prim("/hello", "Xform").unwrap().handle();
        let second = stage.define_prim("/hello", "Xform").unwrap().handle();
        let untyped = stage.define_prim("/hello", "").unwrap().handle();

        assert_eq!(first, second);
        assert_eq!(first, untyped);
        assert_eq!(stage.pseudo_root().num_children(), 1);
        assert_eq!(stage.prim(first).unwrap().type_name(), "Xform");
    }

    #[test]
    fn test_define_types_untyped_prim() {
        let mut stage = Stage::create_new("s.usda").unwrap();
        stage.define_prim("/a/b", "").unwrap();
        stage.define_prim("/a", "Scope").unwrap();
        assert_eq!(stage.prim_at_path("/a").unwrap().type_name(), "Scope");
    }

    #[test]
    fn test_type_conflict() {
        let mut stage = Stage::create_new("s.usda").unwrap();
        stage.define_prim("/a", "Xform").unwrap();
        let err = stage.define_prim("/a", "Mesh").unwrap_err();
        assert!(matches!(err, Error::TypeConflict { .. }));
        assert_eq!(stage.prim_at_path("/a").unwrap().type_name(), "Xform");
    }

    #[test]
    fn test_type_override_policy() {
        let settings = Settings {
            type_conflict_policy: TypeConflictPolicy::Override,
            ..Settings::default()
        };
        let mut stage =
            Stage::create_with("s.usda", ValueTypeRegistry::builtin(), settings).unwrap();
        stage.define_prim("/a", "Xform").unwrap();
        stage.define_prim("/a", "Mesh").unwrap();
        assert_eq!(stage.prim_at_path("/a").unwrap().type_name(), "Mesh");
    }

    #[test]
    fn test_define_rejects_bad_paths() {
        let mut stage = Stage::create_new("s.usda").unwrap();
        for bad in ["", "/", "relative", "/a.attr", "/a//b"] {
            assert!(
                matches!(
                    stage.define_prim(bad, "Xform"),
                    Err(Error::InvalidPathSyntax { .. })
                ),
                "{:?}",
                bad
            );
        }
        assert_eq!(stage.num_prims(), 0);
    }

    #[test]
    fn test_ancestors_survive_failed_define() {
        let mut stage = Stage::create_new("s.usda").unwrap();
        stage.define_prim("/m/n/a", "Xform").unwrap();
        stage.define_prim("/m/n/a", "Mesh").unwrap_err();

        assert!(stage.prim_at_path("/m").is_some());
        assert!(stage.prim_at_path("/m/n").is_some());
        assert_eq!(stage.num_prims(), 3);
        stage.verify_integrity().unwrap();
    }

    #[test]
    fn test_remove_subtree() {
        let mut stage = Stage::create_new("s.usda").unwrap();
        stage.define_prim("/a/b/c", "").unwrap();
        stage.define_prim("/a/d", "").unwrap();
        stage.define_prim("/z", "").unwrap();

        stage.remove_prim_at_path("/a/b").unwrap();
        assert!(stage.prim_at_path("/a/b").is_none());
        assert!(stage.prim_at_path("/a/b/c").is_none());
        assert!(stage.prim_at_path("/a/d").is_some());
        assert_eq!(stage.num_prims(), 3);
        stage.verify_integrity().unwrap();

        assert!(matches!(
            stage.remove_prim_at_path("/a/b"),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            stage.remove_prim_at_path("/"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_stale_handle_after_remove() {
        let mut stage = Stage::create_new("s.usda").unwrap();
        let old = stage.define_prim("/a", "").unwrap().handle();
        stage.remove_prim_at_path("/a").unwrap();
        assert!(stage.prim(old).is_none());

        // Slot is reused, the old handle still misses
        let new = stage.define_prim("/a", "").unwrap().handle();
        assert_ne!(old, new);
        assert!(stage.prim(old).is_none());
        assert!(stage.prim(new).is_some());
    }

    #[test]
    fn test_default_prim() {
        let mut stage = Stage::create_new("s.usda").unwrap();
        stage.define_prim("/world/geo", "").unwrap();

        assert!(matches!(
            stage.set_default_prim("missing"),
            Err(Error::NotFound(_))
        ));
        assert!(stage.set_default_prim("geo").is_err());

        stage.set_default_prim("world").unwrap();
        assert_eq!(stage.default_prim().unwrap().name(), "world");

        stage.remove_prim_at_path("/world").unwrap();
        assert!(stage.metadata().default_prim.is_none());
        assert!(stage.default_prim().is_none());
    }

    #[test]
    fn test_metadata_setters_validate() {
        let mut stage = Stage::create_new("s.usda").unwrap();
        stage.set_time_code_range(1.0, 24.0).unwrap();
        assert!(matches!(
            stage.set_time_code_range(10.0, 1.0),
            Err(Error::InvalidValue { .. })
        ));
        assert_eq!(stage.metadata().time_code_range(), Some((1.0, 24.0)));

        assert!(stage.set_meters_per_unit(0.0).is_err());
        assert!(stage.set_time_codes_per_second(f64::NAN).is_err());
        stage.set_meters_per_unit(1.0).unwrap();
        assert_eq!(stage.metadata().meters_per_unit, 1.0);

        stage.set_custom_layer_data("author", "me");
        assert_eq!(
            stage.metadata().custom_layer_data.get("author"),
            Some(&Value::from("me"))
        );
    }
}
