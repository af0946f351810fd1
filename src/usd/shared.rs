//! Thread-shared stage.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

use super::snapshot::LayerSnapshot;
use super::stage::Stage;

/// A stage shared between threads.
///
/// Readers run concurrently; a writer holds the whole stage, so a reader
/// never sees the tree and the path index out of step. Clones share the
/// same stage.
#[derive(Clone, Debug)]
pub struct SharedStage {
    inner: Arc<RwLock<Stage>>,
}

impl SharedStage {
    pub fn new(stage: Stage) -> Self {
        Self {
            inner: Arc::new(RwLock::new(stage)),
        }
    }

    /// Acquire a read guard.
    pub fn read(&self) -> RwLockReadGuard<'_, Stage> {
        self.inner.read()
    }

    /// Acquire the write guard.
    pub fn write(&self) -> RwLockWriteGuard<'_, Stage> {
        self.inner.write()
    }

    /// Run `f` under a read guard.
    pub fn with_read<R>(&self, f: impl FnOnce(&Stage) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run `f` under the write guard. Everything `f` does is atomic with
    /// respect to other users of this stage.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut Stage) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Snapshot taken under a read guard.
    pub fn snapshot(&self) -> LayerSnapshot {
        self.inner.read().snapshot()
    }

    /// Unwrap the stage if this is the last handle.
    pub fn try_into_inner(self) -> Result<Stage, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<Stage> for SharedStage {
    fn from(stage: Stage) -> Self {
        Self::new(stage)
    }
}
