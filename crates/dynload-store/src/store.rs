//! Read-only precompiled artifact stores.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use crate::paths::artifact_path;

/// Read-only lookup of precompiled unit buffers.
///
/// Absence is not an error: a miss means "must emit live". Implementations
/// must also degrade read failures (I/O error, corruption) to a miss rather
/// than surfacing them, so resolution can fall through.
pub trait ArtifactStore: Send + Sync {
    /// Look up the precompiled buffer for `module`/`member`.
    fn lookup(&self, module: &str, member: &str) -> Option<Box<[u8]>>;
}

/// Directory-backed artifact store.
///
/// Artifacts live at `<root>/<module>/<member>.unit` (see [`crate::paths`]).
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Open a store rooted at `root`. The directory does not need to exist;
    /// a missing root simply answers every lookup with a miss.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactStore for FsArtifactStore {
    fn lookup(&self, module: &str, member: &str) -> Option<Box<[u8]>> {
        let path = artifact_path(&self.root, module, member);
        if !path.exists() {
            return None;
        }
        match std::fs::read(&path) {
            Ok(bytes) => Some(bytes.into_boxed_slice()),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read precompiled artifact, treating as absent"
                );
                None
            }
        }
    }
}

/// Map-backed artifact store for tests and declarative fixtures. Counts
/// lookups so precedence properties ("the store was never consulted") can
/// be asserted.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    entries: RwLock<HashMap<(String, String), Arc<[u8]>>>,
    lookups: AtomicUsize,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a precompiled buffer for `module`/`member`, replacing any
    /// previous entry.
    pub fn insert(&self, module: &str, member: &str, bytes: impl Into<Arc<[u8]>>) {
        self.entries
            .write()
            .insert((module.to_string(), member.to_string()), bytes.into());
    }

    /// How many lookups this store has answered (hits and misses).
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(AtomicOrdering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn lookup(&self, module: &str, member: &str) -> Option<Box<[u8]>> {
        self.lookups.fetch_add(1, AtomicOrdering::SeqCst);
        self.entries
            .read()
            .get(&(module.to_string(), member.to_string()))
            .map(|bytes| bytes.as_ref().into())
    }
}
