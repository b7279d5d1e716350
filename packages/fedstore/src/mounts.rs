//! The mount table: which backend owns which subtree.

use std::slice;
use std::sync::Arc;

use fedstore_core::{Backend, Error, Path, PathTrie};

use crate::router::{route, Routes};

pub type BackendRef = Arc<dyn Backend>;

/// Where a single path is served from.
pub struct Resolution {
    /// The backend that owns the path itself.
    pub owner: BackendRef,
    /// The path in the owner's coordinates.
    pub relative: Path,
    /// Mounts strictly beneath the path, keyed by their position relative to
    /// it. Parents come before children.
    pub nested: Vec<(Path, BackendRef)>,
}

/// Mount paths to backends. The root is never mounted; it belongs to the
/// builtin backend.
#[derive(Clone, Default)]
pub struct MountTable {
    trie: PathTrie<BackendRef>,
}

impl MountTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `backend` at `path`.
    ///
    /// Fails without touching the table if `path` is the root, is already
    /// mounted, or if the backend's id is already in use.
    pub fn insert(
        &mut self,
        builtin_id: &str,
        path: Path,
        backend: BackendRef,
    ) -> Result<(), Error> {
        if path.is_empty() {
            return Err(Error::configuration(
                "cannot mount at the root; it belongs to the builtin backend",
            ));
        }
        if let Some(existing) = self.trie.get(&path) {
            return Err(Error::configuration(format!(
                "{} is already mounted (backend '{}')",
                path,
                existing.id()
            )));
        }
        let id = backend.id();
        if id == builtin_id || self.get_by_id(id).is_some() {
            return Err(Error::configuration(format!(
                "backend id '{}' is already in use",
                id
            )));
        }

        log::debug!("mounted '{}' at {}", id, path);
        self.trie.insert(&path, backend);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    /// Every mount, parents before children.
    pub fn entries(&self) -> Vec<(Path, BackendRef)> {
        self.trie
            .iter()
            .map(|(path, backend)| (path, Arc::clone(backend)))
            .collect()
    }

    pub fn get_by_id(&self, id: &str) -> Option<BackendRef> {
        self.trie
            .iter()
            .find(|(_, backend)| backend.id() == id)
            .map(|(_, backend)| Arc::clone(backend))
    }

    /// Route `requested` against this table.
    pub fn route(&self, builtin_id: &str, requested: &[Path]) -> Routes {
        let entries: Vec<(Path, &BackendRef)> = self.trie.iter().collect();
        route(
            builtin_id,
            entries.iter().map(|(path, backend)| (path, backend.id())),
            requested,
        )
    }

    /// Routed participants, each paired with its backend.
    pub fn participants(
        &self,
        builtin: &BackendRef,
        requested: &[Path],
    ) -> Vec<(BackendRef, Vec<Path>)> {
        self.route(builtin.id(), requested)
            .into_iter()
            .filter_map(|(id, paths)| {
                let backend = if id == builtin.id() {
                    Some(Arc::clone(builtin))
                } else {
                    self.get_by_id(&id)
                };
                backend.map(|backend| (backend, paths))
            })
            .collect()
    }

    /// Resolve one path to its owner and the mounts beneath it.
    ///
    /// With nested mounts the deepest enclosing mount owns the path.
    pub fn resolve(&self, builtin: &BackendRef, path: &Path) -> Resolution {
        let routes = self.route(builtin.id(), slice::from_ref(path));
        let (owner, relative) = match self.trie.find_ancestor(path) {
            Some((backend, relative)) if !routes.contains_key(builtin.id()) => {
                (Arc::clone(backend), relative)
            }
            _ => (Arc::clone(builtin), path.clone()),
        };
        let nested = self
            .trie
            .descendants(path)
            .into_iter()
            .map(|(relative, backend)| (relative, Arc::clone(backend)))
            .collect();

        Resolution {
            owner,
            relative,
            nested,
        }
    }
}
