//! A generic prefix trie keyed by path components.
//!
//! `PathTrie<T>` provides O(k) operations where k is the path depth.
//! Each node can optionally hold a value, and has children indexed by path component.

use crate::Path;
use std::collections::BTreeMap;

/// A prefix trie keyed by path components.
///
/// # Example
///
/// ```rust
/// use fedstore_core::{PathTrie, path};
///
/// let mut trie: PathTrie<i32> = PathTrie::new();
/// trie.insert(&path!("/a/b"), 1);
/// trie.insert(&path!("/a/b/c"), 2);
///
/// assert_eq!(trie.get(&path!("/a/b")), Some(&1));
///
/// // find_ancestor returns the deepest value along the path
/// let (value, suffix) = trie.find_ancestor(&path!("/a/b/c/d")).unwrap();
/// assert_eq!(*value, 2);
/// assert_eq!(suffix, path!("/d"));
/// ```
#[derive(Debug, Clone)]
pub struct PathTrie<T> {
    value: Option<T>,
    children: BTreeMap<String, PathTrie<T>>,
}

impl<T> Default for PathTrie<T> {
    fn default() -> Self {
        Self {
            value: None,
            children: BTreeMap::new(),
        }
    }
}

impl<T> PathTrie<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_create_node(&mut self, path: &Path) -> &mut PathTrie<T> {
        let mut current = self;
        for component in &path.components {
            current = current.children.entry(component.clone()).or_default();
        }
        current
    }

    fn get_node(&self, path: &Path) -> Option<&PathTrie<T>> {
        let mut current = self;
        for component in &path.components {
            current = current.children.get(component)?;
        }
        Some(current)
    }

    /// Insert a value at path. Returns previous value if any.
    pub fn insert(&mut self, path: &Path, value: T) -> Option<T> {
        let node = self.get_or_create_node(path);
        node.value.replace(value)
    }

    /// Remove every value that lies on `path` (the root, each ancestor and
    /// `path` itself) or anywhere beneath it. Returns the removed entries
    /// with their absolute paths.
    pub fn remove_related(&mut self, path: &Path) -> Vec<(Path, T)> {
        let mut removed = Vec::new();
        let mut current = self;
        for depth in 0..path.len() {
            if let Some(value) = current.value.take() {
                removed.push((path.slice(0, depth), value));
            }
            current = match current.children.get_mut(&path.components[depth]) {
                Some(child) => child,
                None => return removed,
            };
        }

        let subtree = std::mem::take(current);
        removed.extend(
            subtree
                .into_entries()
                .into_iter()
                .map(|(suffix, value)| (path.join(&suffix), value)),
        );
        removed
    }

    /// Get reference to value at exact path.
    pub fn get(&self, path: &Path) -> Option<&T> {
        self.get_node(path)?.value.as_ref()
    }

    /// Get a reference to the value at `path`, inserting `default()` first
    /// if there is none.
    pub fn get_or_insert_with(&mut self, path: &Path, default: impl FnOnce() -> T) -> &mut T {
        self.get_or_create_node(path).value.get_or_insert_with(default)
    }

    /// Count of values in trie (not nodes).
    pub fn len(&self) -> usize {
        let self_count = usize::from(self.value.is_some());
        let children_count: usize = self.children.values().map(|child| child.len()).sum();
        self_count + children_count
    }

    /// True if no values anywhere in trie.
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.children.values().all(|c| c.is_empty())
    }

    /// Find deepest ancestor (or `path` itself) with a value.
    /// Returns (value_ref, remaining_suffix).
    pub fn find_ancestor(&self, path: &Path) -> Option<(&T, Path)> {
        let mut current = self;
        let mut last_value: Option<&T> = self.value.as_ref();
        let mut last_depth: usize = 0;

        for (depth, component) in path.components.iter().enumerate() {
            match current.children.get(component) {
                Some(child) => {
                    current = child;
                    if child.value.is_some() {
                        last_value = child.value.as_ref();
                        last_depth = depth + 1;
                    }
                }
                None => break,
            }
        }

        last_value.map(|v| {
            let suffix = Path {
                components: path.components[last_depth..].to_vec(),
            };
            (v, suffix)
        })
    }

    /// Every value strictly beneath `path`, keyed by its path relative to
    /// `path`.
    pub fn descendants(&self, path: &Path) -> Vec<(Path, &T)> {
        match self.get_node(path) {
            Some(node) => node.iter().filter(|(rel, _)| !rel.is_empty()).collect(),
            None => Vec::new(),
        }
    }

    /// Iterate over all (path, value) pairs, parents before children and
    /// siblings in key order.
    pub fn iter(&self) -> PathTrieIter<'_, T> {
        PathTrieIter::new(self)
    }

    fn into_entries(self) -> Vec<(Path, T)> {
        let mut out = Vec::new();
        let mut stack = vec![(Path::root(), self)];
        while let Some((path, node)) = stack.pop() {
            if let Some(value) = node.value {
                out.push((path.clone(), value));
            }
            for (name, child) in node.children.into_iter().rev() {
                stack.push((path.child(name), child));
            }
        }
        out
    }
}

/// Iterator over (Path, &T) pairs in a PathTrie.
pub struct PathTrieIter<'a, T> {
    stack: Vec<(Path, &'a PathTrie<T>)>,
}

impl<'a, T> PathTrieIter<'a, T> {
    fn new(trie: &'a PathTrie<T>) -> Self {
        Self {
            stack: vec![(Path::root(), trie)],
        }
    }
}

impl<'a, T> Iterator for PathTrieIter<'a, T> {
    type Item = (Path, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((path, node)) = self.stack.pop() {
            // Reverse so that the smallest key is popped first.
            for (name, child) in node.children.iter().rev() {
                self.stack.push((path.child(name.clone()), child));
            }

            if let Some(ref value) = node.value {
                return Some((path, value));
            }
        }
        None
    }
}
