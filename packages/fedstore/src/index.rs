//! Pattern indexes over the builtin backend's data.
//!
//! An index is the full set of matches of a [`Pattern`] against the data as
//! it was when the index was built. It is never patched: a write that could
//! change the result removes the index, and a later build starts over.

use std::collections::BTreeMap;
use std::sync::Arc;

use fedstore_core::{Error, Path, PathTrie, Pattern, Term, Value};
use parking_lot::RwLock;

/// Variable name to the key or index it was bound to.
///
/// Map keys bind as strings, array indices as integers.
pub type Bindings = BTreeMap<String, Value>;

/// One match of a pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexEntry {
    pub bindings: Bindings,
    /// The concrete path the bindings produce.
    pub path: Path,
    pub value: Value,
}

/// The materialized matches of one pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct Index {
    pattern: Pattern,
    entries: Vec<IndexEntry>,
}

impl Index {
    /// Evaluate `pattern` against `base`, the value found at the pattern's
    /// constant prefix.
    pub fn evaluate(pattern: &Pattern, base: &Value) -> Self {
        let mut entries = Vec::new();
        let mut bindings = Bindings::new();
        walk(
            base,
            pattern.tail(),
            pattern.constant_prefix(),
            &mut bindings,
            &mut entries,
        );
        Self {
            pattern: pattern.clone(),
            entries,
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Every match, in document order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Bindings of every match whose value equals `value`.
    pub fn lookup(&self, value: &Value) -> Vec<&Bindings> {
        self.entries
            .iter()
            .filter(|entry| entry.value == *value)
            .map(|entry| &entry.bindings)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn walk(
    node: &Value,
    terms: &[Term],
    path: Path,
    bindings: &mut Bindings,
    out: &mut Vec<IndexEntry>,
) {
    let Some((term, rest)) = terms.split_first() else {
        out.push(IndexEntry {
            bindings: bindings.clone(),
            path,
            value: node.clone(),
        });
        return;
    };

    match term {
        Term::Literal(segment) => {
            if let Some(child) = node.child(segment) {
                walk(child, rest, path.child(segment.as_str()), bindings, out);
            }
        }
        // A variable already bound earlier in the pattern must agree.
        Term::Var(name) if bindings.contains_key(name) => {
            let segment = bindings.get(name).and_then(segment_of);
            if let Some(segment) = segment {
                if let Some(child) = node.child(&segment) {
                    walk(child, rest, path.child(segment), bindings, out);
                }
            }
        }
        Term::Var(name) => {
            for (segment, binding, child) in children(node) {
                bindings.insert(name.clone(), binding);
                walk(child, rest, path.child(segment), bindings, out);
                bindings.remove(name);
            }
        }
    }
}

fn children(node: &Value) -> Vec<(String, Value, &Value)> {
    match node {
        Value::Map(map) => map
            .iter()
            .map(|(key, child)| (key.clone(), Value::String(key.clone()), child))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, child)| (i.to_string(), Value::from(i), child))
            .collect(),
        _ => Vec::new(),
    }
}

fn segment_of(binding: &Value) -> Option<String> {
    match binding {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        _ => None,
    }
}

/// Registered indexes, filed under their pattern's constant prefix.
///
/// Builds load their data without holding the registry lock. A build is
/// only registered if no invalidation touched its constant prefix while it
/// was loading.
#[derive(Default)]
pub struct IndexManager {
    registry: RwLock<Registry>,
}

#[derive(Default)]
struct Registry {
    indexes: PathTrie<Vec<Arc<Index>>>,
    next_build: u64,
    /// Builds whose load is running, by ticket.
    building: BTreeMap<u64, Building>,
}

struct Building {
    prefix: Path,
    stale: bool,
}

/// Forgets its build when dropped, however the build ends.
struct Ticket<'a> {
    registry: &'a RwLock<Registry>,
    id: u64,
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        self.registry.write().building.remove(&self.id);
    }
}

fn related(a: &Path, b: &Path) -> bool {
    a.has_prefix(b) || b.has_prefix(a)
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and register an index for `pattern`, replacing any existing
    /// one. `load` reads the value at the constant prefix.
    ///
    /// If an invalidation touching the constant prefix lands while `load`
    /// runs, the index is returned but not registered.
    pub fn build<F>(&self, pattern: &Pattern, load: F) -> Result<Arc<Index>, Error>
    where
        F: FnOnce(&Path) -> Result<Value, Error>,
    {
        let prefix = pattern.constant_prefix();
        let ticket = {
            let mut registry = self.registry.write();
            let id = registry.next_build;
            registry.next_build += 1;
            registry.building.insert(
                id,
                Building {
                    prefix: prefix.clone(),
                    stale: false,
                },
            );
            Ticket {
                registry: &self.registry,
                id,
            }
        };

        let base = load(&prefix).map_err(|err| Error::Index {
            pattern: pattern.to_string(),
            source: Box::new(err),
        })?;
        let index = Arc::new(Index::evaluate(pattern, &base));

        {
            let mut registry = self.registry.write();
            let stale = registry
                .building
                .get(&ticket.id)
                .map_or(true, |building| building.stale);
            if stale {
                log::debug!("index {}: invalidated while building, not registered", pattern);
                return Ok(index);
            }
            let slot = registry.indexes.get_or_insert_with(&prefix, Vec::new);
            slot.retain(|existing| existing.pattern() != pattern);
            slot.push(Arc::clone(&index));
        }

        log::debug!("index {}: built with {} entries", pattern, index.len());
        Ok(index)
    }

    pub fn exists(&self, pattern: &Pattern) -> bool {
        self.get(pattern).is_some()
    }

    pub fn get(&self, pattern: &Pattern) -> Option<Arc<Index>> {
        self.registry
            .read()
            .indexes
            .get(&pattern.constant_prefix())?
            .iter()
            .find(|index| index.pattern() == pattern)
            .cloned()
    }

    /// Drop every index whose constant prefix lies on or beneath `written`,
    /// or above it, and mark related builds in progress as stale. Returns
    /// how many registered indexes were dropped.
    pub fn invalidate(&self, written: &Path) -> usize {
        let removed = {
            let mut registry = self.registry.write();
            for building in registry.building.values_mut() {
                if related(&building.prefix, written) {
                    building.stale = true;
                }
            }
            registry.indexes.remove_related(written)
        };
        let mut count = 0;
        for (_, indexes) in removed {
            for index in indexes {
                log::debug!("index {}: invalidated by write to {}", index.pattern(), written);
                count += 1;
            }
        }
        count
    }

    /// Number of registered indexes.
    pub fn len(&self) -> usize {
        self.registry
            .read()
            .indexes
            .iter()
            .map(|(_, slot)| slot.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
