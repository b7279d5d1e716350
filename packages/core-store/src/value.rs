//! The Value type - a tree-shaped document.
//!
//! Every backend reads and writes `Value`s. It maps one-to-one onto JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Path;

/// A tree-shaped value stored at a path.
///
/// # Design Notes
///
/// - Uses `BTreeMap` for deterministic ordering (important for comparison)
/// - Uses `i64` for integers and falls back to `f64` for anything else numeric
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// JSON `null`. Distinct from "path doesn't exist".
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Get a reference to a nested value by path.
    ///
    /// Returns `None` if the path doesn't exist or can't be navigated
    /// (e.g., trying to index into a string, or past the end of an array).
    pub fn get(&self, path: &Path) -> Option<&Value> {
        let mut current = self;
        for component in path.iter() {
            current = current.child(component)?;
        }
        Some(current)
    }

    /// Get a mutable reference to a nested value by path.
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Value> {
        let mut current = self;
        for component in path.iter() {
            current = match current {
                Value::Map(map) => map.get_mut(component)?,
                Value::Array(arr) => {
                    let index: usize = component.parse().ok()?;
                    arr.get_mut(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// The direct child named by one segment.
    pub fn child(&self, segment: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(segment),
            Value::Array(arr) => {
                let index: usize = segment.parse().ok()?;
                arr.get(index)
            }
            _ => None,
        }
    }

    /// Set `value` at `path`, overwriting whatever was there.
    ///
    /// Intermediate nodes are created as maps. An intermediate that cannot
    /// hold the next segment (a scalar, or an array addressed by a
    /// non-index) is replaced by a map. An empty path replaces `self`.
    pub fn splice(&mut self, path: &Path, value: Value) {
        let mut current = self;
        for component in path.iter() {
            let descend_array = match current {
                Value::Array(arr) => component
                    .parse::<usize>()
                    .ok()
                    .filter(|index| *index < arr.len()),
                _ => None,
            };
            if descend_array.is_none() && !current.is_map() {
                *current = Value::map();
            }
            current = match (current, descend_array) {
                (Value::Array(arr), Some(index)) => &mut arr[index],
                (Value::Map(map), _) => map.entry(component.clone()).or_insert(Value::Null),
                _ => unreachable!("intermediate was normalized to a container"),
            };
        }
        *current = value;
    }

    /// Remove and return the value at `path`.
    ///
    /// A map entry is dropped; an array element is taken out, shifting the
    /// ones after it. Returns `None` when `path` doesn't exist. An empty
    /// path resets `self` to `Null`.
    pub fn remove(&mut self, path: &Path) -> Option<Value> {
        let Some(key) = path.last() else {
            return Some(std::mem::take(self));
        };
        let parent = path.slice(0, path.len() - 1);
        match self.get_mut(&parent)? {
            Value::Map(map) => map.remove(key),
            Value::Array(arr) => {
                let index: usize = key.parse().ok()?;
                (index < arr.len()).then(|| arr.remove(index))
            }
            _ => None,
        }
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        i64::try_from(v).map_or(Value::Float(v as f64), Value::Integer)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
