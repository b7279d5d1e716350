//! Utilities for navigating and patching Value trees.

use fedstore_core::{Path, Value, WriteOp};

/// Why a patch could not be applied.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PatchError {
    #[error("path not found: {0}")]
    NotFound(Path),

    #[error("invalid patch at {path}: {message}")]
    Invalid { path: Path, message: String },
}

impl PatchError {
    fn invalid(path: &Path, message: impl Into<String>) -> Self {
        PatchError::Invalid {
            path: path.clone(),
            message: message.into(),
        }
    }
}

/// Apply one write operation to `tree`.
///
/// - `Add` inserts into a map, or into an array at an index (`-` appends);
///   the parent must already exist.
/// - `Replace` overwrites an existing value.
/// - `Remove` deletes an existing value; `value` is ignored.
pub fn apply_patch(
    tree: &mut Value,
    op: WriteOp,
    path: &Path,
    value: Value,
) -> Result<(), PatchError> {
    let (parent_path, key) = match (path.parent(), path.last()) {
        (Some(parent), Some(key)) => (parent, key.to_string()),
        _ => {
            return match op {
                WriteOp::Add | WriteOp::Replace => {
                    *tree = value;
                    Ok(())
                }
                WriteOp::Remove => Err(PatchError::invalid(path, "cannot remove the root")),
            };
        }
    };

    let parent = tree
        .get_mut(&parent_path)
        .ok_or_else(|| PatchError::NotFound(path.clone()))?;

    match op {
        WriteOp::Add => add_child(parent, path, &key, value),
        WriteOp::Replace => {
            let slot = child_mut(parent, &key).ok_or_else(|| PatchError::NotFound(path.clone()))?;
            *slot = value;
            Ok(())
        }
        WriteOp::Remove => remove_child(parent, path, &key),
    }
}

fn child_mut<'a>(parent: &'a mut Value, key: &str) -> Option<&'a mut Value> {
    match parent {
        Value::Map(map) => map.get_mut(key),
        Value::Array(arr) => {
            let index: usize = key.parse().ok()?;
            arr.get_mut(index)
        }
        _ => None,
    }
}

fn add_child(parent: &mut Value, path: &Path, key: &str, value: Value) -> Result<(), PatchError> {
    match parent {
        Value::Map(map) => {
            map.insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(arr) => {
            if key == "-" {
                arr.push(value);
                return Ok(());
            }
            let index: usize = key.parse().map_err(|_| {
                PatchError::invalid(path, format!("expected array index, got '{}'", key))
            })?;
            if index > arr.len() {
                return Err(PatchError::NotFound(path.clone()));
            }
            arr.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::invalid(path, "parent is not a map or array")),
    }
}

fn remove_child(parent: &mut Value, path: &Path, key: &str) -> Result<(), PatchError> {
    match parent {
        Value::Map(map) => map
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| PatchError::NotFound(path.clone())),
        Value::Array(arr) => match key.parse::<usize>() {
            Ok(index) if index < arr.len() => {
                arr.remove(index);
                Ok(())
            }
            _ => Err(PatchError::NotFound(path.clone())),
        },
        _ => Err(PatchError::NotFound(path.clone())),
    }
}
