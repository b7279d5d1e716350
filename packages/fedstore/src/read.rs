//! Reads that may straddle mount boundaries.

use fedstore_core::{Context, Error, Path, Transaction, Value};

use crate::mounts::Resolution;

/// Read `path` as resolved against the mount table.
///
/// With no mounts beneath `path` this is a plain read on the owner. Otherwise
/// the owner's value is the base and the root of every nested mount is
/// spliced in at its relative key, overwriting what the base held there. A
/// nested mount with nothing at its root hides whatever the base held at its
/// key. A missing base counts as an empty map as long as some mount
/// contributed.
///
/// A not-found from the owner names the absolute path, not the one relative
/// to the owner's mount point.
pub fn read_merged(
    cx: &Context,
    txn: &Transaction,
    path: &Path,
    resolution: &Resolution,
) -> Result<Value, Error> {
    let Resolution {
        owner,
        relative,
        nested,
    } = resolution;
    let mount_point = path.slice(0, path.len() - relative.len());

    if nested.is_empty() {
        return owner
            .read(cx, txn, relative)
            .map_err(|err| rebase(err, &mount_point));
    }

    let base = match owner.read(cx, txn, relative) {
        Ok(value) => Some(value),
        Err(err) if err.is_not_found() => None,
        Err(err) => return Err(err),
    };
    let found_base = base.is_some();
    let mut merged = base.unwrap_or_else(Value::map);
    let mut contributed = false;

    for (key, backend) in nested {
        match backend.read(cx, txn, &Path::root()) {
            Ok(value) => {
                log::trace!("merge: '{}' spliced at {}", backend.id(), path.join(key));
                merged.splice(key, value);
                contributed = true;
            }
            Err(err) if err.is_not_found() => {
                if merged.remove(key).is_some() {
                    log::trace!("merge: '{}' is empty, hid {}", backend.id(), path.join(key));
                }
            }
            Err(err) => return Err(err),
        }
    }

    if !found_base && !contributed {
        return Err(Error::not_found(path));
    }
    Ok(merged)
}

fn rebase(err: Error, mount_point: &Path) -> Error {
    match err {
        Error::NotFound { path } => Error::not_found(&mount_point.join(&path)),
        other => other,
    }
}
