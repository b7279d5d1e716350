//! Path routing: which backend answers which part of a request.
//!
//! Given the mount table and a set of requested paths, [`route`] groups the
//! paths by the backend that must take part in serving them, expressed in
//! that backend's own coordinates. The same grouping decides who is enlisted
//! in a transaction, who is read from and who is written to.

use std::collections::BTreeMap;

use fedstore_core::Path;

/// Backend id to the paths (relative to that backend) it must serve.
pub type Routes = BTreeMap<String, Vec<Path>>;

/// Group `requested` by participating backend.
///
/// For every requested path `p` and every mount `m`:
///
/// - if `p` lies inside `m` (or is `m`), the mount owns `p` and receives it
///   with the mount prefix removed;
/// - otherwise, if `m` lies strictly beneath `p`, the mount receives its own
///   root because part of its data sits under `p`.
///
/// The builtin backend receives `p` unchanged unless some mount owns it.
/// Each backend's list keeps first-seen order and holds no duplicates.
/// Backends with nothing to serve are absent from the result.
pub fn route<'a, I>(builtin: &str, mounts: I, requested: &[Path]) -> Routes
where
    I: IntoIterator<Item = (&'a Path, &'a str)>,
{
    let mounts: Vec<(&Path, &str)> = mounts.into_iter().collect();
    let mut routes = Routes::new();

    for path in requested {
        let mut owned = false;
        for (mount, id) in &mounts {
            if let Some(relative) = path.strip_prefix(mount) {
                push(&mut routes, id, relative);
                owned = true;
            } else if mount.is_strict_descendant_of(path) {
                push(&mut routes, id, Path::root());
            }
        }
        if !owned {
            push(&mut routes, builtin, path.clone());
        }
    }

    log::trace!("routed {} path(s) to {:?}", requested.len(), routes);
    routes
}

fn push(routes: &mut Routes, id: &str, path: Path) {
    let paths = routes.entry(id.to_string()).or_default();
    if !paths.contains(&path) {
        paths.push(path);
    }
}
