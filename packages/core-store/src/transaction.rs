//! Transaction tokens and the parameters a transaction is opened with.

use std::fmt;

use crate::Path;

/// Opaque identifier of a transaction, unique per coordinator.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parameters a transaction is opened with.
///
/// `paths` is the transaction's scope: `None` means the whole tree. Backends
/// receive a copy with `paths` relativized to their own mount point.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionParams {
    pub paths: Option<Vec<Path>>,
    pub write: bool,
}

impl TransactionParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_paths(mut self, paths: Vec<Path>) -> Self {
        self.paths = Some(paths);
        self
    }

    #[must_use]
    pub fn with_write(mut self, write: bool) -> Self {
        self.write = write;
        self
    }

    /// The scope as a list of paths; the unrestricted scope is the root.
    pub fn scope(&self) -> Vec<Path> {
        match &self.paths {
            Some(paths) => paths.clone(),
            None => vec![Path::root()],
        }
    }
}

/// A handle to an open transaction.
///
/// Handed out by the coordinator and presented back on every read, write and
/// close. The handle itself holds no backend state; the coordinator keeps the
/// enlistment for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    id: TransactionId,
    params: TransactionParams,
}

impl Transaction {
    pub fn new(id: TransactionId, params: TransactionParams) -> Self {
        Self { id, params }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn params(&self) -> &TransactionParams {
        &self.params
    }

    pub fn is_write(&self) -> bool {
        self.params.write
    }
}
