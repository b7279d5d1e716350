//! The coordinator: one document tree over many backends.

use std::collections::BTreeSet;
use std::sync::Arc;

use fedstore_core::{
    Backend, Capability, Context, Error, Path, Pattern, Transaction, TransactionParams,
    TriggerEvent, TriggerHandle, Value, WriteOp,
};
use parking_lot::RwLock;

use crate::index::{Index, IndexManager};
use crate::mounts::{BackendRef, MountTable};
use crate::read::read_merged;
use crate::txn::TransactionManager;

/// Presents the builtin backend and every mount as one tree.
///
/// All operations take `&self`; a `Storage` is shared across threads behind
/// an `Arc` or a scoped borrow.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use fedstore::{Context, InMemoryStore, Storage, Value, WriteOp, path};
///
/// let builtin = InMemoryStore::from_json("builtin", r#"{"a": 1}"#).unwrap();
/// let roles = InMemoryStore::from_json("roles", r#"{"admin": true}"#).unwrap();
/// let storage = Storage::new(Arc::new(builtin));
/// storage.mount(Arc::new(roles), path!("/roles")).unwrap();
///
/// let cx = Context::new();
/// let txn = storage.new_transaction(&cx).unwrap();
/// storage.write(&cx, &txn, WriteOp::Add, &path!("/b"), Value::from(2i64)).unwrap();
/// assert_eq!(
///     storage.read(&cx, &txn, &path!("/roles/admin")).unwrap(),
///     Value::from(true)
/// );
/// storage.close(&cx, &txn);
/// ```
pub struct Storage {
    builtin: BackendRef,
    mounts: RwLock<MountTable>,
    transactions: TransactionManager,
    indexes: Arc<IndexManager>,
    trigger: Option<TriggerHandle>,
}

impl Storage {
    /// Create a coordinator whose builtin backend owns everything not mounted.
    ///
    /// If the builtin reports its own changes, indexes are also invalidated
    /// by writes that reach it without going through this coordinator.
    pub fn new(builtin: Arc<dyn Backend>) -> Self {
        let indexes = Arc::new(IndexManager::new());
        let trigger = builtin.as_trigger_source().map(|source| {
            let indexes = Arc::clone(&indexes);
            source.register_trigger(Box::new(move |event: &TriggerEvent| {
                indexes.invalidate(&event.path);
            }))
        });

        Self {
            builtin,
            mounts: RwLock::new(MountTable::new()),
            transactions: TransactionManager::new(),
            indexes,
            trigger,
        }
    }

    pub fn builtin_id(&self) -> &str {
        self.builtin.id()
    }

    /// Attach `backend` at `path`.
    ///
    /// Fails with a configuration error, leaving the table as it was, if
    /// `path` is the root or already mounted, or the backend's id is taken.
    pub fn mount(&self, backend: Arc<dyn Backend>, path: Path) -> Result<(), Error> {
        self.mounts.write().insert(self.builtin.id(), path, backend)
    }

    /// Every mount as (path, backend id), parents first.
    pub fn mounts(&self) -> Vec<(Path, String)> {
        self.mounts
            .read()
            .entries()
            .into_iter()
            .map(|(path, backend)| (path, backend.id().to_string()))
            .collect()
    }

    /// Open a transaction over the whole tree.
    pub fn new_transaction(&self, cx: &Context) -> Result<Transaction, Error> {
        self.new_transaction_with_params(cx, TransactionParams::new())
    }

    /// Open a transaction, enlisting the backends its scope routes to.
    pub fn new_transaction_with_params(
        &self,
        cx: &Context,
        params: TransactionParams,
    ) -> Result<Transaction, Error> {
        let participants = self
            .mounts
            .read()
            .participants(&self.builtin, &params.scope());
        self.transactions.begin(cx, params, participants)
    }

    /// Read `path`, merging in any mounts beneath it.
    pub fn read(&self, cx: &Context, txn: &Transaction, path: &Path) -> Result<Value, Error> {
        self.transactions.ensure_open(txn)?;
        let resolution = self.mounts.read().resolve(&self.builtin, path);
        read_merged(cx, txn, path, &resolution)
    }

    /// Apply one write operation at `path`.
    ///
    /// The write goes to the backend owning `path`. A path with mounts
    /// beneath it cannot be written as a whole.
    pub fn write(
        &self,
        cx: &Context,
        txn: &Transaction,
        op: WriteOp,
        path: &Path,
        value: Value,
    ) -> Result<(), Error> {
        self.transactions.ensure_open(txn)?;
        let resolution = self.mounts.read().resolve(&self.builtin, path);
        if let Some((nested, backend)) = resolution.nested.first() {
            return Err(Error::Unsupported {
                backend: backend.id().to_string(),
                operation: format!("writes spanning its mount point {}", path.join(nested)),
            });
        }

        let owner = &resolution.owner;
        let writer = owner
            .as_writer()
            .ok_or_else(|| Error::unsupported(owner.id(), Capability::Write))?;
        writer.write(cx, txn, op, &resolution.relative, value)?;

        // The builtin's own trigger already reported this write.
        if self.trigger.is_none() || owner.id() != self.builtin.id() {
            self.indexes.invalidate(path);
        }
        Ok(())
    }

    /// Build an index for `pattern` from the builtin backend's data.
    ///
    /// Requires a builtin that reports its changes, otherwise the index
    /// could go stale unnoticed.
    pub fn build_index(
        &self,
        cx: &Context,
        txn: &Transaction,
        pattern: &Pattern,
    ) -> Result<(), Error> {
        self.transactions.ensure_open(txn)?;
        if self.trigger.is_none() {
            return Err(Error::unsupported(self.builtin.id(), Capability::Trigger));
        }
        self.indexes
            .build(pattern, |prefix| self.builtin.read(cx, txn, prefix))?;
        Ok(())
    }

    pub fn index_exists(&self, pattern: &Pattern) -> bool {
        self.indexes.exists(pattern)
    }

    pub fn index(&self, pattern: &Pattern) -> Option<Arc<Index>> {
        self.indexes.get(pattern)
    }

    /// Close `txn` on every enlisted backend. Closing twice is a no-op.
    pub fn close(&self, cx: &Context, txn: &Transaction) {
        self.transactions.close(cx, txn);
    }

    /// Ids of the backends `txn` is enlisted with; empty once closed.
    pub fn enlisted(&self, txn: &Transaction) -> BTreeSet<String> {
        self.transactions.enlisted(txn)
    }

    pub fn is_open(&self, txn: &Transaction) -> bool {
        self.transactions.is_open(txn)
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        if let (Some(handle), Some(source)) = (self.trigger, self.builtin.as_trigger_source()) {
            source.unregister_trigger(handle);
        }
    }
}
