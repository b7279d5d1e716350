//! In-memory JSON store.
//!
//! The default leaf backend: a single `Value` document behind a lock, with
//! write, trigger and transaction capabilities.

use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

use fedstore_core::{
    Backend, Context, Error, Path, Transaction, TransactionId, TransactionParams, Transactional,
    TriggerCallback, TriggerEvent, TriggerHandle, TriggerSource, Value, WriteOp, Writer,
};
use parking_lot::{Mutex, RwLock};

use crate::value_utils::{self, PatchError};

#[derive(Default)]
struct Triggers {
    next: u64,
    callbacks: BTreeMap<u64, Arc<TriggerCallback>>,
}

/// An in-memory store holding one JSON-shaped document.
///
/// # Example
///
/// ```rust
/// use fedstore_core::{
///     path, Backend, Context, Transaction, TransactionId, TransactionParams, Value,
/// };
/// use fedstore_json_store::InMemoryStore;
///
/// let store = InMemoryStore::from_json("builtin", r#"{"name": "Alice"}"#).unwrap();
/// let txn = Transaction::new(TransactionId(0), TransactionParams::new());
///
/// let value = store.read(&Context::new(), &txn, &path!("/name")).unwrap();
/// assert_eq!(value, Value::from("Alice"));
/// ```
pub struct InMemoryStore {
    id: String,
    root: RwLock<Value>,
    read_only: bool,
    triggers: Mutex<Triggers>,
    // Open transactions and whether each one writes.
    open: Mutex<BTreeMap<TransactionId, bool>>,
}

impl InMemoryStore {
    /// Create a store holding an empty map.
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_data(id, Value::map())
    }

    /// Create a store with initial data.
    pub fn with_data(id: impl Into<String>, root: Value) -> Self {
        Self {
            id: id.into(),
            root: RwLock::new(root),
            read_only: false,
            triggers: Mutex::new(Triggers::default()),
            open: Mutex::new(BTreeMap::new()),
        }
    }

    /// Create a store from a JSON document.
    pub fn from_json(id: impl Into<String>, json: &str) -> Result<Self, Error> {
        let root: Value = serde_json::from_str(json)?;
        Ok(Self::with_data(id, root))
    }

    /// Create a store from a reader yielding a JSON document.
    pub fn from_reader<R: io::Read>(id: impl Into<String>, reader: R) -> Result<Self, Error> {
        let root: Value = serde_json::from_reader(reader)?;
        Ok(Self::with_data(id, root))
    }

    /// Declare the store read-only: it will not expose the write capability.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// A copy of the whole document.
    pub fn snapshot(&self) -> Value {
        self.root.read().clone()
    }

    /// Transactions currently begun on this store.
    pub fn open_transactions(&self) -> Vec<TransactionId> {
        self.open.lock().keys().copied().collect()
    }

    /// Number of registered triggers.
    pub fn trigger_count(&self) -> usize {
        self.triggers.lock().callbacks.len()
    }

    fn patch_error(&self, err: PatchError) -> Error {
        match err {
            PatchError::NotFound(path) => Error::NotFound { path },
            PatchError::Invalid { .. } => Error::internal(&self.id, err.to_string()),
        }
    }

    fn fire(&self, event: &TriggerEvent) {
        // Callbacks run without any store lock held so they may call back in.
        let callbacks: Vec<Arc<TriggerCallback>> =
            self.triggers.lock().callbacks.values().cloned().collect();
        for callback in callbacks {
            callback(event);
        }
    }
}

impl Backend for InMemoryStore {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self, cx: &Context, _txn: &Transaction, path: &Path) -> Result<Value, Error> {
        cx.check()?;
        let root = self.root.read();
        root.get(path).cloned().ok_or_else(|| Error::not_found(path))
    }

    fn as_writer(&self) -> Option<&dyn Writer> {
        if self.read_only {
            None
        } else {
            Some(self)
        }
    }

    fn as_transactional(&self) -> Option<&dyn Transactional> {
        Some(self)
    }

    fn as_trigger_source(&self) -> Option<&dyn TriggerSource> {
        Some(self)
    }
}

impl Writer for InMemoryStore {
    fn write(
        &self,
        cx: &Context,
        txn: &Transaction,
        op: WriteOp,
        path: &Path,
        value: Value,
    ) -> Result<(), Error> {
        cx.check()?;
        {
            let mut root = self.root.write();
            value_utils::apply_patch(&mut root, op, path, value)
                .map_err(|e| self.patch_error(e))?;
        }
        log::debug!("{}: {} {} (txn {})", self.id, op, path, txn.id());

        self.fire(&TriggerEvent {
            txn: txn.id(),
            op,
            path: path.clone(),
        });
        Ok(())
    }
}

impl Transactional for InMemoryStore {
    fn begin(
        &self,
        cx: &Context,
        txn: &Transaction,
        params: &TransactionParams,
    ) -> Result<(), Error> {
        cx.check()?;
        let mut open = self.open.lock();
        if open.contains_key(&txn.id()) {
            return Err(Error::internal(
                &self.id,
                format!("transaction {} already begun", txn.id()),
            ));
        }
        // One writer at a time; readers are unrestricted.
        if params.write && open.values().any(|write| *write) {
            return Err(Error::internal(
                &self.id,
                "another write transaction is already open",
            ));
        }
        open.insert(txn.id(), params.write);
        Ok(())
    }

    fn close(&self, _cx: &Context, txn: &Transaction) {
        self.open.lock().remove(&txn.id());
    }
}

impl TriggerSource for InMemoryStore {
    fn register_trigger(&self, callback: TriggerCallback) -> TriggerHandle {
        let mut triggers = self.triggers.lock();
        let handle = triggers.next;
        triggers.next += 1;
        triggers.callbacks.insert(handle, Arc::new(callback));
        TriggerHandle(handle)
    }

    fn unregister_trigger(&self, handle: TriggerHandle) -> bool {
        self.triggers.lock().callbacks.remove(&handle.0).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedstore_core::{path, Capabilities};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn txn(id: u64) -> Transaction {
        Transaction::new(TransactionId(id), TransactionParams::new())
    }

    fn store() -> InMemoryStore {
        InMemoryStore::with_data("mem", Value::from(json!({"foo": {"bar": [1, 2, 3]}})))
    }

    #[test]
    fn read_nested_and_array_element() {
        let store = store();
        let cx = Context::new();
        assert_eq!(
            store.read(&cx, &txn(1), &path!("/foo/bar/1")).unwrap(),
            Value::from(2i64)
        );
        assert_eq!(
            store.read(&cx, &txn(1), &Path::root()).unwrap(),
            Value::from(json!({"foo": {"bar": [1, 2, 3]}}))
        );
    }

    #[test]
    fn read_missing_is_not_found() {
        let store = store();
        let err = store
            .read(&Context::new(), &txn(1), &path!("/foo/bar/7"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn write_then_read() {
        let store = store();
        let cx = Context::new();
        store
            .write(&cx, &txn(1), WriteOp::Add, &path!("/foo/baz"), Value::from("x"))
            .unwrap();
        assert_eq!(
            store.read(&cx, &txn(1), &path!("/foo/baz")).unwrap(),
            Value::from("x")
        );
    }

    #[test]
    fn invalid_patch_is_internal() {
        let store = store();
        let err = store
            .write(
                &Context::new(),
                &txn(1),
                WriteOp::Add,
                &path!("/foo/bar/notanindex"),
                Value::Null,
            )
            .unwrap_err();
        assert!(matches!(err, Error::Internal { ref backend, .. } if backend == "mem"));
    }

    #[test]
    fn cancelled_context_is_honored() {
        let store = store();
        let cx = Context::new();
        cx.cancel();
        assert!(matches!(
            store.read(&cx, &txn(1), &Path::root()),
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn read_only_hides_writer() {
        let store = store().read_only();
        assert_eq!(
            store.capabilities(),
            Capabilities {
                write: false,
                trigger: true,
                transactions: true,
            }
        );
    }

    #[test]
    fn triggers_fire_after_write_until_unregistered() {
        let store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = store.register_trigger(Box::new(move |event: &TriggerEvent| {
            sink.lock().push(event.clone());
        }));

        let cx = Context::new();
        store
            .write(&cx, &txn(4), WriteOp::Add, &path!("/foo/bar/-"), Value::from(4i64))
            .unwrap();
        assert_eq!(
            *seen.lock(),
            vec![TriggerEvent {
                txn: TransactionId(4),
                op: WriteOp::Add,
                path: path!("/foo/bar/-"),
            }]
        );

        assert_eq!(store.trigger_count(), 1);
        assert!(store.unregister_trigger(handle));
        assert!(!store.unregister_trigger(handle));
        assert_eq!(store.trigger_count(), 0);
        store
            .write(&cx, &txn(4), WriteOp::Remove, &path!("/foo/bar/0"), Value::Null)
            .unwrap();
        assert_eq!(seen.lock().len(), 1);
    }

    #[test]
    fn failed_write_does_not_fire() {
        let store = store();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        store.register_trigger(Box::new(move |_: &TriggerEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let _ = store.write(
            &Context::new(),
            &txn(1),
            WriteOp::Replace,
            &path!("/nope"),
            Value::Null,
        );
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn single_writer_transactions() {
        let store = store();
        let cx = Context::new();
        let write = TransactionParams::new().with_write(true);

        store.begin(&cx, &txn(1), &write).unwrap();
        store.begin(&cx, &txn(2), &TransactionParams::new()).unwrap();
        assert!(store.begin(&cx, &txn(3), &write).is_err());
        assert!(store.begin(&cx, &txn(2), &TransactionParams::new()).is_err());

        store.close(&cx, &txn(1));
        store.begin(&cx, &txn(3), &write).unwrap();
        assert_eq!(
            store.open_transactions(),
            vec![TransactionId(2), TransactionId(3)]
        );
    }

    #[test]
    fn from_json_and_reader() {
        let a = InMemoryStore::from_json("a", r#"{"x": [5, 6]}"#).unwrap();
        let b = InMemoryStore::from_reader("b", r#"{"x": [5, 6]}"#.as_bytes()).unwrap();
        assert_eq!(a.snapshot(), b.snapshot());
        assert!(matches!(
            InMemoryStore::from_json("c", "{not json"),
            Err(Error::Decode(_))
        ));
    }
}
