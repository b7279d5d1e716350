#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use fedstore::{
    Backend, Context, Error, InMemoryStore, Path, Transaction, TransactionId, TransactionParams,
    Transactional, TriggerSource, Value, Writer,
};
use parking_lot::Mutex;
use serde_json::json;

/// What a [`MockBackend`] saw.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Begin(TransactionId, Vec<Path>),
    Close(TransactionId),
    Read(Path),
}

/// A read-only transactional backend that records every call.
pub struct MockBackend {
    id: String,
    data: Value,
    refuse_begin: bool,
    pub calls: Mutex<Vec<Call>>,
}

impl MockBackend {
    pub fn new(id: &str, data: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            data: Value::from(data),
            refuse_begin: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn empty(id: &str) -> Arc<Self> {
        Self::new(id, json!({}))
    }

    /// A backend whose begin always fails.
    pub fn refusing(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            data: Value::map(),
            refuse_begin: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn begins(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Begin(..)))
            .count()
    }

    pub fn closes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Close(_)))
            .count()
    }
}

impl Backend for MockBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self, cx: &Context, _txn: &Transaction, path: &Path) -> Result<Value, Error> {
        cx.check()?;
        self.calls.lock().push(Call::Read(path.clone()));
        self.data.get(path).cloned().ok_or_else(|| Error::not_found(path))
    }

    fn as_transactional(&self) -> Option<&dyn Transactional> {
        Some(self)
    }
}

impl Transactional for MockBackend {
    fn begin(
        &self,
        _cx: &Context,
        txn: &Transaction,
        params: &TransactionParams,
    ) -> Result<(), Error> {
        if self.refuse_begin {
            return Err(Error::internal(&self.id, "begin refused"));
        }
        self.calls
            .lock()
            .push(Call::Begin(txn.id(), params.scope()));
        Ok(())
    }

    fn close(&self, _cx: &Context, txn: &Transaction) {
        self.calls.lock().push(Call::Close(txn.id()));
    }
}

pub fn ids(names: &[&str]) -> std::collections::BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// An in-memory store whose next read can be held open until released.
pub struct GatedStore {
    inner: InMemoryStore,
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
    released: AtomicBool,
}

impl GatedStore {
    pub fn new(id: &str, data: serde_json::Value) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryStore::with_data(id, Value::from(data)),
            gate: Mutex::new(None),
            released: AtomicBool::new(false),
        })
    }

    /// Hold the next read. Returns a receiver that fires once that read has
    /// started, and the sender that lets it finish.
    pub fn arm(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.gate.lock() = Some((entered_tx, release_rx));
        self.released.store(false, Ordering::SeqCst);
        (entered_rx, release_tx)
    }

    /// Whether the last held read was released rather than timing out.
    pub fn was_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

impl Backend for GatedStore {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn read(&self, cx: &Context, txn: &Transaction, path: &Path) -> Result<Value, Error> {
        let gate = self.gate.lock().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let released = release.recv_timeout(Duration::from_secs(5)).is_ok();
            self.released.store(released, Ordering::SeqCst);
        }
        self.inner.read(cx, txn, path)
    }

    fn as_writer(&self) -> Option<&dyn Writer> {
        self.inner.as_writer()
    }

    fn as_transactional(&self) -> Option<&dyn Transactional> {
        self.inner.as_transactional()
    }

    fn as_trigger_source(&self) -> Option<&dyn TriggerSource> {
        self.inner.as_trigger_source()
    }
}
