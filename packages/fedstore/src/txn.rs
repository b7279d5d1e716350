//! Transaction bookkeeping: which backends each open transaction enlisted.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fedstore_core::{Context, Error, Path, Transaction, TransactionId, TransactionParams};
use parking_lot::Mutex;

use crate::mounts::BackendRef;

/// Backends that began a transaction, in the order they began.
#[derive(Default)]
struct Enlistment {
    backends: Vec<BackendRef>,
}

impl Enlistment {
    fn ids(&self) -> BTreeSet<String> {
        self.backends.iter().map(|b| b.id().to_string()).collect()
    }

    /// Close every enlisted backend, last begun first, and forget them.
    fn close_all(&mut self, cx: &Context, txn: &Transaction) {
        while let Some(backend) = self.backends.last() {
            if let Some(transactional) = backend.as_transactional() {
                transactional.close(cx, txn);
            }
            self.backends.pop();
        }
    }
}

/// The enlistment table.
///
/// The map from token to enlistment is shared by every transaction and
/// serializes its own mutations. Each enlistment has its own lock, so work
/// on one transaction never waits on backend calls made for another.
#[derive(Default)]
pub struct TransactionManager {
    next_id: AtomicU64,
    active: Mutex<HashMap<TransactionId, Arc<Mutex<Enlistment>>>>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a transaction on every participant that supports transactions.
    ///
    /// Participants without the capability are routed to but not enlisted.
    /// If any begin fails, every backend that already began receives a
    /// close before the error is returned, and the transaction is never
    /// registered.
    pub fn begin(
        &self,
        cx: &Context,
        params: TransactionParams,
        participants: Vec<(BackendRef, Vec<Path>)>,
    ) -> Result<Transaction, Error> {
        let id = TransactionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let txn = Transaction::new(id, params);
        let mut enlistment = Enlistment::default();

        for (backend, paths) in participants {
            let Some(transactional) = backend.as_transactional() else {
                log::trace!("txn {}: '{}' is not transactional", id, backend.id());
                continue;
            };
            let relative = TransactionParams {
                paths: Some(paths),
                write: txn.is_write(),
            };
            if let Err(err) = transactional.begin(cx, &txn, &relative) {
                log::warn!(
                    "txn {}: begin failed on '{}', closing {} enlisted backend(s)",
                    id,
                    backend.id(),
                    enlistment.backends.len()
                );
                enlistment.close_all(cx, &txn);
                return Err(Error::Transaction {
                    txn: id,
                    message: format!("begin failed on backend '{}'", backend.id()),
                    source: Some(Box::new(err)),
                });
            }
            enlistment.backends.push(backend);
        }

        log::debug!("txn {}: began on {:?}", id, enlistment.ids());
        self.active
            .lock()
            .insert(id, Arc::new(Mutex::new(enlistment)));
        Ok(txn)
    }

    /// Close every backend enlisted for `txn`. Unknown or already closed
    /// tokens are ignored.
    pub fn close(&self, cx: &Context, txn: &Transaction) {
        let Some(entry) = self.active.lock().get(&txn.id()).cloned() else {
            log::trace!("txn {}: close of unknown transaction", txn.id());
            return;
        };
        entry.lock().close_all(cx, txn);
        self.active.lock().remove(&txn.id());
        log::debug!("txn {}: closed", txn.id());
    }

    /// Ids of the backends currently enlisted for `txn`; empty once closed.
    pub fn enlisted(&self, txn: &Transaction) -> BTreeSet<String> {
        let Some(entry) = self.active.lock().get(&txn.id()).cloned() else {
            return BTreeSet::new();
        };
        let ids = entry.lock().ids();
        ids
    }

    pub fn is_open(&self, txn: &Transaction) -> bool {
        self.active.lock().contains_key(&txn.id())
    }

    /// `Err(Error::Transaction)` unless `txn` is open.
    pub fn ensure_open(&self, txn: &Transaction) -> Result<(), Error> {
        if self.is_open(txn) {
            Ok(())
        } else {
            Err(Error::Transaction {
                txn: txn.id(),
                message: "transaction is not open".to_string(),
                source: None,
            })
        }
    }

    /// Number of open transactions.
    pub fn len(&self) -> usize {
        self.active.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedstore_core::{path, Backend, Transactional, Value};

    #[derive(Default)]
    struct Journal {
        log: Mutex<Vec<String>>,
    }

    struct Participant {
        id: &'static str,
        fail: bool,
        journal: Arc<Journal>,
    }

    impl Backend for Participant {
        fn id(&self) -> &str {
            self.id
        }

        fn read(&self, _cx: &Context, _txn: &Transaction, _path: &Path) -> Result<Value, Error> {
            Ok(Value::Null)
        }

        fn as_transactional(&self) -> Option<&dyn Transactional> {
            Some(self)
        }
    }

    impl Transactional for Participant {
        fn begin(
            &self,
            _cx: &Context,
            _txn: &Transaction,
            params: &TransactionParams,
        ) -> Result<(), Error> {
            if self.fail {
                return Err(Error::internal(self.id, "refused"));
            }
            let paths: Vec<String> = params.scope().iter().map(|p| p.to_string()).collect();
            self.journal
                .log
                .lock()
                .push(format!("begin {} {}", self.id, paths.join(",")));
            Ok(())
        }

        fn close(&self, _cx: &Context, _txn: &Transaction) {
            self.journal.log.lock().push(format!("close {}", self.id));
        }
    }

    struct Plain;

    impl Backend for Plain {
        fn id(&self) -> &str {
            "plain"
        }

        fn read(&self, _cx: &Context, _txn: &Transaction, _path: &Path) -> Result<Value, Error> {
            Ok(Value::Null)
        }
    }

    fn participant(id: &'static str, fail: bool, journal: &Arc<Journal>) -> BackendRef {
        Arc::new(Participant {
            id,
            fail,
            journal: Arc::clone(journal),
        })
    }

    #[test]
    fn begin_passes_relative_scope_and_close_reverses() {
        let journal = Arc::new(Journal::default());
        let manager = TransactionManager::new();
        let cx = Context::new();

        let txn = manager
            .begin(
                &cx,
                TransactionParams::new(),
                vec![
                    (participant("a", false, &journal), vec![path!("/x")]),
                    (participant("b", false, &journal), vec![Path::root()]),
                ],
            )
            .unwrap();
        assert!(manager.is_open(&txn));
        let expected: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(manager.enlisted(&txn), expected);

        manager.close(&cx, &txn);
        assert!(!manager.is_open(&txn));
        assert!(manager.enlisted(&txn).is_empty());
        assert_eq!(
            *journal.log.lock(),
            vec!["begin a /x", "begin b /", "close b", "close a"]
        );
    }

    #[test]
    fn failed_begin_unwinds_enlisted_backends() {
        let journal = Arc::new(Journal::default());
        let manager = TransactionManager::new();

        let err = manager
            .begin(
                &Context::new(),
                TransactionParams::new(),
                vec![
                    (participant("a", false, &journal), vec![Path::root()]),
                    (participant("b", true, &journal), vec![Path::root()]),
                    (participant("c", false, &journal), vec![Path::root()]),
                ],
            )
            .unwrap_err();

        assert!(matches!(err, Error::Transaction { source: Some(_), .. }));
        assert_eq!(*journal.log.lock(), vec!["begin a /", "close a"]);
        assert!(manager.is_empty());
    }

    #[test]
    fn non_transactional_backends_are_not_enlisted() {
        let manager = TransactionManager::new();
        let txn = manager
            .begin(
                &Context::new(),
                TransactionParams::new(),
                vec![(Arc::new(Plain) as BackendRef, vec![Path::root()])],
            )
            .unwrap();
        assert!(manager.is_open(&txn));
        assert!(manager.enlisted(&txn).is_empty());
    }

    #[test]
    fn close_is_idempotent() {
        let journal = Arc::new(Journal::default());
        let manager = TransactionManager::new();
        let cx = Context::new();
        let txn = manager
            .begin(
                &cx,
                TransactionParams::new(),
                vec![(participant("a", false, &journal), vec![Path::root()])],
            )
            .unwrap();

        manager.close(&cx, &txn);
        manager.close(&cx, &txn);
        assert_eq!(*journal.log.lock(), vec!["begin a /", "close a"]);
        assert!(manager.ensure_open(&txn).is_err());
    }

    #[test]
    fn tokens_are_distinct() {
        let manager = TransactionManager::new();
        let cx = Context::new();
        let a = manager.begin(&cx, TransactionParams::new(), Vec::new()).unwrap();
        let b = manager.begin(&cx, TransactionParams::new(), Vec::new()).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(manager.len(), 2);
    }
}
