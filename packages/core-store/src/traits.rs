//! Backend traits.
//!
//! Every backend can be read. Writing, transactions and change triggers are
//! separate capability traits: a backend exposes one by returning `Some` from
//! the matching accessor on [`Backend`]. A backend that does not implement a
//! capability is detected structurally, without calling anything on it.

use std::fmt;

use crate::error::Capability;
use crate::{Context, Error, Path, Transaction, TransactionId, TransactionParams, Value};

/// The kind of mutation a write performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WriteOp {
    Add,
    Remove,
    Replace,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteOp::Add => "add",
            WriteOp::Remove => "remove",
            WriteOp::Replace => "replace",
        };
        f.write_str(name)
    }
}

/// The set of optional capabilities a backend declares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub write: bool,
    pub trigger: bool,
    pub transactions: bool,
}

impl Capabilities {
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Write => self.write,
            Capability::Trigger => self.trigger,
            Capability::Transactions => self.transactions,
        }
    }
}

/// A pluggable store that owns some subtree of the document.
///
/// A backend knows nothing about where it is mounted: every path it sees is
/// relative to its own root.
///
/// # Object Safety
///
/// This trait is object-safe: the coordinator holds `Arc<dyn Backend>`.
pub trait Backend: Send + Sync {
    /// Stable identifier, unique among the builtin and all mounts.
    fn id(&self) -> &str;

    /// Read the value at `path`.
    ///
    /// # Returns
    ///
    /// * `Ok(value)` - The value at the path.
    /// * `Err(Error::NotFound)` - Nothing exists at the path.
    /// * `Err(_)` - The backend failed.
    fn read(&self, cx: &Context, txn: &Transaction, path: &Path) -> Result<Value, Error>;

    /// The write capability, if declared.
    fn as_writer(&self) -> Option<&dyn Writer> {
        None
    }

    /// The transaction capability, if declared.
    fn as_transactional(&self) -> Option<&dyn Transactional> {
        None
    }

    /// The trigger capability, if declared.
    fn as_trigger_source(&self) -> Option<&dyn TriggerSource> {
        None
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            write: self.as_writer().is_some(),
            trigger: self.as_trigger_source().is_some(),
            transactions: self.as_transactional().is_some(),
        }
    }
}

/// Write capability.
pub trait Writer: Send + Sync {
    fn write(
        &self,
        cx: &Context,
        txn: &Transaction,
        op: WriteOp,
        path: &Path,
        value: Value,
    ) -> Result<(), Error>;
}

/// Transaction capability.
///
/// `begin` may block, queue or reject; the coordinator propagates whatever it
/// returns. `close` is called exactly once for every successful `begin`.
pub trait Transactional: Send + Sync {
    fn begin(&self, cx: &Context, txn: &Transaction, params: &TransactionParams)
        -> Result<(), Error>;

    fn close(&self, cx: &Context, txn: &Transaction);
}

/// A change the backend applied, reported to registered triggers.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerEvent {
    pub txn: TransactionId,
    pub op: WriteOp,
    pub path: Path,
}

pub type TriggerCallback = Box<dyn Fn(&TriggerEvent) + Send + Sync>;

/// Handle returned by [`TriggerSource::register_trigger`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct TriggerHandle(pub u64);

/// Trigger capability: the backend reports changes it applies.
pub trait TriggerSource: Send + Sync {
    fn register_trigger(&self, callback: TriggerCallback) -> TriggerHandle;

    /// Returns `false` if the handle was not registered.
    fn unregister_trigger(&self, handle: TriggerHandle) -> bool;
}
