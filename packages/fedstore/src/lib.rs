//! fedstore: one hierarchical document served by many backends.
//!
//! A [`Storage`] owns a builtin backend and a table of mounts. Every
//! operation is routed to the backends whose subtrees it touches:
//!
//! - reads that straddle a mount boundary are merged into one value
//! - transactions enlist exactly the backends their scope reaches, and are
//!   unwound if any of them refuses to begin
//! - writes go to the owning backend and drop any pattern index they could
//!   affect
//!
//! Backends implement [`Backend`] and declare optional capabilities
//! ([`Writer`], [`Transactional`], [`TriggerSource`]). [`InMemoryStore`] is
//! the bundled leaf backend.

pub mod config;
pub mod index;
pub mod mounts;
pub mod read;
pub mod router;
pub mod storage;
pub mod txn;

pub use config::{BackendConfig, BackendFactory, MemoryBackendFactory, MountConfig, StorageConfig};
pub use index::{Bindings, Index, IndexEntry, IndexManager};
pub use mounts::{MountTable, Resolution};
pub use router::{route, Routes};
pub use storage::Storage;
pub use txn::TransactionManager;

pub use fedstore_core::{
    path, pattern, Backend, Capabilities, Capability, Context, Error, Path, Pattern, Term,
    Transaction, TransactionId, TransactionParams, Transactional, TriggerCallback, TriggerEvent,
    TriggerHandle, TriggerSource, Value, WriteOp, Writer,
};
pub use fedstore_json_store::InMemoryStore;
