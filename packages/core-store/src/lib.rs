//! Core types of the federated store.
//!
//! - `Path`: an ordered sequence of segments naming a tree location
//! - `Pattern`: a path with free-variable segments
//! - `Value`: the tree-shaped document every backend serves
//! - `Backend` and its capability traits (`Writer`, `Transactional`,
//!   `TriggerSource`)
//! - `Transaction` tokens, `Context`, and the shared `Error` type
//!
//! # Example
//!
//! ```rust
//! use fedstore_core::{Backend, Context, Error, Transaction, Value, path};
//!
//! fn read_user(store: &dyn Backend, txn: &Transaction) -> Result<Value, Error> {
//!     store.read(&Context::new(), txn, &path!("/users/123"))
//! }
//! ```

mod context;
mod error;
mod path;
mod path_trie;
mod pattern;
mod traits;
mod transaction;
mod value;

pub use context::Context;
pub use error::{Capability, Error};
pub use path::{Path, PathError};
pub use path_trie::{PathTrie, PathTrieIter};
pub use pattern::{Pattern, Term};
pub use traits::{
    Backend, Capabilities, Transactional, TriggerCallback, TriggerEvent, TriggerHandle,
    TriggerSource, WriteOp, Writer,
};
pub use transaction::{Transaction, TransactionId, TransactionParams};
pub use value::Value;
