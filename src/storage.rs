//! Storage contracts consumed by the query layer.
//!
//! The transactional key-value engine lives outside this crate. Plans only
//! need two capabilities from it:
//!
//! - **Txn**: point lookups and cursor creation
//! - **Cursor**: seek plus ordered forward iteration
//!
//! Cursors must yield keys in ascending byte-lexicographic order and signal
//! exhaustion with `Ok(None)`. Errors are passed through plans untouched.
//!
//! `MemoryStore` is an in-process implementation backed by a `BTreeMap`,
//! used by the `kvq` tool and the test suites.

pub mod error;
pub mod memory;

use crate::access::KvPair;
use anyhow::Result;
use bytes::Bytes;

pub use error::{StorageError, StorageResult};
pub use memory::{MemoryCursor, MemoryStore, MemoryTxn};

/// A read view over the key-value store
pub trait Txn {
    /// Open a cursor positioned before the first key.
    fn cursor(&self) -> Result<Box<dyn Cursor + '_>>;

    /// Look up a single key. Returns None when the key is absent.
    fn get(&self, key: &[u8]) -> Result<Option<Bytes>>;
}

/// Forward iterator over rows in key order
pub trait Cursor {
    /// Position the cursor so the next row is the first key >= `key`.
    fn seek(&mut self, key: &[u8]) -> Result<()>;

    /// Get the next row, or None once the cursor is exhausted.
    fn next(&mut self) -> Result<Option<KvPair>>;
}
