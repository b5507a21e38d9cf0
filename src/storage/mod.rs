// Storage abstraction for the durable account ledger - in-memory or RocksDB backed.
use std::sync::Arc;

use thiserror::Error;

use crate::dag::transaction::AccountId;
use crate::ledger::accounts::Account;
use crate::ledger::context::AccountDelta;

pub mod memory;
pub mod rocks;

// Re-exports
pub use memory::MemoryStore;
pub use rocks::RocksStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] rocksdb::Error),
    #[error("stored account record is not decodable: {0}")]
    Codec(#[from] bincode::Error),
}

/// Durable ledger collaborator. The engine talks to it at exactly two points:
/// read-through during apply, and one atomic commit per successful
/// transaction (or batch).
pub trait LedgerStore: Send + Sync {
    fn get_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError>;

    /// Apply all of one transaction's deltas as a single atomic group. Must
    /// never expose a state where only some of the group landed.
    fn commit(&self, deltas: &[(AccountId, AccountDelta)]) -> Result<(), StoreError>;

    fn accounts(&self) -> Result<Vec<(AccountId, Account)>, StoreError>;
}

/// Create a store backend: RocksDB when a path is given, in-memory otherwise.
pub fn open_store(path: Option<&str>) -> Result<Arc<dyn LedgerStore>, StoreError> {
    match path {
        Some(path) => Ok(Arc::new(RocksStore::open(path)?)),
        None => Ok(Arc::new(MemoryStore::new())),
    }
}
