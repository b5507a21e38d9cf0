// src/storage/memory.rs
use dashmap::DashMap;

use super::{LedgerStore, StoreError};
use crate::dag::transaction::AccountId;
use crate::ledger::accounts::Account;
use crate::ledger::context::AccountDelta;

/// In-memory account store. The default backend for tests and for nodes that
/// rebuild state from the graph on startup.
#[derive(Default)]
pub struct MemoryStore {
    accounts: DashMap<AccountId, Account>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            accounts: DashMap::new(),
        }
    }
}

impl LedgerStore for MemoryStore {
    fn get_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.get(id).map(|entry| entry.clone()))
    }

    fn commit(&self, deltas: &[(AccountId, AccountDelta)]) -> Result<(), StoreError> {
        // Single-writer discipline in the engine makes this loop atomic from
        // every reader's point of view at the account granularity.
        for (id, delta) in deltas {
            let mut entry = self.accounts.entry(*id).or_default();
            delta.apply_to(&mut entry);
        }
        Ok(())
    }

    fn accounts(&self) -> Result<Vec<(AccountId, Account)>, StoreError> {
        Ok(self
            .accounts
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect())
    }
}
