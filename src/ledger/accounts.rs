// src/ledger/accounts.rs
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::dag::transaction::AccountId;
use crate::ledger::context::AccountDelta;
use crate::storage::{LedgerStore, StoreError};

/// Ledger-resident account state. Accounts come into existence lazily: an
/// identifier nobody has written to reads back as the default record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub balance: u64,
    pub stake: u64,
    /// Presence marks the account as a smart contract.
    pub contract_code: Option<Vec<u8>>,
    /// Opaque linear-memory snapshot owned by the contract VM; persisted and
    /// retrieved as a blob, never inspected.
    pub contract_memory: Option<Vec<u8>>,
}

/// Facade over the durable account store. Reads served here observe the
/// last-committed state; per-transaction mutation goes through a
/// `TransactionContext` instead.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Ledger { store }
    }

    pub fn account(&self, id: &AccountId) -> Result<Account, StoreError> {
        Ok(self.store.get_account(id)?.unwrap_or_default())
    }

    pub fn balance(&self, id: &AccountId) -> Result<u64, StoreError> {
        Ok(self.account(id)?.balance)
    }

    pub fn stake(&self, id: &AccountId) -> Result<u64, StoreError> {
        Ok(self.account(id)?.stake)
    }

    pub fn contract_code(&self, id: &AccountId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.account(id)?.contract_code)
    }

    pub fn contract_memory(&self, id: &AccountId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.account(id)?.contract_memory)
    }

    /// Flush one transaction's staged writes as a single atomic group.
    pub fn commit(&self, deltas: &[(AccountId, AccountDelta)]) -> Result<(), StoreError> {
        self.store.commit(deltas)
    }

    /// JSON summary of every account, keyed by hex account id. Debugging and
    /// operator tooling only; not a wire format.
    pub fn export_state(&self) -> Result<serde_json::Value, StoreError> {
        let mut out = serde_json::Map::new();
        for (id, account) in self.store.accounts()? {
            out.insert(
                hex::encode(id),
                json!({
                    "balance": account.balance,
                    "stake": account.stake,
                    "contract": account.contract_code.is_some(),
                }),
            );
        }
        Ok(serde_json::Value::Object(out))
    }
}
