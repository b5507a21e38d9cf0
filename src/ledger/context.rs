// src/ledger/context.rs
// Per-transaction staging overlay. All writes a processor makes land here;
// the engine merges them into the durable store only on success.

use std::collections::HashMap;

use crate::config::ProtocolConfig;
use crate::dag::transaction::{AccountId, Transaction};
use crate::ledger::accounts::{Account, Ledger};
use crate::storage::StoreError;
use crate::vm::ContractVm;

/// One account's staged writes within a single transaction application.
/// `None` means "field untouched", so commits never clobber state a
/// processor did not write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountDelta {
    pub balance: Option<u64>,
    pub stake: Option<u64>,
    pub contract_code: Option<Vec<u8>>,
    pub contract_memory: Option<Vec<u8>>,
}

impl AccountDelta {
    pub fn is_empty(&self) -> bool {
        self.balance.is_none()
            && self.stake.is_none()
            && self.contract_code.is_none()
            && self.contract_memory.is_none()
    }

    /// Merge this delta into an account record.
    pub fn apply_to(&self, account: &mut Account) {
        if let Some(balance) = self.balance {
            account.balance = balance;
        }
        if let Some(stake) = self.stake {
            account.stake = stake;
        }
        if let Some(code) = &self.contract_code {
            account.contract_code = Some(code.clone());
        }
        if let Some(memory) = &self.contract_memory {
            account.contract_memory = Some(memory.clone());
        }
    }
}

/// The ledger view handed to a processor: the transaction under application,
/// read-through access to committed state, staged writes, and the contract
/// VM capability. Scoped to exactly one apply; dropped on rejection.
pub struct TransactionContext<'a> {
    tx: &'a Transaction,
    ledger: &'a Ledger,
    vm: &'a dyn ContractVm,
    config: &'a ProtocolConfig,
    staged: HashMap<AccountId, AccountDelta>,
}

impl<'a> TransactionContext<'a> {
    pub fn new(
        tx: &'a Transaction,
        ledger: &'a Ledger,
        vm: &'a dyn ContractVm,
        config: &'a ProtocolConfig,
    ) -> Self {
        TransactionContext {
            tx,
            ledger,
            vm,
            config,
            staged: HashMap::new(),
        }
    }

    pub fn transaction(&self) -> &'a Transaction {
        self.tx
    }

    pub fn vm(&self) -> &'a dyn ContractVm {
        self.vm
    }

    pub fn config(&self) -> &'a ProtocolConfig {
        self.config
    }

    pub fn read_account_balance(&self, id: &AccountId) -> Result<u64, StoreError> {
        if let Some(delta) = self.staged.get(id) {
            if let Some(balance) = delta.balance {
                return Ok(balance);
            }
        }
        self.ledger.balance(id)
    }

    pub fn write_account_balance(&mut self, id: &AccountId, balance: u64) {
        self.staged.entry(*id).or_default().balance = Some(balance);
    }

    pub fn read_account_stake(&self, id: &AccountId) -> Result<u64, StoreError> {
        if let Some(delta) = self.staged.get(id) {
            if let Some(stake) = delta.stake {
                return Ok(stake);
            }
        }
        self.ledger.stake(id)
    }

    pub fn write_account_stake(&mut self, id: &AccountId, stake: u64) {
        self.staged.entry(*id).or_default().stake = Some(stake);
    }

    pub fn read_account_contract_code(
        &self,
        id: &AccountId,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(delta) = self.staged.get(id) {
            if let Some(code) = &delta.contract_code {
                return Ok(Some(code.clone()));
            }
        }
        self.ledger.contract_code(id)
    }

    pub fn write_account_contract_code(&mut self, id: &AccountId, code: Vec<u8>) {
        self.staged.entry(*id).or_default().contract_code = Some(code);
    }

    pub fn read_account_contract_memory(
        &self,
        id: &AccountId,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        if let Some(delta) = self.staged.get(id) {
            if let Some(memory) = &delta.contract_memory {
                return Ok(Some(memory.clone()));
            }
        }
        self.ledger.contract_memory(id)
    }

    pub fn write_account_contract_memory(&mut self, id: &AccountId, memory: Vec<u8>) {
        self.staged.entry(*id).or_default().contract_memory = Some(memory);
    }

    /// Consume the overlay into a commit-ready delta list, sorted by account
    /// id so the durable store sees writes in a reproducible order.
    pub fn into_deltas(self) -> Vec<(AccountId, AccountDelta)> {
        let mut deltas: Vec<_> = self
            .staged
            .into_iter()
            .filter(|(_, delta)| !delta.is_empty())
            .collect();
        deltas.sort_by(|a, b| a.0.cmp(&b.0));
        deltas
    }
}
