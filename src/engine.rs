// src/engine.rs
// Dispatch engine: Pending -> Applying -> {Committed | Rejected}. Exactly one
// transaction is applying per engine instance; staged writes reach the
// durable store only when its processor succeeds.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ProtocolConfig;
use crate::dag::transaction::{DecodeError, Transaction};
use crate::ledger::accounts::Ledger;
use crate::ledger::context::TransactionContext;
use crate::processor::{processor_for, ProcessError};
use crate::storage::{LedgerStore, StoreError};
use crate::vm::ContractVm;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("failed to commit ledger writes: {0}")]
    Commit(StoreError),
}

pub struct Engine {
    ledger: Ledger,
    vm: Arc<dyn ContractVm>,
    config: ProtocolConfig,
    apply_lock: Mutex<()>,
}

impl Engine {
    pub fn new(store: Arc<dyn LedgerStore>, vm: Arc<dyn ContractVm>, config: ProtocolConfig) -> Self {
        Engine {
            ledger: Ledger::new(store),
            vm,
            config,
            apply_lock: Mutex::new(()),
        }
    }

    /// Committed-state reads go through here, without the apply lock.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Wire entry point: decode (recomputing identity) and apply in one step.
    pub fn apply_bytes(&self, raw: &[u8]) -> Result<Transaction, EngineError> {
        let tx = Transaction::decode(raw)?;
        self.apply(&tx)?;
        Ok(tx)
    }

    /// Apply one decoded, already-validated transaction. Callers decide what
    /// to do with a rejection; nothing is retried here.
    pub fn apply(&self, tx: &Transaction) -> Result<(), EngineError> {
        let _applying = self.apply_lock.lock();

        let processor = match processor_for(tx.tag) {
            Some(processor) => processor,
            None => {
                return Err(EngineError::Process(ProcessError::UnsupportedTransactionType(
                    tx.tag,
                )))
            }
        };

        let mut ctx = TransactionContext::new(tx, &self.ledger, self.vm.as_ref(), &self.config);
        match processor.apply(&mut ctx) {
            Ok(()) => {
                let deltas = ctx.into_deltas();
                self.ledger.commit(&deltas).map_err(EngineError::Commit)?;
                info!(
                    id = %hex::encode(tx.id),
                    tag = tx.tag,
                    accounts = deltas.len(),
                    "transaction committed"
                );
                Ok(())
            }
            Err(err) => {
                // Staged writes die with the context; the caller hears the
                // exact processor error.
                debug!(id = %hex::encode(tx.id), tag = tx.tag, %err, "transaction rejected");
                Err(EngineError::Process(err))
            }
        }
    }
}
