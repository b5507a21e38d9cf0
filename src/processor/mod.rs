// src/processor/mod.rs
// One state-transition function per transaction tag, plus the closed
// dispatch table the engine routes through. Processors read and write
// exclusively via the TransactionContext handed to them.

use thiserror::Error;

use crate::dag::transaction::{DecodeError, Tag};
use crate::ledger::context::TransactionContext;
use crate::storage::StoreError;

pub mod batch;
pub mod contract;
pub mod nop;
pub mod stake;
pub mod transfer;

pub use batch::{BatchEntry, BatchPayload, BatchProcessor};
pub use contract::ContractProcessor;
pub use nop::NopProcessor;
pub use stake::{StakePayload, StakeProcessor};
pub use transfer::{TransferPayload, TransferProcessor};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: u64, have: u64 },
    #[error("insufficient stake: need {need}, have {have}")]
    InsufficientStake { need: u64, have: u64 },
    #[error("contract: no code supplied to spawn")]
    EmptyPayload,
    #[error("contract: account already holds contract code")]
    ContractAlreadyExists,
    #[error("contract: code rejected by the vm: {0}")]
    InvalidContractCode(String),
    #[error("unsupported transaction tag {0}")]
    UnsupportedTransactionType(u8),
    #[error("contract execution failed: {0}")]
    ContractExecutionFailed(String),
    #[error("contract execution exhausted its gas allowance of {0}")]
    ExecutionExhausted(u64),
    #[error("balance overflow while crediting account")]
    BalanceOverflow,
    #[error("malformed payload: {0}")]
    Payload(#[from] DecodeError),
    #[error("ledger store: {0}")]
    Store(#[from] StoreError),
}

pub trait TransactionProcessor: Send + Sync {
    fn apply(&self, ctx: &mut TransactionContext<'_>) -> Result<(), ProcessError>;
}

/// Closed dispatch table: every known tag maps to exactly one processor.
/// Unknown tags fall outside the set and the engine rejects them uniformly.
pub fn processor_for(tag: u8) -> Option<&'static dyn TransactionProcessor> {
    match Tag::from_byte(tag)? {
        Tag::Nop => Some(&NopProcessor),
        Tag::Transfer => Some(&TransferProcessor),
        Tag::Contract => Some(&ContractProcessor),
        Tag::Stake => Some(&StakeProcessor),
        Tag::Batch => Some(&BatchProcessor),
    }
}
