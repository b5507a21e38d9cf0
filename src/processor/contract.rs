// src/processor/contract.rs
use tracing::debug;

use super::{ProcessError, TransactionProcessor};
use crate::ledger::context::TransactionContext;
use crate::vm::InitError;

/// Tag 2. Spawns a contract at the account addressed by the spawning
/// transaction's own id, so a contract's address is the content hash of the
/// transaction that deployed it.
pub struct ContractProcessor;

impl TransactionProcessor for ContractProcessor {
    fn apply(&self, ctx: &mut TransactionContext<'_>) -> Result<(), ProcessError> {
        let tx = ctx.transaction();
        apply_contract(ctx, &tx.payload)
    }
}

pub(crate) fn apply_contract(
    ctx: &mut TransactionContext<'_>,
    payload: &[u8],
) -> Result<(), ProcessError> {
    if payload.is_empty() {
        return Err(ProcessError::EmptyPayload);
    }

    let contract_id = ctx.transaction().id;
    if ctx.read_account_contract_code(&contract_id)?.is_some() {
        return Err(ProcessError::ContractAlreadyExists);
    }

    let gas_limit = ctx.config().contract_gas_limit;
    let handle = match ctx.vm().init(contract_id, payload, gas_limit) {
        Ok(handle) => handle,
        Err(InitError::Exhausted(limit)) => return Err(ProcessError::ExecutionExhausted(limit)),
        Err(InitError::InvalidCode(msg)) => return Err(ProcessError::InvalidContractCode(msg)),
    };

    ctx.write_account_contract_code(&contract_id, payload.to_vec());
    ctx.write_account_contract_memory(&contract_id, handle.memory);

    debug!(contract = %hex::encode(contract_id), code_len = payload.len(), "contract spawned");
    Ok(())
}
