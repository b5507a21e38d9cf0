// src/processor/transfer.rs
use bytes::{Buf, BufMut};
use tracing::debug;

use super::{ProcessError, TransactionProcessor};
use crate::config::FALLBACK_CONTRACT_FUNC;
use crate::dag::transaction::{AccountId, DecodeError, ACCOUNT_ID_LEN};
use crate::ledger::context::TransactionContext;
use crate::vm::{RunError, VmHandle};

/// Transfer payload wire layout (little-endian, processor-local):
/// recipient, amount, then optionally a function name + parameter blob for
/// invoking the recipient contract. The length-prefixed tail is either fully
/// present or fully absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPayload {
    pub recipient: AccountId,
    pub amount: u64,
    pub func_name: Option<String>,
    pub func_params: Vec<u8>,
}

impl TransferPayload {
    pub fn decode(mut buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.remaining() < ACCOUNT_ID_LEN {
            return Err(DecodeError::Truncated("transfer recipient"));
        }
        let mut recipient = [0u8; ACCOUNT_ID_LEN];
        buf.copy_to_slice(&mut recipient);

        if buf.remaining() < 8 {
            return Err(DecodeError::Truncated("transfer amount"));
        }
        let amount = buf.get_u64_le();

        let mut func_name = None;
        let mut func_params = Vec::new();
        if buf.has_remaining() {
            let raw_name = read_chunk(&mut buf, "transfer function name")?;
            let name = String::from_utf8(raw_name)
                .map_err(|_| DecodeError::Malformed("transfer function name is not utf-8"))?;
            func_name = Some(name);
            func_params = read_chunk(&mut buf, "transfer function params")?;
        }

        Ok(TransferPayload {
            recipient,
            amount,
            func_name,
            func_params,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Vec::with_capacity(ACCOUNT_ID_LEN + 8 + 8 + self.func_params.len());
        w.extend_from_slice(&self.recipient);
        w.put_u64_le(self.amount);
        if let Some(name) = &self.func_name {
            w.put_u32_le(name.len() as u32);
            w.extend_from_slice(name.as_bytes());
            w.put_u32_le(self.func_params.len() as u32);
            w.extend_from_slice(&self.func_params);
        }
        w
    }
}

fn read_chunk(buf: &mut &[u8], what: &'static str) -> Result<Vec<u8>, DecodeError> {
    if buf.remaining() < 4 {
        return Err(DecodeError::Truncated(what));
    }
    let len = buf.get_u32_le() as usize;
    if buf.remaining() < len {
        return Err(DecodeError::Truncated(what));
    }
    let mut out = vec![0u8; len];
    buf.copy_to_slice(&mut out);
    Ok(out)
}

/// Tag 1. Moves native currency and, when the recipient is a contract,
/// notifies it within a bounded gas allowance paid by the sender.
pub struct TransferProcessor;

impl TransactionProcessor for TransferProcessor {
    fn apply(&self, ctx: &mut TransactionContext<'_>) -> Result<(), ProcessError> {
        let tx = ctx.transaction();
        apply_transfer(ctx, &tx.payload)
    }
}

pub(crate) fn apply_transfer(
    ctx: &mut TransactionContext<'_>,
    payload: &[u8],
) -> Result<(), ProcessError> {
    let payload = TransferPayload::decode(payload)?;
    let sender = ctx.transaction().sender;

    let sender_balance = ctx.read_account_balance(&sender)?;
    if sender_balance < payload.amount {
        return Err(ProcessError::InsufficientBalance {
            need: payload.amount,
            have: sender_balance,
        });
    }
    ctx.write_account_balance(&sender, sender_balance - payload.amount);

    let recipient_balance = ctx.read_account_balance(&payload.recipient)?;
    let credited = recipient_balance
        .checked_add(payload.amount)
        .ok_or(ProcessError::BalanceOverflow)?;
    ctx.write_account_balance(&payload.recipient, credited);

    let code = match ctx.read_account_contract_code(&payload.recipient)? {
        Some(code) => code,
        None => return Ok(()),
    };

    let gas_limit = ctx.config().contract_gas_limit;
    let snapshot = ctx.read_account_contract_memory(&payload.recipient)?;
    let mut handle = VmHandle::resume(payload.recipient, code, snapshot);

    let func = payload.func_name.as_deref().unwrap_or(FALLBACK_CONTRACT_FUNC);
    let outcome = match ctx
        .vm()
        .run(&mut handle, payload.amount, gas_limit, func, &payload.func_params)
    {
        Ok(outcome) => outcome,
        Err(RunError::FunctionNotFound(name)) => {
            // Contracts are not required to implement the hook. Nothing ran,
            // so nothing is charged and no snapshot is written.
            debug!(func = %name, "recipient contract does not implement the invoked function");
            return Ok(());
        }
        Err(RunError::Exhausted(limit)) => return Err(ProcessError::ExecutionExhausted(limit)),
        Err(err) => return Err(ProcessError::ContractExecutionFailed(err.to_string())),
    };

    // Gas comes out of the balance already reduced by the principal; the
    // sufficiency check runs against that remainder.
    let remaining = ctx.read_account_balance(&sender)?;
    if remaining < outcome.gas_used {
        return Err(ProcessError::InsufficientBalance {
            need: outcome.gas_used,
            have: remaining,
        });
    }
    ctx.write_account_balance(&sender, remaining - outcome.gas_used);
    ctx.write_account_contract_memory(&payload.recipient, handle.memory);

    debug!(
        gas = outcome.gas_used,
        sender = %hex::encode(sender),
        contract = %hex::encode(payload.recipient),
        "deducted gas for contract invocation"
    );

    Ok(())
}
