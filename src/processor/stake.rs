// src/processor/stake.rs
use bytes::{Buf, BufMut};

use super::{ProcessError, TransactionProcessor};
use crate::dag::transaction::DecodeError;
use crate::ledger::context::TransactionContext;

pub const STAKE_WITHDRAW: u8 = 0;
pub const STAKE_PLACE: u8 = 1;

/// Stake payload wire layout: flag byte (1 = place, 0 = withdraw) followed
/// by the delta as u64 little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakePayload {
    pub place: bool,
    pub delta: u64,
}

impl StakePayload {
    pub fn decode(mut buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.remaining() < 9 {
            return Err(DecodeError::Truncated("stake payload"));
        }
        let place = match buf.get_u8() {
            STAKE_PLACE => true,
            STAKE_WITHDRAW => false,
            _ => return Err(DecodeError::Malformed("stake flag must be 0 or 1")),
        };
        let delta = buf.get_u64_le();
        Ok(StakePayload { place, delta })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Vec::with_capacity(9);
        w.put_u8(if self.place { STAKE_PLACE } else { STAKE_WITHDRAW });
        w.put_u64_le(self.delta);
        w
    }
}

/// Tag 3. Moves value between an account's spendable balance and its
/// escrowed stake; the two sides always move by the same delta.
pub struct StakeProcessor;

impl TransactionProcessor for StakeProcessor {
    fn apply(&self, ctx: &mut TransactionContext<'_>) -> Result<(), ProcessError> {
        let tx = ctx.transaction();
        apply_stake(ctx, &tx.payload)
    }
}

pub(crate) fn apply_stake(
    ctx: &mut TransactionContext<'_>,
    payload: &[u8],
) -> Result<(), ProcessError> {
    let payload = StakePayload::decode(payload)?;
    let sender = ctx.transaction().sender;

    let balance = ctx.read_account_balance(&sender)?;
    let stake = ctx.read_account_stake(&sender)?;

    if payload.place {
        if balance < payload.delta {
            return Err(ProcessError::InsufficientBalance {
                need: payload.delta,
                have: balance,
            });
        }
        let staked = stake
            .checked_add(payload.delta)
            .ok_or(ProcessError::BalanceOverflow)?;
        ctx.write_account_balance(&sender, balance - payload.delta);
        ctx.write_account_stake(&sender, staked);
    } else {
        if stake < payload.delta {
            return Err(ProcessError::InsufficientStake {
                need: payload.delta,
                have: stake,
            });
        }
        let credited = balance
            .checked_add(payload.delta)
            .ok_or(ProcessError::BalanceOverflow)?;
        ctx.write_account_balance(&sender, credited);
        ctx.write_account_stake(&sender, stake - payload.delta);
    }

    Ok(())
}
