// src/processor/batch.rs
use bytes::{Buf, BufMut};

use super::{contract, stake, transfer, ProcessError, TransactionProcessor};
use crate::dag::transaction::{DecodeError, Tag};
use crate::ledger::context::TransactionContext;

/// One sub-operation inside a batch: a tag plus the payload the matching
/// processor would have received as its own transaction payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub tag: u8,
    pub payload: Vec<u8>,
}

/// Batch payload wire layout: entry count (u8), then per entry a tag byte
/// and a u32 little-endian length-prefixed payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPayload {
    pub entries: Vec<BatchEntry>,
}

impl BatchPayload {
    pub fn decode(mut buf: &[u8]) -> Result<Self, DecodeError> {
        if !buf.has_remaining() {
            return Err(DecodeError::Truncated("batch size"));
        }
        let count = buf.get_u8() as usize;

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            if !buf.has_remaining() {
                return Err(DecodeError::Truncated("batch entry tag"));
            }
            let tag = buf.get_u8();

            if buf.remaining() < 4 {
                return Err(DecodeError::Truncated("batch entry length"));
            }
            let len = buf.get_u32_le() as usize;
            if buf.remaining() < len {
                return Err(DecodeError::Truncated("batch entry payload"));
            }
            let mut payload = vec![0u8; len];
            buf.copy_to_slice(&mut payload);

            entries.push(BatchEntry { tag, payload });
        }

        Ok(BatchPayload { entries })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Vec::with_capacity(1 + self.entries.len() * 5);
        w.put_u8(self.entries.len() as u8);
        for entry in &self.entries {
            w.put_u8(entry.tag);
            w.put_u32_le(entry.payload.len() as u32);
            w.extend_from_slice(&entry.payload);
        }
        w
    }
}

/// Tag 4. Applies every entry against the same staging context; the engine's
/// atomicity rule then covers the batch as a unit, so a failure partway
/// discards the writes of every member already applied.
pub struct BatchProcessor;

impl TransactionProcessor for BatchProcessor {
    fn apply(&self, ctx: &mut TransactionContext<'_>) -> Result<(), ProcessError> {
        let tx = ctx.transaction();
        apply_batch(ctx, &tx.payload)
    }
}

pub(crate) fn apply_batch(
    ctx: &mut TransactionContext<'_>,
    payload: &[u8],
) -> Result<(), ProcessError> {
    let batch = BatchPayload::decode(payload)?;

    for entry in &batch.entries {
        match Tag::from_byte(entry.tag) {
            Some(Tag::Nop) => {}
            Some(Tag::Transfer) => transfer::apply_transfer(ctx, &entry.payload)?,
            Some(Tag::Stake) => stake::apply_stake(ctx, &entry.payload)?,
            Some(Tag::Contract) => contract::apply_contract(ctx, &entry.payload)?,
            // Batches never nest; a nested batch sits outside the closed set.
            Some(Tag::Batch) | None => {
                return Err(ProcessError::UnsupportedTransactionType(entry.tag))
            }
        }
    }

    Ok(())
}
