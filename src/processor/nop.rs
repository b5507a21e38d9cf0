// src/processor/nop.rs
use super::{ProcessError, TransactionProcessor};
use crate::ledger::context::TransactionContext;

/// Tag 0. Carries no state transition; used for graph upkeep transactions
/// that only contribute parents and depth.
pub struct NopProcessor;

impl TransactionProcessor for NopProcessor {
    fn apply(&self, _ctx: &mut TransactionContext<'_>) -> Result<(), ProcessError> {
        Ok(())
    }
}
