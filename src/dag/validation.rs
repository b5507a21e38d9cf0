// src/dag/validation.rs
use std::collections::HashSet;

use thiserror::Error;

use super::transaction::Transaction;
use crate::config::MAX_PARENTS_PER_TX;
use crate::crypto;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("transaction has {0} parents, protocol allows at most {MAX_PARENTS_PER_TX}")]
    TooManyParents(usize),
    #[error("transaction lists the same parent more than once")]
    DuplicateParent,
    #[error("sender signature does not verify against the sender account")]
    BadSenderSignature,
    #[error("creator signature does not verify against the creator account")]
    BadCreatorSignature,
}

/// Structural and signature checks that need no graph state. Callers feeding
/// the engine from untrusted peers run this between decode and dispatch.
pub fn validate_transaction(tx: &Transaction) -> Result<(), ValidationError> {
    if tx.parent_ids.len() > MAX_PARENTS_PER_TX {
        return Err(ValidationError::TooManyParents(tx.parent_ids.len()));
    }

    let mut seen = HashSet::with_capacity(tx.parent_ids.len());
    for parent_id in &tx.parent_ids {
        if !seen.insert(parent_id) {
            return Err(ValidationError::DuplicateParent);
        }
    }

    if !crypto::verify_ed25519(&tx.sender, &tx.sender_signature, &tx.sender_signing_bytes()) {
        return Err(ValidationError::BadSenderSignature);
    }
    if !crypto::verify_ed25519(
        &tx.creator,
        &tx.creator_signature,
        &tx.creator_signing_bytes(),
    ) {
        return Err(ValidationError::BadCreatorSignature);
    }

    Ok(())
}
