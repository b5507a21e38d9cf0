//! Weave: the state-transition core of a DAG-structured account ledger.
//!
//! Transactions reference prior transactions as parents, carry a
//! content-hash identity and a seed-derived criticality score, and are
//! applied to the account ledger through a typed, atomic processing
//! pipeline. Gossip, the HTTP API and consensus round selection live in
//! other crates and talk to this one at the boundaries in `engine`,
//! `storage` and `vm`.

pub mod config;
pub mod crypto;
pub mod dag;
pub mod engine;
pub mod ledger;
pub mod processor;
pub mod storage;
pub mod vm;

pub use dag::transaction::{AccountId, Signature, Tag, Transaction, TransactionId};
pub use engine::{Engine, EngineError};
pub use ledger::accounts::{Account, Ledger};
pub use processor::ProcessError;
