pub mod accounts;
pub mod context;

pub use accounts::{Account, Ledger};
pub use context::{AccountDelta, TransactionContext};
