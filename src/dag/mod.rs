pub mod transaction;
pub mod validation;

pub use transaction::{AccountId, DecodeError, Signature, Tag, Transaction, TransactionId};
pub use validation::{validate_transaction, ValidationError};
