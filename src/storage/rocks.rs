// src/storage/rocks.rs
use rocksdb::{WriteBatch, DB};

use super::{LedgerStore, StoreError};
use crate::dag::transaction::{AccountId, ACCOUNT_ID_LEN};
use crate::ledger::accounts::Account;
use crate::ledger::context::AccountDelta;

const ACCOUNT_PREFIX: &[u8] = b"acct:";

/// RocksDB-backed account store. Records are bincode-encoded under
/// "acct:<id>" keys; one transaction's deltas go down in one write batch.
pub struct RocksStore {
    db: DB,
}

fn account_key(id: &AccountId) -> Vec<u8> {
    let mut key = Vec::with_capacity(ACCOUNT_PREFIX.len() + id.len());
    key.extend_from_slice(ACCOUNT_PREFIX);
    key.extend_from_slice(id);
    key
}

impl RocksStore {
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let db = DB::open_default(path)?;
        Ok(RocksStore { db })
    }
}

impl LedgerStore for RocksStore {
    fn get_account(&self, id: &AccountId) -> Result<Option<Account>, StoreError> {
        match self.db.get(account_key(id))? {
            Some(raw) => Ok(Some(bincode::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    fn commit(&self, deltas: &[(AccountId, AccountDelta)]) -> Result<(), StoreError> {
        let mut batch = WriteBatch::default();
        for (id, delta) in deltas {
            let mut account = self.get_account(id)?.unwrap_or_default();
            delta.apply_to(&mut account);
            batch.put(account_key(id), bincode::serialize(&account)?);
        }
        self.db.write(batch)?;
        Ok(())
    }

    fn accounts(&self) -> Result<Vec<(AccountId, Account)>, StoreError> {
        let mut out = Vec::new();
        for item in self.db.prefix_iterator(ACCOUNT_PREFIX) {
            let (key, value) = item?;
            if !key.starts_with(ACCOUNT_PREFIX) {
                break;
            }
            if key.len() != ACCOUNT_PREFIX.len() + ACCOUNT_ID_LEN {
                continue;
            }
            let mut id = [0u8; ACCOUNT_ID_LEN];
            id.copy_from_slice(&key[ACCOUNT_PREFIX.len()..]);
            out.push((id, bincode::deserialize(&value)?));
        }
        Ok(out)
    }
}
