// tests/db_smoke.rs
use tempfile::TempDir;

use weave_dag::ledger::context::AccountDelta;
use weave_dag::storage::{LedgerStore, RocksStore};

#[test]
fn account_state_survives_a_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().to_str().unwrap().to_string();

    {
        let store = RocksStore::open(&path).unwrap();
        store
            .commit(&[(
                [1u8; 32],
                AccountDelta {
                    balance: Some(42),
                    stake: Some(7),
                    contract_code: Some(vec![0xAB, 0xCD]),
                    contract_memory: None,
                },
            )])
            .unwrap();
    }

    let store = RocksStore::open(&path).unwrap();
    let account = store.get_account(&[1u8; 32]).unwrap().expect("persisted");
    assert_eq!((account.balance, account.stake), (42, 7));
    assert_eq!(account.contract_code, Some(vec![0xAB, 0xCD]));
    assert_eq!(account.contract_memory, None);
    assert_eq!(store.accounts().unwrap().len(), 1);
}

#[test]
fn partial_deltas_never_clobber_untouched_fields() {
    let dir = TempDir::new().unwrap();
    let store = RocksStore::open(dir.path().to_str().unwrap()).unwrap();

    store
        .commit(&[(
            [2u8; 32],
            AccountDelta {
                balance: Some(100),
                ..Default::default()
            },
        )])
        .unwrap();
    store
        .commit(&[(
            [2u8; 32],
            AccountDelta {
                stake: Some(30),
                ..Default::default()
            },
        )])
        .unwrap();

    let account = store.get_account(&[2u8; 32]).unwrap().unwrap();
    assert_eq!((account.balance, account.stake), (100, 30));
}

#[test]
fn unknown_accounts_read_as_absent() {
    let dir = TempDir::new().unwrap();
    let store = RocksStore::open(dir.path().to_str().unwrap()).unwrap();
    assert!(store.get_account(&[9u8; 32]).unwrap().is_none());
    assert!(store.accounts().unwrap().is_empty());
}

#[test]
fn multi_account_commit_lands_as_a_group() {
    let dir = TempDir::new().unwrap();
    let store = RocksStore::open(dir.path().to_str().unwrap()).unwrap();

    store
        .commit(&[
            (
                [3u8; 32],
                AccountDelta {
                    balance: Some(900),
                    ..Default::default()
                },
            ),
            (
                [4u8; 32],
                AccountDelta {
                    balance: Some(100),
                    ..Default::default()
                },
            ),
        ])
        .unwrap();

    assert_eq!(store.accounts().unwrap().len(), 2);
    assert_eq!(store.get_account(&[3u8; 32]).unwrap().unwrap().balance, 900);
    assert_eq!(store.get_account(&[4u8; 32]).unwrap().unwrap().balance, 100);
}
