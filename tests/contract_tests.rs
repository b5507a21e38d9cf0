// tests/contract_tests.rs
// End-to-end contract flows through the wasmi-backed VM, with fixtures
// compiled from WAT.
use std::sync::Arc;

use weave_dag::config::ProtocolConfig;
use weave_dag::dag::transaction::{AccountId, Tag, Transaction};
use weave_dag::engine::{Engine, EngineError};
use weave_dag::ledger::context::AccountDelta;
use weave_dag::processor::{ProcessError, TransferPayload};
use weave_dag::storage::MemoryStore;
use weave_dag::vm::WasmVm;

const ALICE: AccountId = [0xA1; 32];

const MEMORY_ONLY: &str = r#"(module (memory (export "memory") 1))"#;

// Bumps the byte at offset 64 on the fallback hook; "credit" pins it to 7.
const COUNTER: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "on_money_received")
    i32.const 64
    i32.const 64
    i32.load8_u
    i32.const 1
    i32.add
    i32.store8)
  (func (export "credit")
    i32.const 64
    i32.const 7
    i32.store8))
"#;

const TRAPPER: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "on_money_received") unreachable))
"#;

const SPINNER: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "on_money_received") (loop (br 0))))
"#;

fn wasm(wat_src: &str) -> Vec<u8> {
    wat::parse_str(wat_src).expect("valid wat")
}

fn engine() -> Engine {
    Engine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(WasmVm),
        ProtocolConfig::default(),
    )
}

fn fund(engine: &Engine, id: AccountId, balance: u64) {
    let delta = AccountDelta {
        balance: Some(balance),
        ..Default::default()
    };
    engine.ledger().commit(&[(id, delta)]).expect("fund account");
}

fn deploy(engine: &Engine, code: Vec<u8>) -> Transaction {
    let tx = Transaction::new(ALICE, ALICE, 0, vec![], 0, Tag::Contract, code);
    engine.apply(&tx).expect("deploy contract");
    tx
}

fn transfer_tx(recipient: AccountId, amount: u64, func: Option<&str>, params: &[u8]) -> Transaction {
    let payload = TransferPayload {
        recipient,
        amount,
        func_name: func.map(str::to_string),
        func_params: params.to_vec(),
    };
    Transaction::new(ALICE, ALICE, 1, vec![], 0, Tag::Transfer, payload.encode())
}

#[test]
fn deploy_persists_code_and_memory_snapshot() {
    let engine = engine();
    let code = wasm(MEMORY_ONLY);
    let tx = deploy(&engine, code.clone());

    assert_eq!(engine.ledger().contract_code(&tx.id).unwrap(), Some(code));
    let snapshot = engine
        .ledger()
        .contract_memory(&tx.id)
        .unwrap()
        .expect("snapshot persisted");
    assert_eq!(snapshot.len(), 65536);
}

#[test]
fn deploy_with_empty_payload_is_rejected() {
    let engine = engine();
    let tx = Transaction::new(ALICE, ALICE, 0, vec![], 0, Tag::Contract, vec![]);
    let err = engine.apply(&tx).expect_err("should reject");
    assert!(matches!(
        err,
        EngineError::Process(ProcessError::EmptyPayload)
    ));
}

#[test]
fn replaying_the_same_deploy_is_rejected() {
    let engine = engine();
    let tx = deploy(&engine, wasm(MEMORY_ONLY));

    // Identical fields, identical id, identical contract address.
    let err = engine.apply(&tx).expect_err("should reject");
    assert!(matches!(
        err,
        EngineError::Process(ProcessError::ContractAlreadyExists)
    ));
}

#[test]
fn garbage_code_is_rejected_as_invalid() {
    let engine = engine();
    let tx = Transaction::new(
        ALICE,
        ALICE,
        0,
        vec![],
        0,
        Tag::Contract,
        vec![0xDE, 0xAD, 0xBE, 0xEF],
    );
    let err = engine.apply(&tx).expect_err("should reject");
    assert!(matches!(
        err,
        EngineError::Process(ProcessError::InvalidContractCode(_))
    ));
    assert_eq!(engine.ledger().contract_code(&tx.id).unwrap(), None);
}

#[test]
fn transfer_invokes_the_fallback_hook_and_charges_gas() {
    let engine = engine();
    let contract = deploy(&engine, wasm(COUNTER)).id;
    fund(&engine, ALICE, 1_000_000);

    engine
        .apply(&transfer_tx(contract, 10, None, &[]))
        .expect("transfer");

    let snapshot = engine.ledger().contract_memory(&contract).unwrap().unwrap();
    assert_eq!(snapshot[64], 1, "hook ran once");
    assert_eq!(&snapshot[..8], &10u64.to_le_bytes(), "amount passed in");

    assert_eq!(engine.ledger().balance(&contract).unwrap(), 10);
    let sender_balance = engine.ledger().balance(&ALICE).unwrap();
    assert!(sender_balance < 1_000_000 - 10, "gas was charged");

    // A second transfer resumes the persisted snapshot.
    engine
        .apply(&transfer_tx(contract, 10, None, &[]))
        .expect("second transfer");
    let snapshot = engine.ledger().contract_memory(&contract).unwrap().unwrap();
    assert_eq!(snapshot[64], 2, "hook ran twice across invocations");
}

#[test]
fn transfer_can_name_the_function_and_pass_params() {
    let engine = engine();
    let contract = deploy(&engine, wasm(COUNTER)).id;
    fund(&engine, ALICE, 1_000_000);

    engine
        .apply(&transfer_tx(contract, 5, Some("credit"), &[0xCA, 0xFE]))
        .expect("transfer");

    let snapshot = engine.ledger().contract_memory(&contract).unwrap().unwrap();
    assert_eq!(snapshot[64], 7, "named function ran");
    assert_eq!(&snapshot[..8], &5u64.to_le_bytes());
    assert_eq!(&snapshot[8..12], &2u32.to_le_bytes());
    assert_eq!(&snapshot[12..14], &[0xCA, 0xFE]);
}

#[test]
fn contract_without_the_hook_receives_funds_for_free() {
    let engine = engine();
    let contract = deploy(&engine, wasm(MEMORY_ONLY)).id;
    fund(&engine, ALICE, 1000);

    engine
        .apply(&transfer_tx(contract, 10, None, &[]))
        .expect("transfer");

    // Exactly the principal moved; the missing hook cost nothing.
    assert_eq!(engine.ledger().balance(&ALICE).unwrap(), 990);
    assert_eq!(engine.ledger().balance(&contract).unwrap(), 10);
}

#[test]
fn trapping_hook_rejects_and_rolls_back() {
    let engine = engine();
    let contract = deploy(&engine, wasm(TRAPPER)).id;
    fund(&engine, ALICE, 1000);

    let err = engine
        .apply(&transfer_tx(contract, 10, None, &[]))
        .expect_err("should reject");
    assert!(matches!(
        err,
        EngineError::Process(ProcessError::ContractExecutionFailed(_))
    ));

    assert_eq!(engine.ledger().balance(&ALICE).unwrap(), 1000);
    assert_eq!(engine.ledger().balance(&contract).unwrap(), 0);
}

#[test]
fn runaway_hook_exhausts_its_allowance() {
    let config = ProtocolConfig {
        contract_gas_limit: 10_000,
        ..Default::default()
    };
    let engine = Engine::new(Arc::new(MemoryStore::new()), Arc::new(WasmVm), config);

    let contract = deploy(&engine, wasm(SPINNER)).id;
    fund(&engine, ALICE, 1000);

    let err = engine
        .apply(&transfer_tx(contract, 10, None, &[]))
        .expect_err("should reject");
    assert!(matches!(
        err,
        EngineError::Process(ProcessError::ExecutionExhausted(10_000))
    ));
    assert_eq!(engine.ledger().balance(&ALICE).unwrap(), 1000);
}
