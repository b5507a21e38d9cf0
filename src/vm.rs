// src/vm.rs
// WVM (Weave Virtual Machine) boundary. The ledger core only ever sees
// opaque memory snapshots and gas totals through the `ContractVm` trait;
// the wasmi-backed adapter below is one interchangeable implementation.
//
// Call input ABI: before an exported function runs, the adapter copies
// `amount (u64 LE) || params_len (u32 LE) || params` to linear memory
// offset 0. Exported entry points take no wasm-level parameters. The full
// post-call linear memory is the snapshot the ledger persists.

use bytes::BufMut;
use thiserror::Error;
use tracing::debug;

use crate::dag::transaction::AccountId;

#[derive(Debug, Error)]
pub enum InitError {
    #[error("contract code rejected: {0}")]
    InvalidCode(String),
    #[error("contract instantiation exhausted its gas allowance of {0}")]
    Exhausted(u64),
}

#[derive(Debug, Error)]
pub enum RunError {
    /// Non-fatal to opportunistic callers: the contract simply does not
    /// implement the invoked hook.
    #[error("contract does not export function {0:?}")]
    FunctionNotFound(String),
    #[error("contract call exhausted its gas allowance of {0}")]
    Exhausted(u64),
    #[error("contract call failed: {0}")]
    Failed(String),
}

/// A resumable contract instance: the code plus the opaque linear-memory
/// snapshot the ledger persists between invocations.
#[derive(Debug, Clone)]
pub struct VmHandle {
    pub account: AccountId,
    pub code: Vec<u8>,
    pub memory: Vec<u8>,
}

impl VmHandle {
    /// Rebuild a handle from state previously persisted to the ledger.
    pub fn resume(account: AccountId, code: Vec<u8>, memory: Option<Vec<u8>>) -> Self {
        VmHandle {
            account,
            code,
            memory: memory.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub output: Vec<u8>,
    pub gas_used: u64,
}

pub trait ContractVm: Send + Sync {
    /// Validate and instantiate fresh contract code, returning a handle whose
    /// memory snapshot reflects any module start code that ran.
    fn init(&self, account: AccountId, code: &[u8], gas_limit: u64)
        -> Result<VmHandle, InitError>;

    /// Invoke an exported function within the gas allowance, updating the
    /// handle's memory snapshot on success.
    fn run(
        &self,
        handle: &mut VmHandle,
        amount: u64,
        gas_limit: u64,
        func: &str,
        params: &[u8],
    ) -> Result<RunOutcome, RunError>;
}

const WASM_PAGE: usize = 65536;

enum SpawnError {
    Invalid(String),
    Exhausted,
}

struct WasmInstance {
    store: wasmi::Store<()>,
    instance: wasmi::Instance,
}

/// wasmi-backed executor. Fuel metering is the gas meter: one unit of fuel
/// is one unit of gas, and running dry surfaces as `Exhausted`.
pub struct WasmVm;

impl WasmVm {
    fn instantiate(code: &[u8], gas_limit: u64) -> Result<WasmInstance, SpawnError> {
        let mut config = wasmi::Config::default();
        config.consume_fuel(true);
        let engine = wasmi::Engine::new(&config);

        let module = wasmi::Module::new(&engine, code)
            .map_err(|err| SpawnError::Invalid(err.to_string()))?;

        let mut store = wasmi::Store::new(&engine, ());
        store
            .add_fuel(gas_limit)
            .map_err(|err| SpawnError::Invalid(err.to_string()))?;

        let linker = <wasmi::Linker<()>>::new(&engine);
        let pre = linker
            .instantiate(&mut store, &module)
            .map_err(|err| SpawnError::Invalid(err.to_string()))?;

        match pre.start(&mut store) {
            Ok(instance) => Ok(WasmInstance { store, instance }),
            Err(err) => {
                if fuel_spent(&store) >= gas_limit {
                    Err(SpawnError::Exhausted)
                } else {
                    Err(SpawnError::Invalid(err.to_string()))
                }
            }
        }
    }

    fn exported_memory(inst: &WasmInstance) -> Option<wasmi::Memory> {
        inst.instance
            .get_export(&inst.store, "memory")
            .and_then(wasmi::Extern::into_memory)
    }

    fn snapshot_memory(inst: &WasmInstance) -> Vec<u8> {
        Self::exported_memory(inst)
            .map(|memory| memory.data(&inst.store).to_vec())
            .unwrap_or_default()
    }

    fn ensure_capacity(
        memory: &wasmi::Memory,
        store: &mut wasmi::Store<()>,
        len: usize,
    ) -> Result<(), String> {
        let current = memory.data(&*store).len();
        if len <= current {
            return Ok(());
        }
        let extra_pages = (len - current + WASM_PAGE - 1) / WASM_PAGE;
        let extra_pages =
            u32::try_from(extra_pages).map_err(|_| "memory snapshot too large".to_string())?;
        let delta = wasmi::core::Pages::new(extra_pages)
            .ok_or_else(|| "memory snapshot too large".to_string())?;
        memory
            .grow(&mut *store, delta)
            .map_err(|err| err.to_string())?;
        Ok(())
    }

    fn restore_memory(inst: &mut WasmInstance, snapshot: &[u8]) -> Result<(), String> {
        let memory = match Self::exported_memory(inst) {
            Some(memory) => memory,
            None if snapshot.is_empty() => return Ok(()),
            None => return Err("contract exports no linear memory to restore".into()),
        };
        Self::ensure_capacity(&memory, &mut inst.store, snapshot.len())?;
        memory.data_mut(&mut inst.store)[..snapshot.len()].copy_from_slice(snapshot);
        Ok(())
    }

    fn write_call_input(inst: &mut WasmInstance, amount: u64, params: &[u8]) -> Result<(), String> {
        let memory = match Self::exported_memory(inst) {
            Some(memory) => memory,
            // No linear memory means nowhere to pass input; the call still runs.
            None => return Ok(()),
        };
        let mut input = Vec::with_capacity(12 + params.len());
        input.put_u64_le(amount);
        input.put_u32_le(params.len() as u32);
        input.extend_from_slice(params);

        Self::ensure_capacity(&memory, &mut inst.store, input.len())?;
        memory.data_mut(&mut inst.store)[..input.len()].copy_from_slice(&input);
        Ok(())
    }
}

fn fuel_spent(store: &wasmi::Store<()>) -> u64 {
    store.fuel_consumed().unwrap_or(0)
}

impl ContractVm for WasmVm {
    fn init(
        &self,
        account: AccountId,
        code: &[u8],
        gas_limit: u64,
    ) -> Result<VmHandle, InitError> {
        let inst = match Self::instantiate(code, gas_limit) {
            Ok(inst) => inst,
            Err(SpawnError::Exhausted) => return Err(InitError::Exhausted(gas_limit)),
            Err(SpawnError::Invalid(msg)) => return Err(InitError::InvalidCode(msg)),
        };

        let memory = Self::snapshot_memory(&inst);
        debug!(
            account = %hex::encode(account),
            code_len = code.len(),
            gas_used = fuel_spent(&inst.store),
            "contract module instantiated"
        );

        Ok(VmHandle {
            account,
            code: code.to_vec(),
            memory,
        })
    }

    fn run(
        &self,
        handle: &mut VmHandle,
        amount: u64,
        gas_limit: u64,
        func: &str,
        params: &[u8],
    ) -> Result<RunOutcome, RunError> {
        let mut inst = match Self::instantiate(&handle.code, gas_limit) {
            Ok(inst) => inst,
            Err(SpawnError::Exhausted) => return Err(RunError::Exhausted(gas_limit)),
            Err(SpawnError::Invalid(msg)) => return Err(RunError::Failed(msg)),
        };

        if !handle.memory.is_empty() {
            Self::restore_memory(&mut inst, &handle.memory).map_err(RunError::Failed)?;
        }

        // Resolve the export before touching memory so a missing hook leaves
        // no trace and costs nothing.
        let target = inst
            .instance
            .get_export(&inst.store, func)
            .and_then(wasmi::Extern::into_func)
            .ok_or_else(|| RunError::FunctionNotFound(func.to_string()))?;
        let target = target
            .typed::<(), ()>(&inst.store)
            .map_err(|_| RunError::FunctionNotFound(func.to_string()))?;

        Self::write_call_input(&mut inst, amount, params).map_err(RunError::Failed)?;

        if let Err(trap) = target.call(&mut inst.store, ()) {
            if fuel_spent(&inst.store) >= gas_limit {
                return Err(RunError::Exhausted(gas_limit));
            }
            return Err(RunError::Failed(trap.to_string()));
        }

        let gas_used = fuel_spent(&inst.store);
        handle.memory = Self::snapshot_memory(&inst);
        debug!(
            account = %hex::encode(handle.account),
            func,
            gas_used,
            "contract function returned"
        );

        // Contracts communicate results through their persisted memory; the
        // wasm entry points themselves return nothing.
        Ok(RunOutcome {
            output: Vec::new(),
            gas_used,
        })
    }
}
