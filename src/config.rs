// src/config.rs
// Protocol constants and runtime-tunable configuration.

use log::warn;
use std::env;

/// Upper bound on the number of parents a single transaction may reference.
/// Decoders reject anything above this before allocating parent storage.
pub const MAX_PARENTS_PER_TX: usize = 32;

/// Gas allowance handed to a contract invocation when none is configured.
pub const DEFAULT_CONTRACT_GAS_LIMIT: u64 = 50_000_000;

/// Difficulty a transaction's seed must meet to count as critical.
pub const DEFAULT_CRITICAL_DIFFICULTY: u8 = 8;

/// Function invoked on a recipient contract when a transfer names none.
pub const FALLBACK_CONTRACT_FUNC: &str = "on_money_received";

#[derive(Debug, Clone)]
pub struct ProtocolConfig {
    pub critical_difficulty: u8,
    pub contract_gas_limit: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        ProtocolConfig {
            critical_difficulty: DEFAULT_CRITICAL_DIFFICULTY,
            contract_gas_limit: DEFAULT_CONTRACT_GAS_LIMIT,
        }
    }
}

impl ProtocolConfig {
    /// Build a config from `WEAVE_DIFFICULTY` / `WEAVE_GAS_LIMIT`.
    /// Malformed values fall back to the defaults with a warning instead of
    /// aborting startup.
    pub fn from_env() -> Self {
        let mut config = ProtocolConfig::default();

        if let Ok(raw) = env::var("WEAVE_DIFFICULTY") {
            match raw.parse::<u8>() {
                Ok(value) => config.critical_difficulty = value,
                Err(_) => warn!(
                    "WEAVE_DIFFICULTY={} is not a valid difficulty, using default {}",
                    raw, config.critical_difficulty
                ),
            }
        }

        if let Ok(raw) = env::var("WEAVE_GAS_LIMIT") {
            match raw.parse::<u64>() {
                Ok(value) if value > 0 => config.contract_gas_limit = value,
                _ => warn!(
                    "WEAVE_GAS_LIMIT={} is not a valid gas limit, using default {}",
                    raw, config.contract_gas_limit
                ),
            }
        }

        config
    }
}
