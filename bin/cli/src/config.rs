//! Command line configuration.
//!
//! Loaded via the `config` crate from an optional file, then from
//! environment variables prefixed `VAULTFLOW_` with `__` separating nested
//! keys, e.g. `VAULTFLOW_ACCOUNT__ADDRESS=0x…`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use vaultflow_chain::DevnetConfig;
use vaultflow_chain::dry_run::DEFAULT_GAS_PER_OPERATION;
use vaultflow_core::Address;
use vaultflow_workflow::EngineConfig;

/// Configuration composed from library configs.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    /// Connected account.
    #[serde(default)]
    pub account: AccountConfig,

    /// Engine settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Devnet chain and dry-run executor settings.
    #[serde(default)]
    pub devnet: DevnetSection,
}

/// The account workflows run as. `--account` takes precedence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub address: Option<Address>,
}

/// Devnet settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DevnetSection {
    /// Swap pool owned by the operator account.
    #[serde(default)]
    pub pool: Option<Address>,

    /// Exchange rates keyed `"IN/OUT"`.
    #[serde(default)]
    pub quotes: BTreeMap<String, String>,

    /// Per-swap input limits keyed by symbol.
    #[serde(default)]
    pub limits: BTreeMap<String, String>,

    /// Account balances keyed by symbol.
    #[serde(default)]
    pub balances: BTreeMap<String, String>,

    /// Gas the dry-run executor reports per operation.
    #[serde(default = "default_gas_per_operation")]
    pub gas_per_operation: u64,
}

impl DevnetSection {
    /// Returns the settings served by the devnet chain client.
    #[must_use]
    pub fn chain(&self) -> DevnetConfig {
        DevnetConfig {
            pool: self.pool.clone(),
            quotes: self.quotes.clone(),
            limits: self.limits.clone(),
            balances: self.balances.clone(),
        }
    }
}

fn default_gas_per_operation() -> u64 {
    DEFAULT_GAS_PER_OPERATION
}

impl Default for DevnetSection {
    fn default() -> Self {
        Self {
            pool: None,
            quotes: BTreeMap::new(),
            limits: BTreeMap::new(),
            balances: BTreeMap::new(),
            gas_per_operation: default_gas_per_operation(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from `file`, if given, and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed, or if a value
    /// has the wrong type.
    pub fn load(file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix("VAULTFLOW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
