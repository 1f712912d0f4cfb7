//! Chain client for the local development chain.
//!
//! Builds operations with the trait's default call shapes against the devnet
//! vault registry and answers queries from configuration: a single swap pool
//! owned by the operator account, a table of exchange rates, optional pool
//! capacity limits, and starting balances.

use crate::asset::{Asset, AssetRegistry};
use crate::client::ChainClient;
use crate::error::ChainError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use vaultflow_core::{Address, parse_units};

/// Fixed-point scale of configured exchange rates.
const RATE_DECIMALS: u8 = 9;

/// Settings for [`DevnetClient`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DevnetConfig {
    /// Swap pool owned by the operator account, if one is deployed.
    #[serde(default)]
    pub pool: Option<Address>,

    /// Exchange rates keyed `"IN/OUT"`, as decimal strings of OUT per IN.
    #[serde(default)]
    pub quotes: BTreeMap<String, String>,

    /// Maximum input the pool accepts per swap, keyed by input symbol, in
    /// human units.
    #[serde(default)]
    pub limits: BTreeMap<String, String>,

    /// Account balances keyed by symbol, in human units.
    #[serde(default)]
    pub balances: BTreeMap<String, String>,
}

/// A [`ChainClient`] that answers from static devnet configuration.
#[derive(Debug, Clone)]
pub struct DevnetClient {
    registry: AssetRegistry,
    pool: Option<Address>,
    // Keys are uppercased so lookups survive config layers that fold case
    rates: HashMap<(String, String), u128>,
    limits: HashMap<String, u128>,
    balances: HashMap<String, u128>,
}

impl DevnetClient {
    /// Creates a client over the devnet asset registry.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidConfig`] if a quote key is not of the form
    /// `IN/OUT`, names an unknown asset, or an amount fails to parse.
    pub fn new(config: &DevnetConfig) -> Result<Self, ChainError> {
        Self::with_registry(AssetRegistry::devnet(), config)
    }

    /// Creates a client over a custom registry.
    ///
    /// # Errors
    ///
    /// See [`DevnetClient::new`].
    pub fn with_registry(
        registry: AssetRegistry,
        config: &DevnetConfig,
    ) -> Result<Self, ChainError> {
        let mut rates = HashMap::new();
        for (pair, rate) in &config.quotes {
            let (token_in, token_out) = pair.split_once('/').ok_or_else(|| {
                ChainError::InvalidConfig {
                    reason: format!("quote key '{pair}' must look like IN/OUT"),
                }
            })?;
            let token_in = canonical_symbol(&registry, token_in)?;
            let token_out = canonical_symbol(&registry, token_out)?;
            let rate = parse_amount(rate, RATE_DECIMALS)?;
            rates.insert((key(&token_in), key(&token_out)), rate);
        }

        let mut limits = HashMap::new();
        for (symbol, limit) in &config.limits {
            let asset = lookup(&registry, symbol)?;
            limits.insert(key(&asset.symbol), parse_amount(limit, asset.decimals)?);
        }

        let mut balances = HashMap::new();
        for (symbol, balance) in &config.balances {
            let asset = lookup(&registry, symbol)?;
            balances.insert(key(&asset.symbol), parse_amount(balance, asset.decimals)?);
        }

        Ok(Self {
            registry,
            pool: config.pool.clone(),
            rates,
            limits,
            balances,
        })
    }
}

fn key(symbol: &str) -> String {
    symbol.to_ascii_uppercase()
}

fn lookup<'a>(registry: &'a AssetRegistry, symbol: &str) -> Result<&'a Asset, ChainError> {
    let symbol = symbol.trim();
    registry
        .get(symbol)
        .ok()
        .or_else(|| registry.iter().find(|asset| asset.symbol.eq_ignore_ascii_case(symbol)))
        .ok_or_else(|| ChainError::InvalidConfig {
            reason: format!("unknown asset '{symbol}'"),
        })
}

fn canonical_symbol(registry: &AssetRegistry, symbol: &str) -> Result<String, ChainError> {
    lookup(registry, symbol).map(|asset| asset.symbol.clone())
}

fn parse_amount(value: &str, decimals: u8) -> Result<u128, ChainError> {
    parse_units(value, decimals).map_err(|e| ChainError::InvalidConfig {
        reason: e.to_string(),
    })
}

/// Converts `amount_in` base units of one asset into the other at a
/// fixed-point rate, rescaling between the two decimal counts.
fn convert(amount_in: u128, rate: u128, decimals_in: u8, decimals_out: u8) -> Option<u128> {
    let rate_scale = 10u128.pow(u32::from(RATE_DECIMALS));
    let scaled = amount_in.checked_mul(rate)?;
    if decimals_out >= decimals_in {
        let factor = 10u128.checked_pow(u32::from(decimals_out - decimals_in))?;
        scaled.checked_mul(factor).map(|v| v / rate_scale)
    } else {
        let factor = 10u128.checked_pow(u32::from(decimals_in - decimals_out))?;
        Some(scaled / rate_scale.checked_mul(factor)?)
    }
}

#[async_trait]
impl ChainClient for DevnetClient {
    fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    async fn get_pool(&self, account: &Address) -> Result<Option<Address>, ChainError> {
        debug!(%account, pool = ?self.pool, "pool lookup");
        Ok(self.pool.clone().filter(|pool| !pool.is_zero()))
    }

    async fn get_quote(
        &self,
        pool: &Address,
        token_in: &Asset,
        token_out: &Asset,
        amount_in: u128,
    ) -> Result<u128, ChainError> {
        if self.pool.as_ref() != Some(pool) {
            return Err(ChainError::QueryFailed {
                query: "computeQuote".to_string(),
                reason: format!("no pool deployed at {pool}"),
            });
        }

        if let Some(&limit) = self.limits.get(&key(&token_in.symbol))
            && amount_in > limit
        {
            return Err(ChainError::PoolCapacityExceeded {
                pool: pool.to_string(),
                amount_in,
                limit,
            });
        }

        let rate = self
            .rates
            .get(&(key(&token_in.symbol), key(&token_out.symbol)))
            .copied()
            .ok_or_else(|| ChainError::QuoteUnavailable {
                token_in: token_in.symbol.clone(),
                token_out: token_out.symbol.clone(),
            })?;

        convert(amount_in, rate, token_in.decimals, token_out.decimals).ok_or_else(|| {
            ChainError::QueryFailed {
                query: "computeQuote".to_string(),
                reason: "quote overflowed".to_string(),
            }
        })
    }

    async fn balance_of(&self, asset: &Asset, account: &Address) -> Result<u128, ChainError> {
        debug!(%account, asset = %asset.symbol, "balance lookup");
        Ok(self.balances.get(&key(&asset.symbol)).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL: &str = "0x018ECbAD742Fa1ce05efd0981f36Eb14D9625e14";

    fn config() -> DevnetConfig {
        DevnetConfig {
            pool: Some(POOL.parse().unwrap()),
            quotes: BTreeMap::from([
                ("WETH/USDC".to_string(), "3000".to_string()),
                ("usdc/weth".to_string(), "0.0003".to_string()),
            ]),
            limits: BTreeMap::from([("WETH".to_string(), "50".to_string())]),
            balances: BTreeMap::from([("USDC".to_string(), "2500.5".to_string())]),
        }
    }

    fn account() -> Address {
        "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse().unwrap()
    }

    #[tokio::test]
    async fn quotes_rescale_between_decimals() {
        let client = DevnetClient::new(&config()).unwrap();
        let weth = client.asset("WETH").unwrap();
        let usdc = client.asset("USDC").unwrap();
        let pool = client.get_pool(&account()).await.unwrap().unwrap();

        let one_weth = 10u128.pow(18);
        let out = client.get_quote(&pool, &weth, &usdc, one_weth).await.unwrap();
        assert_eq!(out, 3_000_000_000);

        let back = client.get_quote(&pool, &usdc, &weth, 3_000_000_000).await.unwrap();
        assert_eq!(back, 900_000_000_000_000_000);
    }

    #[tokio::test]
    async fn quote_beyond_limit_is_capacity_error() {
        let client = DevnetClient::new(&config()).unwrap();
        let weth = client.asset("WETH").unwrap();
        let usdc = client.asset("USDC").unwrap();
        let pool: Address = POOL.parse().unwrap();

        let err = client
            .get_quote(&pool, &weth, &usdc, 51 * 10u128.pow(18))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::PoolCapacityExceeded { .. }));
    }

    #[tokio::test]
    async fn missing_pair_is_unavailable() {
        let client = DevnetClient::new(&config()).unwrap();
        let dai = client.asset("DAI").unwrap();
        let usdc = client.asset("USDC").unwrap();
        let pool: Address = POOL.parse().unwrap();

        let err = client.get_quote(&pool, &dai, &usdc, 1).await.unwrap_err();
        assert!(matches!(err, ChainError::QuoteUnavailable { .. }));
    }

    #[tokio::test]
    async fn no_pool_configured() {
        let client = DevnetClient::new(&DevnetConfig::default()).unwrap();
        assert_eq!(client.get_pool(&account()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn balances_come_from_config() {
        let client = DevnetClient::new(&config()).unwrap();
        let usdc = client.asset("USDC").unwrap();
        let weth = client.asset("WETH").unwrap();
        assert_eq!(client.balance_of(&usdc, &account()).await.unwrap(), 2_500_500_000);
        assert_eq!(client.balance_of(&weth, &account()).await.unwrap(), 0);
    }

    #[test]
    fn rejects_malformed_quote_keys() {
        let mut config = config();
        config.quotes.insert("WETHUSDC".to_string(), "1".to_string());
        let err = DevnetClient::new(&config).unwrap_err();
        assert!(matches!(err, ChainError::InvalidConfig { .. }));
    }

    #[test]
    fn builders_target_the_vault() {
        let client = DevnetClient::new(&config()).unwrap();
        let usdc = client.asset("USDC").unwrap();
        let op = client.build_supply(&usdc, crate::Quantity::Units(80_000_000), &account());
        assert_eq!(op.kind, crate::OperationKind::Supply);
        assert_eq!(op.target, usdc.vault);
        assert_eq!(op.payload["amount"], "80000000");
    }
}
