//! Asset registry.
//!
//! Every asset the engine can touch is identified by a symbol and lives in a
//! lending vault. The registry is the single place that knows each vault's
//! address and the decimal count used to scale human amounts.

use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vaultflow_core::Address;

/// A registered asset and the vault that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Ticker symbol (e.g. "USDC").
    pub symbol: String,
    /// Address of the asset's lending vault.
    pub vault: Address,
    /// Decimal places of the underlying token.
    pub decimals: u8,
}

/// Lookup table from symbol to [`Asset`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetRegistry {
    assets: BTreeMap<String, Asset>,
}

impl AssetRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The vaults deployed on the local development chain.
    #[must_use]
    pub fn devnet() -> Self {
        // Addresses are fixed by the devnet deployment script
        const VAULTS: [(&str, &str, u8); 6] = [
            ("WETH", "0x3b3112c4376d037822DECFf3Fe6CD30E1E726517", 18),
            ("wstETH", "0x94fFf89F1Bd236b709Ef01729Db481258015F8bf", 18),
            ("USDC", "0xF9Ec57D2436177B4Decf90Ef9EdffCef0cC0EE25", 6),
            ("USDT", "0x03d8C9d09623A6E51ccAb1d80Add8449FB1f35A7", 6),
            ("DAI", "0x5B2855689d05c9D081a1023dF585FaAae0b51832", 18),
            ("USDZ", "0x860cA3E2784a35F1f85B003975E0daBCb0d1FBbD", 18),
        ];

        let mut registry = Self::new();
        for (symbol, vault, decimals) in VAULTS {
            if let Ok(vault) = vault.parse() {
                registry.register(Asset {
                    symbol: symbol.to_string(),
                    vault,
                    decimals,
                });
            }
        }
        registry
    }

    /// Adds or replaces an asset.
    pub fn register(&mut self, asset: Asset) {
        self.assets.insert(asset.symbol.clone(), asset);
    }

    /// Looks up an asset by symbol, or by vault address.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::UnknownAsset`] if neither matches.
    pub fn get(&self, key: &str) -> Result<&Asset, ChainError> {
        if let Some(asset) = self.assets.get(key) {
            return Ok(asset);
        }

        // The editor may hand us a vault address instead of a symbol
        let by_vault = key
            .parse::<Address>()
            .ok()
            .and_then(|vault| self.assets.values().find(|asset| asset.vault == vault));

        by_vault.ok_or_else(|| ChainError::UnknownAsset {
            symbol: key.to_string(),
        })
    }

    /// Returns all registered assets ordered by symbol.
    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.values()
    }

    /// Returns the number of registered assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Returns true if no assets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devnet_registry_has_stablecoin_decimals() {
        let registry = AssetRegistry::devnet();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.get("USDC").unwrap().decimals, 6);
        assert_eq!(registry.get("USDT").unwrap().decimals, 6);
        assert_eq!(registry.get("WETH").unwrap().decimals, 18);
    }

    #[test]
    fn lookup_by_vault_address() {
        let registry = AssetRegistry::devnet();
        let asset = registry
            .get("0xF9Ec57D2436177B4Decf90Ef9EdffCef0cC0EE25")
            .expect("vault address should resolve");
        assert_eq!(asset.symbol, "USDC");
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let registry = AssetRegistry::devnet();
        assert_eq!(
            registry.get("DOGE"),
            Err(ChainError::UnknownAsset {
                symbol: "DOGE".to_string()
            })
        );
    }
}
