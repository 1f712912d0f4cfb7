//! Traits the workflow engine consumes.
//!
//! [`ChainClient`] bundles the primitive operation builders with the
//! read-only queries the compiler needs (pool lookup, quotes, balances).
//! [`BatchExecutor`] is the single submission entry point. Both are injected
//! into the orchestrator, so tests can swap in scripted implementations
//! without touching a chain.

use crate::asset::{Asset, AssetRegistry};
use crate::error::ChainError;
use crate::operation::{BatchReceipt, Operation, OperationKind, Quantity};
use async_trait::async_trait;
use serde_json::json;
use vaultflow_core::Address;

/// Builders and read-only queries against the lending protocol.
///
/// Builders have default implementations producing the standard call shapes
/// for the registry's vaults; implementors only need to supply the registry
/// and the queries.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// The assets this client knows about.
    fn registry(&self) -> &AssetRegistry;

    /// Looks up an asset by symbol or vault address.
    fn asset(&self, symbol: &str) -> Result<Asset, ChainError> {
        self.registry().get(symbol).cloned()
    }

    /// Deposits `amount` into the asset's vault, crediting `account`.
    fn build_supply(&self, asset: &Asset, amount: Quantity, account: &Address) -> Operation {
        Operation::new(
            OperationKind::Supply,
            asset.vault.clone(),
            json!({ "asset": asset.symbol, "amount": amount, "receiver": account }),
        )
    }

    /// Withdraws `amount` from the asset's vault to `recipient`.
    fn build_withdraw(&self, asset: &Asset, amount: Quantity, recipient: &Address) -> Operation {
        Operation::new(
            OperationKind::Withdraw,
            asset.vault.clone(),
            json!({ "asset": asset.symbol, "amount": amount, "receiver": recipient }),
        )
    }

    /// Borrows `amount` from the asset's vault and sends it to `recipient`.
    fn build_borrow(&self, asset: &Asset, amount: Quantity, recipient: &Address) -> Operation {
        Operation::new(
            OperationKind::Borrow,
            asset.vault.clone(),
            json!({ "asset": asset.symbol, "amount": amount, "receiver": recipient }),
        )
    }

    /// Repays `amount` of `account`'s debt in the asset's vault.
    fn build_repay(&self, asset: &Asset, amount: Quantity, account: &Address) -> Operation {
        Operation::new(
            OperationKind::Repay,
            asset.vault.clone(),
            json!({ "asset": asset.symbol, "amount": amount, "account": account }),
        )
    }

    /// Makes the asset's vault a controller of `account`.
    fn build_enable_controller(&self, asset: &Asset, account: &Address) -> Operation {
        Operation::new(
            OperationKind::EnableController,
            asset.vault.clone(),
            json!({ "asset": asset.symbol, "account": account }),
        )
    }

    /// Lets `account` use its deposit in the asset's vault as collateral.
    fn build_enable_collateral(&self, asset: &Asset, account: &Address) -> Operation {
        Operation::new(
            OperationKind::EnableCollateral,
            asset.vault.clone(),
            json!({ "asset": asset.symbol, "account": account }),
        )
    }

    /// Swaps exactly `amount_in` of `token_in` for at least `min_amount_out`
    /// of `token_out` through `pool`.
    fn build_swap(
        &self,
        pool: &Address,
        token_in: &Asset,
        token_out: &Asset,
        amount_in: u128,
        min_amount_out: u128,
        recipient: &Address,
    ) -> Operation {
        Operation::new(
            OperationKind::Swap,
            pool.clone(),
            json!({
                "token_in": token_in.symbol,
                "token_out": token_out.symbol,
                "amount_in": amount_in.to_string(),
                "min_amount_out": min_amount_out.to_string(),
                "receiver": recipient,
            }),
        )
    }

    /// Returns the swap pool owned by `account`, if it has one.
    async fn get_pool(&self, account: &Address) -> Result<Option<Address>, ChainError>;

    /// Quotes the exact-in output of swapping `amount_in` through `pool`.
    async fn get_quote(
        &self,
        pool: &Address,
        token_in: &Asset,
        token_out: &Asset,
        amount_in: u128,
    ) -> Result<u128, ChainError>;

    /// Returns `account`'s balance of the asset in base units.
    async fn balance_of(&self, asset: &Asset, account: &Address) -> Result<u128, ChainError>;
}

/// Submits an atomic batch of operations as one transaction.
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    /// Submits the batch and waits for its receipt.
    async fn execute_batch(&self, operations: &[Operation]) -> Result<BatchReceipt, ChainError>;
}
