//! Translation of workflow nodes into batch operations.
//!
//! Each node compiles to zero or more [`CompiledOperation`]s. Strategies
//! expand into several named legs. Compilation only reads from the chain
//! (assets, pools, quotes, balances); it never submits anything.
//!
//! Two kinds of trouble are told apart:
//! - Hard errors (unknown asset, malformed amount, failed balance query)
//!   fail the node with a [`CompileError`].
//! - Pool and quote trouble degrades: the affected leg compiles to nothing
//!   and a warning is logged, so the rest of the run can proceed.

use crate::amount::{Amount, AmountError, min_amount_out, scale_bps, slippage_keep_bps};
use crate::error::CompileError;
use crate::node::{
    CoreAction, JitDirection, Node, NodeKind, PermissionsConfig, Strategy, SwapConfig,
    VaultActionConfig,
};
use crate::validate::MIN_LEVERAGE_FACTOR;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use vaultflow_chain::{Asset, ChainClient, ChainError, Operation, Quantity};
use vaultflow_core::{AccountContext, Address, format_units};

/// Slippage tolerance applied when a node does not set one, in percent.
pub const DEFAULT_SLIPPAGE_PERCENT: f64 = 0.5;

const DEFAULT_MARGIN_AMOUNT: &str = "1000";
const DEFAULT_HEDGE_SUPPLY_AMOUNT: &str = "1000";
const DEFAULT_HEDGE_BORROW_AMOUNT: &str = "500";

/// One named leg of a compiled node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledOperation {
    /// Human-readable summary of the leg.
    pub description: String,
    /// Primitive operations, in submission order.
    pub operations: Vec<Operation>,
}

impl CompiledOperation {
    /// Creates a compiled leg.
    #[must_use]
    pub fn new(description: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            description: description.into(),
            operations,
        }
    }
}

/// Returns the total number of primitive operations across `compiled`.
#[must_use]
pub fn operation_count(compiled: &[CompiledOperation]) -> usize {
    compiled.iter().map(|leg| leg.operations.len()).sum()
}

#[derive(Debug, Clone, Copy)]
enum VaultVerb {
    Supply,
    Withdraw,
    Borrow,
    Repay,
}

impl VaultVerb {
    fn label(self) -> &'static str {
        match self {
            Self::Supply => "Supply",
            Self::Withdraw => "Withdraw",
            Self::Borrow => "Borrow",
            Self::Repay => "Repay",
        }
    }
}

/// Compiles nodes against a [`ChainClient`].
#[derive(Debug, Clone)]
pub struct NodeCompiler<C> {
    client: C,
    default_slippage_percent: f64,
}

impl<C: ChainClient> NodeCompiler<C> {
    /// Creates a compiler using the default slippage tolerance.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            default_slippage_percent: DEFAULT_SLIPPAGE_PERCENT,
        }
    }

    /// Sets the slippage tolerance used when a node does not set one.
    #[must_use]
    pub fn with_default_slippage(mut self, percent: f64) -> Self {
        self.default_slippage_percent = percent;
        self
    }

    /// Compiles `node` for execution by `account`.
    ///
    /// Nodes with missing fields compile to an empty list; the validator is
    /// responsible for reporting them.
    ///
    /// # Errors
    ///
    /// Returns an error if the node names an unknown asset, carries an
    /// amount or slippage that cannot be interpreted, or needs a balance
    /// the chain cannot provide.
    #[instrument(
        skip(self, node, account),
        fields(node_id = %node.id, category = %node.category())
    )]
    pub async fn compile(
        &self,
        node: &Node,
        account: &AccountContext,
    ) -> Result<Vec<CompiledOperation>, CompileError> {
        let compiled = match &node.kind {
            NodeKind::Control { .. } | NodeKind::Alert(_) => Vec::new(),
            NodeKind::LpToolkit(action) => {
                debug!(?action, "LP toolkit actions have no primitive operations");
                Vec::new()
            }
            NodeKind::CoreAction(action) => {
                debug!(action = action.name(), "compiling core action");
                self.compile_core(node, action, account).await?
            }
            NodeKind::Strategy(strategy) => {
                debug!(strategy = strategy.name(), "compiling strategy");
                self.compile_strategy(node, strategy, account).await?
            }
        };

        debug!(
            legs = compiled.len(),
            operations = operation_count(&compiled),
            "node compiled"
        );
        Ok(compiled)
    }

    async fn compile_core(
        &self,
        node: &Node,
        action: &CoreAction,
        account: &AccountContext,
    ) -> Result<Vec<CompiledOperation>, CompileError> {
        match action {
            CoreAction::Supply(config) => {
                self.compile_vault_action(node, VaultVerb::Supply, config, account).await
            }
            CoreAction::Withdraw(config) => {
                self.compile_vault_action(node, VaultVerb::Withdraw, config, account).await
            }
            CoreAction::Borrow(config) => {
                self.compile_vault_action(node, VaultVerb::Borrow, config, account).await
            }
            CoreAction::Repay(config) => {
                self.compile_vault_action(node, VaultVerb::Repay, config, account).await
            }
            CoreAction::Swap(config) => self.compile_swap(node, config, account).await,
            CoreAction::Permissions(config) => self.compile_permissions(node, config, account),
        }
    }

    async fn compile_vault_action(
        &self,
        node: &Node,
        verb: VaultVerb,
        config: &VaultActionConfig,
        account: &AccountContext,
    ) -> Result<Vec<CompiledOperation>, CompileError> {
        let (Some(vault), Some(amount)) = (present(&config.vault), present(&config.amount)) else {
            debug!("vault or amount missing, nothing to compile");
            return Ok(Vec::new());
        };

        let asset = self.asset(node, vault)?;
        let quantity = self.quantity(node, &asset, amount, account).await?;
        let me = &account.address;
        let operation = match verb {
            VaultVerb::Supply => self.client.build_supply(&asset, quantity, me),
            VaultVerb::Withdraw => self.client.build_withdraw(&asset, quantity, me),
            VaultVerb::Borrow => self.client.build_borrow(&asset, quantity, me),
            VaultVerb::Repay => self.client.build_repay(&asset, quantity, me),
        };

        let description = format!(
            "{} {} {}",
            verb.label(),
            describe(quantity, &asset),
            asset.symbol
        );
        Ok(vec![CompiledOperation::new(description, vec![operation])])
    }

    fn compile_permissions(
        &self,
        node: &Node,
        config: &PermissionsConfig,
        account: &AccountContext,
    ) -> Result<Vec<CompiledOperation>, CompileError> {
        let me = &account.address;
        let mut compiled = Vec::new();

        if let Some(controller) = present(&config.controller) {
            let asset = self.asset(node, controller)?;
            compiled.push(CompiledOperation::new(
                format!("Enable {} as controller", asset.symbol),
                vec![self.client.build_enable_controller(&asset, me)],
            ));
        }

        for collateral in config.collaterals.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
            let asset = self.asset(node, collateral)?;
            compiled.push(CompiledOperation::new(
                format!("Enable {} as collateral", asset.symbol),
                vec![self.client.build_enable_collateral(&asset, me)],
            ));
        }

        Ok(compiled)
    }

    async fn compile_swap(
        &self,
        node: &Node,
        config: &SwapConfig,
        account: &AccountContext,
    ) -> Result<Vec<CompiledOperation>, CompileError> {
        let (Some(token_in), Some(token_out)) =
            (present(&config.token_in), present(&config.token_out))
        else {
            debug!("swap tokens missing, nothing to compile");
            return Ok(Vec::new());
        };
        let Some(amount) = present(&config.amount) else {
            warn!(node_id = %node.id, "swap amount missing, skipping swap");
            return Ok(Vec::new());
        };

        let token_in = self.asset(node, token_in)?;
        let token_out = self.asset(node, token_out)?;
        let amount_in = self.units(node, &token_in, amount, account).await?;
        let keep_bps = self.keep_bps(node, config.slippage)?;

        let Some(pool) = self.pool(node, account).await else {
            return Ok(Vec::new());
        };
        let Some(quote) = self.quote(node, &pool, &token_in, &token_out, amount_in).await else {
            return Ok(Vec::new());
        };

        let min_out = min_amount_out(quote, keep_bps);
        let operation = self
            .client
            .build_swap(&pool, &token_in, &token_out, amount_in, min_out, &account.address);
        let description = format!(
            "Swap {} {} for at least {} {}",
            format_units(amount_in, token_in.decimals),
            token_in.symbol,
            format_units(min_out, token_out.decimals),
            token_out.symbol
        );
        Ok(vec![CompiledOperation::new(description, vec![operation])])
    }

    async fn compile_strategy(
        &self,
        node: &Node,
        strategy: &Strategy,
        account: &AccountContext,
    ) -> Result<Vec<CompiledOperation>, CompileError> {
        let me = &account.address;
        match strategy {
            Strategy::Leverage {
                collateral_asset,
                borrow_asset,
                leverage_factor,
                margin_amount,
                slippage,
            } => {
                let (Some(collateral), Some(borrow)) =
                    (present(collateral_asset), present(borrow_asset))
                else {
                    return Ok(Vec::new());
                };
                let Some(factor) = leverage_factor.filter(|f| *f >= MIN_LEVERAGE_FACTOR) else {
                    return Ok(Vec::new());
                };
                let collateral = self.asset(node, collateral)?;
                let borrow = self.asset(node, borrow)?;
                let margin_amount = present(margin_amount).unwrap_or(DEFAULT_MARGIN_AMOUNT);
                let margin = self.units(node, &collateral, margin_amount, account).await?;
                let keep_bps = self.keep_bps(node, *slippage)?;
                self.compile_leverage(node, factor, &collateral, &borrow, margin, keep_bps, account)
                    .await
            }
            Strategy::BorrowAgainstLp {
                borrow_asset,
                borrow_amount,
            } => {
                let (Some(asset), Some(amount)) = (present(borrow_asset), present(borrow_amount))
                else {
                    return Ok(Vec::new());
                };
                let asset = self.asset(node, asset)?;
                let quantity = self.quantity(node, &asset, amount, account).await?;
                Ok(vec![CompiledOperation::new(
                    format!(
                        "Borrow {} {} against LP position",
                        describe(quantity, &asset),
                        asset.symbol
                    ),
                    vec![
                        self.client.build_enable_controller(&asset, me),
                        self.client.build_borrow(&asset, quantity, me),
                    ],
                )])
            }
            Strategy::HedgedLp {
                collateral_asset,
                borrow_asset,
                supply_amount,
                borrow_amount,
            } => {
                let (Some(collateral), Some(borrow)) =
                    (present(collateral_asset), present(borrow_asset))
                else {
                    return Ok(Vec::new());
                };
                let collateral = self.asset(node, collateral)?;
                let borrow = self.asset(node, borrow)?;
                let supply_amount = present(supply_amount).unwrap_or(DEFAULT_HEDGE_SUPPLY_AMOUNT);
                let borrow_amount = present(borrow_amount).unwrap_or(DEFAULT_HEDGE_BORROW_AMOUNT);
                let supply_quantity =
                    self.quantity(node, &collateral, supply_amount, account).await?;
                let borrow_quantity = self.quantity(node, &borrow, borrow_amount, account).await?;

                Ok(vec![
                    CompiledOperation::new(
                        format!(
                            "Hedged LP - Supply {} {}",
                            describe(supply_quantity, &collateral),
                            collateral.symbol
                        ),
                        vec![
                            self.client.build_enable_collateral(&collateral, me),
                            self.client.build_supply(&collateral, supply_quantity, me),
                        ],
                    ),
                    CompiledOperation::new(
                        format!(
                            "Hedged LP - Borrow {} {}",
                            describe(borrow_quantity, &borrow),
                            borrow.symbol
                        ),
                        vec![
                            self.client.build_enable_controller(&borrow, me),
                            self.client.build_borrow(&borrow, borrow_quantity, me),
                        ],
                    ),
                ])
            }
            Strategy::JitLiquidity {
                jit_asset,
                jit_amount,
                jit_action,
            } => {
                let (Some(asset), Some(amount), Some(direction)) =
                    (present(jit_asset), present(jit_amount), jit_action)
                else {
                    return Ok(Vec::new());
                };
                let asset = self.asset(node, asset)?;
                let quantity = self.quantity(node, &asset, amount, account).await?;
                let Some(pool) = self.pool(node, account).await else {
                    return Ok(Vec::new());
                };

                let amount = describe(quantity, &asset);
                let leg = match direction {
                    JitDirection::Deploy => CompiledOperation::new(
                        format!("JIT deploy {amount} {} for pool {pool}", asset.symbol),
                        vec![self.client.build_supply(&asset, quantity, &pool)],
                    ),
                    JitDirection::Withdraw => CompiledOperation::new(
                        format!("JIT withdraw {amount} {} from pool {pool}", asset.symbol),
                        vec![self.client.build_withdraw(&asset, quantity, me)],
                    ),
                };
                Ok(vec![leg])
            }
        }
    }

    /// Supplies the margin, then borrows the value of `margin * (factor - 1)`
    /// and swaps it back into collateral.
    #[allow(clippy::too_many_arguments)]
    async fn compile_leverage(
        &self,
        node: &Node,
        factor: f64,
        collateral: &Asset,
        borrow: &Asset,
        margin: u128,
        keep_bps: u128,
        account: &AccountContext,
    ) -> Result<Vec<CompiledOperation>, CompileError> {
        let me = &account.address;
        let title = format!("{factor}x leverage {}/{}", collateral.symbol, borrow.symbol);

        let mut compiled = vec![CompiledOperation::new(
            format!("{title} - Supply Margin"),
            vec![
                self.client.build_enable_collateral(collateral, me),
                self.client.build_supply(collateral, Quantity::Units(margin), me),
            ],
        )];

        let extra_bps = ((factor - 1.0) * 10_000.0).round() as u128;
        let Some(extra_collateral) = scale_bps(margin, extra_bps) else {
            warn!(node_id = %node.id, factor, "leverage target overflows, skipping borrow leg");
            return Ok(compiled);
        };
        let Some(pool) = self.pool(node, account).await else {
            return Ok(compiled);
        };
        let Some(borrow_units) = self.quote(node, &pool, collateral, borrow, extra_collateral).await
        else {
            return Ok(compiled);
        };
        let Some(swapped_back) = self.quote(node, &pool, borrow, collateral, borrow_units).await
        else {
            return Ok(compiled);
        };
        let min_back = min_amount_out(swapped_back, keep_bps);

        compiled.push(CompiledOperation::new(
            format!("{title} - Borrow & Swap"),
            vec![
                self.client.build_enable_controller(borrow, me),
                self.client.build_borrow(borrow, Quantity::Units(borrow_units), me),
                self.client.build_swap(&pool, borrow, collateral, borrow_units, min_back, me),
                self.client.build_supply(collateral, Quantity::Units(min_back), me),
            ],
        ));
        Ok(compiled)
    }

    fn asset(&self, node: &Node, symbol: &str) -> Result<Asset, CompileError> {
        self.client.asset(symbol).map_err(|error| match error {
            ChainError::UnknownAsset { symbol } => CompileError::UnknownAsset {
                node_id: node.id.clone(),
                symbol,
            },
            source => CompileError::ChainQuery {
                node_id: node.id.clone(),
                source,
            },
        })
    }

    async fn balance(
        &self,
        node: &Node,
        asset: &Asset,
        account: &AccountContext,
    ) -> Result<u128, CompileError> {
        self.client
            .balance_of(asset, &account.address)
            .await
            .map_err(|source| CompileError::ChainQuery {
                node_id: node.id.clone(),
                source,
            })
    }

    /// Resolves an amount string to a builder quantity. `"max"` stays
    /// symbolic.
    async fn quantity(
        &self,
        node: &Node,
        asset: &Asset,
        raw: &str,
        account: &AccountContext,
    ) -> Result<Quantity, CompileError> {
        match parse_amount(node, raw)? {
            Amount::Max => Ok(Quantity::Max),
            other => self.resolve(node, asset, raw, other, account).await.map(Quantity::Units),
        }
    }

    /// Resolves an amount string to concrete base units. `"max"` becomes the
    /// full balance.
    async fn units(
        &self,
        node: &Node,
        asset: &Asset,
        raw: &str,
        account: &AccountContext,
    ) -> Result<u128, CompileError> {
        let amount = parse_amount(node, raw)?;
        self.resolve(node, asset, raw, amount, account).await
    }

    async fn resolve(
        &self,
        node: &Node,
        asset: &Asset,
        raw: &str,
        amount: Amount,
        account: &AccountContext,
    ) -> Result<u128, CompileError> {
        match amount {
            Amount::Exact(exact) => Amount::to_units(&exact, asset.decimals).map_err(|source| {
                CompileError::InvalidAmount {
                    node_id: node.id.clone(),
                    source,
                }
            }),
            Amount::Percent(bps) => {
                let balance = self.balance(node, asset, account).await?;
                scale_bps(balance, bps).ok_or_else(|| CompileError::InvalidAmount {
                    node_id: node.id.clone(),
                    source: AmountError {
                        input: raw.to_string(),
                        reason: "share of balance overflows".to_string(),
                    },
                })
            }
            Amount::Max => self.balance(node, asset, account).await,
        }
    }

    fn keep_bps(&self, node: &Node, slippage: Option<f64>) -> Result<u128, CompileError> {
        let slippage = slippage.unwrap_or(self.default_slippage_percent);
        slippage_keep_bps(slippage).ok_or_else(|| CompileError::InvalidSlippage {
            node_id: node.id.clone(),
            slippage,
        })
    }

    async fn pool(&self, node: &Node, account: &AccountContext) -> Option<Address> {
        match self.client.get_pool(&account.address).await {
            Ok(Some(pool)) => Some(pool),
            Ok(None) => {
                warn!(
                    node_id = %node.id,
                    account = %account.address,
                    "account has no swap pool, skipping"
                );
                None
            }
            Err(error) => {
                warn!(node_id = %node.id, %error, "pool lookup failed, skipping");
                None
            }
        }
    }

    async fn quote(
        &self,
        node: &Node,
        pool: &Address,
        token_in: &Asset,
        token_out: &Asset,
        amount_in: u128,
    ) -> Option<u128> {
        match self.client.get_quote(pool, token_in, token_out, amount_in).await {
            Ok(quote) => {
                debug!(
                    token_in = %token_in.symbol,
                    token_out = %token_out.symbol,
                    amount_in,
                    quote,
                    "quoted"
                );
                Some(quote)
            }
            Err(error) => {
                warn!(
                    node_id = %node.id,
                    token_in = %token_in.symbol,
                    token_out = %token_out.symbol,
                    %error,
                    "quote failed, skipping"
                );
                None
            }
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_amount(node: &Node, raw: &str) -> Result<Amount, CompileError> {
    raw.parse().map_err(|source| CompileError::InvalidAmount {
        node_id: node.id.clone(),
        source,
    })
}

fn describe(quantity: Quantity, asset: &Asset) -> String {
    match quantity {
        Quantity::Units(units) => format_units(units, asset.decimals),
        Quantity::Max => "max".to_string(),
    }
}
