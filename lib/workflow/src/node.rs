//! Workflow node types and configurations.
//!
//! Nodes are the building blocks of a strategy. Each node has:
//! - An ID unique within the graph
//! - A human-readable label (used in validation and status messages)
//! - A kind: a closed tagged union over control, core action, strategy,
//!   LP toolkit, and alert nodes, each carrying its own field bag
//!
//! Field bags keep the editor's optional fields as `Option`s. Completeness is
//! the validator's job; the compiler treats a missing field as "nothing to do".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node, unique within its graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The category of a workflow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeCategory {
    /// Graph entry and exit markers.
    Control,
    /// Single lending-protocol actions.
    CoreAction,
    /// Multi-step composite strategies.
    Strategy,
    /// Liquidity pool management.
    LpToolkit,
    /// Off-chain notifications.
    Alert,
}

impl NodeCategory {
    /// Returns the kebab-case name of this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Control => "control",
            Self::CoreAction => "core-action",
            Self::Strategy => "strategy",
            Self::LpToolkit => "lp-toolkit",
            Self::Alert => "alert",
        }
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a control node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlRole {
    Start,
    End,
}

/// Fields shared by supply, withdraw, borrow, and repay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultActionConfig {
    /// Vault symbol or address.
    pub vault: Option<String>,
    /// Decimal amount, percentage ("50%"), or "max".
    pub amount: Option<String>,
}

/// Configuration for a swap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Symbol of the asset sold.
    pub token_in: Option<String>,
    /// Symbol of the asset bought.
    pub token_out: Option<String>,
    /// Amount of `token_in` to sell.
    pub amount: Option<String>,
    /// Slippage tolerance in percent (0.5 means 0.5%).
    pub slippage: Option<f64>,
}

/// Configuration for account permissions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionsConfig {
    /// Vault to enable as the account's controller.
    pub controller: Option<String>,
    /// Vaults to enable as collateral.
    #[serde(default)]
    pub collaterals: Vec<String>,
}

/// Configuration for core action nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum CoreAction {
    /// Deposit into a vault.
    Supply(VaultActionConfig),
    /// Withdraw from a vault.
    Withdraw(VaultActionConfig),
    /// Borrow from a vault.
    Borrow(VaultActionConfig),
    /// Repay debt to a vault.
    Repay(VaultActionConfig),
    /// Exchange one asset for another through the account's pool.
    Swap(SwapConfig),
    /// Enable controller and collateral vaults.
    Permissions(PermissionsConfig),
}

impl CoreAction {
    /// Returns the kebab-case action name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Supply(_) => "supply",
            Self::Withdraw(_) => "withdraw",
            Self::Borrow(_) => "borrow",
            Self::Repay(_) => "repay",
            Self::Swap(_) => "swap",
            Self::Permissions(_) => "permissions",
        }
    }
}

/// Direction of a just-in-time liquidity move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitDirection {
    Deploy,
    Withdraw,
}

/// Configuration for strategy nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy_type", rename_all = "kebab-case")]
pub enum Strategy {
    /// Loop collateral through borrow-and-swap to reach a leverage factor.
    Leverage {
        collateral_asset: Option<String>,
        borrow_asset: Option<String>,
        /// Target exposure as a multiple of the margin; at least 1.1.
        leverage_factor: Option<f64>,
        /// Margin supplied up front, in collateral units. Defaults to 1000.
        margin_amount: Option<String>,
        /// Slippage tolerance in percent for the swap leg.
        slippage: Option<f64>,
    },
    /// Borrow using an LP position as collateral.
    BorrowAgainstLp {
        borrow_asset: Option<String>,
        borrow_amount: Option<String>,
    },
    /// Supply collateral and borrow the paired asset to hedge an LP position.
    HedgedLp {
        collateral_asset: Option<String>,
        borrow_asset: Option<String>,
        /// Defaults to 1000.
        supply_amount: Option<String>,
        /// Defaults to 500.
        borrow_amount: Option<String>,
    },
    /// Move liquidity into or out of the account's pool around a trade.
    JitLiquidity {
        jit_asset: Option<String>,
        jit_amount: Option<String>,
        jit_action: Option<JitDirection>,
    },
}

impl Strategy {
    /// Returns the kebab-case strategy name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Leverage { .. } => "leverage",
            Self::BorrowAgainstLp { .. } => "borrow-against-lp",
            Self::HedgedLp { .. } => "hedged-lp",
            Self::JitLiquidity { .. } => "jit-liquidity",
        }
    }
}

/// Pool and position fields shared by LP toolkit actions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LpPositionConfig {
    pub vault0: Option<String>,
    pub vault1: Option<String>,
    pub amount0: Option<String>,
    pub amount1: Option<String>,
    pub fee: Option<String>,
    pub pool_address: Option<String>,
}

/// Configuration for LP toolkit nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum LpToolkitAction {
    CreatePool(LpPositionConfig),
    AddLiquidity(LpPositionConfig),
    RemoveLiquidity(LpPositionConfig),
}

/// Delivery channel for alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertChannel {
    Telegram,
    Discord,
}

/// When an alert should fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertTrigger {
    Success,
    Failure,
    #[default]
    Always,
}

/// Configuration for alert nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConfig {
    pub channel: AlertChannel,
    /// Message template.
    pub message: Option<String>,
    #[serde(default)]
    pub trigger: AlertTrigger,
    pub recipient: Option<String>,
    pub webhook_url: Option<String>,
    pub chat_id: Option<String>,
}

/// The kind of a node, varying by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "kebab-case")]
pub enum NodeKind {
    /// Start or end marker.
    Control { role: ControlRole },
    /// Core action configuration.
    CoreAction(CoreAction),
    /// Strategy configuration.
    Strategy(Strategy),
    /// LP toolkit configuration.
    LpToolkit(LpToolkitAction),
    /// Alert configuration.
    Alert(AlertConfig),
}

impl NodeKind {
    /// Returns the category of this node kind.
    #[must_use]
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::Control { .. } => NodeCategory::Control,
            Self::CoreAction(_) => NodeCategory::CoreAction,
            Self::Strategy(_) => NodeCategory::Strategy,
            Self::LpToolkit(_) => NodeCategory::LpToolkit,
            Self::Alert(_) => NodeCategory::Alert,
        }
    }
}

/// A workflow node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Identifier unique within the graph.
    pub id: NodeId,
    /// Human-readable label shown in messages.
    #[serde(default)]
    pub label: String,
    /// Node kind and its configuration.
    pub kind: NodeKind,
}

impl Node {
    /// Creates a node.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }

    /// Creates a start marker.
    #[must_use]
    pub fn start(id: impl Into<NodeId>) -> Self {
        Self::new(id, "Start", NodeKind::Control {
            role: ControlRole::Start,
        })
    }

    /// Creates an end marker.
    #[must_use]
    pub fn end(id: impl Into<NodeId>) -> Self {
        Self::new(id, "End", NodeKind::Control {
            role: ControlRole::End,
        })
    }

    /// Returns the category of this node.
    #[must_use]
    pub fn category(&self) -> NodeCategory {
        self.kind.category()
    }

    /// Returns the control role, if this is a control node.
    #[must_use]
    pub fn control_role(&self) -> Option<ControlRole> {
        match self.kind {
            NodeKind::Control { role } => Some(role),
            _ => None,
        }
    }

    /// Returns true for every node that becomes an execution step.
    #[must_use]
    pub fn is_actionable(&self) -> bool {
        self.control_role().is_none()
    }

    /// Returns the label, falling back to the ID when the label is blank.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.label.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.label
        }
    }

    /// Returns the step description used in status reporting.
    #[must_use]
    pub fn description(&self) -> String {
        format!("{}: {}", self.category(), self.display_name())
    }
}
