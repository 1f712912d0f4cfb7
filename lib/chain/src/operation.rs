//! Batch operations and execution receipts.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use vaultflow_core::Address;

/// An amount handed to an operation builder.
///
/// Serialized as a decimal string (or `"max"`) because base-unit amounts of
/// 18-decimal tokens routinely exceed what JSON numbers carry safely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Quantity {
    /// An exact amount in the asset's base units.
    Units(u128),
    /// The entire position (full withdrawal or full repayment).
    Max,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Units(units) => write!(f, "{units}"),
            Self::Max => f.write_str("max"),
        }
    }
}

impl From<Quantity> for String {
    fn from(quantity: Quantity) -> Self {
        quantity.to_string()
    }
}

impl TryFrom<String> for Quantity {
    type Error = std::num::ParseIntError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.eq_ignore_ascii_case("max") {
            return Ok(Self::Max);
        }
        value.parse().map(Self::Units)
    }
}

/// The primitive a batch entry invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Supply,
    Withdraw,
    Borrow,
    Repay,
    EnableController,
    EnableCollateral,
    Swap,
}

impl OperationKind {
    /// Returns the snake_case name of this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supply => "supply",
            Self::Withdraw => "withdraw",
            Self::Borrow => "borrow",
            Self::Repay => "repay",
            Self::EnableController => "enable_controller",
            Self::EnableCollateral => "enable_collateral",
            Self::Swap => "swap",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an atomic batch.
///
/// The workflow engine sequences operations but never looks inside
/// `payload`; its shape belongs to whichever chain client built it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// The primitive this entry invokes.
    pub kind: OperationKind,
    /// The contract the call is addressed to (vault or pool).
    pub target: Address,
    /// Builder-specific call arguments.
    pub payload: JsonValue,
}

impl Operation {
    /// Creates a new operation.
    #[must_use]
    pub fn new(kind: OperationKind, target: Address, payload: JsonValue) -> Self {
        Self {
            kind,
            target,
            payload,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.kind, self.target)
    }
}

/// What the executor returns for a batch that landed on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReceipt {
    /// Hash of the submitted transaction.
    pub transaction_hash: String,
    /// Gas consumed by the transaction.
    pub gas_used: u64,
}
