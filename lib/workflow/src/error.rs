//! Error types for the workflow crate.
//!
//! Errors are layered using rootcause:
//! - `CompileError`: translating one node into operations
//! - `ExecutionError`: why a single step failed during a run
//! - `WorkflowError`: high-level engine operations (validate, simulate, execute)

use crate::amount::AmountError;
use crate::node::NodeId;
use std::fmt;
use vaultflow_chain::ChainError;

/// Errors from compiling a node into batch operations.
///
/// Display strings leave out the node ID; callers already know which node
/// they were compiling and attach it themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The node names an asset the chain client does not know.
    UnknownAsset { node_id: NodeId, symbol: String },
    /// An amount string could not be interpreted for the asset.
    InvalidAmount { node_id: NodeId, source: AmountError },
    /// Slippage tolerance outside `[0, 100)` percent.
    InvalidSlippage { node_id: NodeId, slippage: f64 },
    /// A read-only chain query the node depends on failed.
    ChainQuery { node_id: NodeId, source: ChainError },
}

impl CompileError {
    /// Returns the node being compiled when the error occurred.
    #[must_use]
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::UnknownAsset { node_id, .. }
            | Self::InvalidAmount { node_id, .. }
            | Self::InvalidSlippage { node_id, .. }
            | Self::ChainQuery { node_id, .. } => node_id,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAsset { symbol, .. } => write!(f, "unknown asset '{symbol}'"),
            Self::InvalidAmount { source, .. } => write!(f, "{source}"),
            Self::InvalidSlippage { slippage, .. } => {
                write!(f, "slippage {slippage}% must be at least 0 and below 100")
            }
            Self::ChainQuery { source, .. } => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for CompileError {}

/// Why a step of a run failed.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// The node could not be compiled.
    Compilation(CompileError),
    /// The executor rejected or failed the step's batch.
    BatchFailed { node_id: NodeId, source: ChainError },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compilation(source) => write!(f, "compilation failed: {source}"),
            Self::BatchFailed { source, .. } => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for ExecutionError {}

impl From<CompileError> for ExecutionError {
    fn from(error: CompileError) -> Self {
        Self::Compilation(error)
    }
}

/// High-level workflow errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// The graph failed validation; nothing was compiled or submitted.
    ValidationFailed { errors: Vec<String> },
    /// A node failed to compile during simulation.
    CompilationFailed { node_id: NodeId, reason: String },
    /// Invalid step state transition.
    InvalidStateTransition { from: String, to: String },
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed { errors } => {
                write!(f, "workflow validation failed: {}", errors.join("; "))
            }
            Self::CompilationFailed { node_id, reason } => {
                write!(f, "compilation failed for node {node_id}: {reason}")
            }
            Self::InvalidStateTransition { from, to } => {
                write!(f, "invalid state transition from {from} to {to}")
            }
        }
    }
}

impl std::error::Error for WorkflowError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_display() {
        let err = CompileError::UnknownAsset {
            node_id: NodeId::new("n1"),
            symbol: "FOO".to_string(),
        };
        assert_eq!(err.to_string(), "unknown asset 'FOO'");
        assert_eq!(err.node_id(), &NodeId::new("n1"));
    }

    #[test]
    fn execution_error_keeps_chain_message() {
        let err = ExecutionError::BatchFailed {
            node_id: NodeId::new("n2"),
            source: ChainError::BatchRejected {
                reason: "health factor too low".to_string(),
            },
        };
        assert!(err.to_string().contains("health factor too low"));
    }

    #[test]
    fn workflow_error_display() {
        let err = WorkflowError::ValidationFailed {
            errors: vec![
                "Workflow must have a start node".to_string(),
                "Account required".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "workflow validation failed: Workflow must have a start node; Account required"
        );
    }

    #[test]
    fn state_transition_display() {
        let err = WorkflowError::InvalidStateTransition {
            from: "completed".to_string(),
            to: "executing".to_string(),
        };
        assert!(err.to_string().contains("invalid state transition"));
    }
}
