//! Workflow engine for the vaultflow platform.
//!
//! This crate turns a visually authored graph of DeFi actions into ordered
//! batches of chain operations:
//!
//! - **Graph Model**: nodes, edges, and a petgraph view for algorithms
//! - **Node Types**: Control, Core Action, Strategy, LP Toolkit, Alert
//! - **Ordering**: deterministic Kahn ordering with cycle detection
//! - **Validation**: accumulated structural and per-node field checks
//! - **Compilation**: nodes to primitive operations, with unit scaling and
//!   slippage-bounded quotes
//! - **Execution**: step state machine, orchestrator, and status stream

pub mod amount;
pub mod compiler;
pub mod edge;
pub mod error;
pub mod execution;
pub mod graph;
pub mod node;
pub mod orchestrator;
pub mod order;
pub mod validate;

pub use amount::{Amount, AmountError};
pub use compiler::{CompiledOperation, NodeCompiler};
pub use edge::Edge;
pub use error::{CompileError, ExecutionError, WorkflowError};
pub use execution::{ExecutionReport, ExecutionStep, RunStatus, StepResult, StepStatus};
pub use graph::WorkflowGraph;
pub use node::{Node, NodeCategory, NodeId, NodeKind};
pub use orchestrator::{EngineConfig, Orchestrator, SimulatedStep, Simulation};
pub use order::{Ordering, order};
pub use validate::{Validation, validate};
