//! Execution step state machine.
//!
//! A run turns each actionable node into one [`ExecutionStep`]. Steps move
//! through a fixed lifecycle:
//! - `pending` when the run starts
//! - `executing` once the orchestrator picks the step up, before it is
//!   compiled and submitted
//! - `completed` or `failed`, both terminal
//!
//! Steps are never reused across runs.

use crate::compiler::{CompiledOperation, operation_count};
use crate::error::WorkflowError;
use crate::node::{Node, NodeId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use vaultflow_chain::BatchReceipt;
use vaultflow_core::RunId;

/// Message recorded on steps that compiled to no operations.
pub const NO_OPERATION_NEEDED: &str = "No operation needed";

/// The lifecycle state of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Waiting for earlier steps.
    Pending,
    /// Being compiled, or batch submitted and waiting for the receipt.
    Executing,
    /// Batch landed, or there was nothing to submit.
    Completed,
    /// Compilation or submission failed.
    Failed,
}

impl StepStatus {
    /// Returns true if this is a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns the snake_case name of this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// What a completed step produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepResult {
    /// The batch landed on chain.
    Receipt {
        transaction_hash: String,
        gas_used: u64,
    },
    /// Nothing was submitted.
    Message { message: String },
}

/// Execution record for a single node within a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionStep {
    /// The run this step belongs to.
    pub run_id: RunId,
    /// The node this step executes.
    pub node_id: NodeId,
    /// `"{category}: {label}"` of the node.
    pub description: String,
    /// Compiled legs, filled in once the node has been compiled.
    pub compiled_operations: Vec<CompiledOperation>,
    /// Current lifecycle state.
    pub status: StepStatus,
    /// Outcome of a completed step.
    pub result: Option<StepResult>,
    /// Error message of a failed step.
    pub error: Option<String>,
    /// When the step started executing.
    pub started_at: Option<DateTime<Utc>>,
    /// When the step reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExecutionStep {
    /// Creates a pending step for `node`.
    #[must_use]
    pub fn new(run_id: RunId, node: &Node) -> Self {
        Self {
            run_id,
            node_id: node.id.clone(),
            description: node.description(),
            compiled_operations: Vec::new(),
            status: StepStatus::Pending,
            result: None,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }

    /// Returns the number of primitive operations this step submits.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        operation_count(&self.compiled_operations)
    }

    fn transition(&mut self, allowed: &[StepStatus], to: StepStatus) -> Result<(), WorkflowError> {
        if !allowed.contains(&self.status) {
            return Err(WorkflowError::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    /// Marks the step as executing.
    ///
    /// # Errors
    ///
    /// Returns an error unless the step is pending.
    pub fn start(&mut self) -> Result<(), WorkflowError> {
        self.transition(&[StepStatus::Pending], StepStatus::Executing)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Records the receipt of the step's batch.
    ///
    /// # Errors
    ///
    /// Returns an error unless the step is executing.
    pub fn complete(&mut self, receipt: BatchReceipt) -> Result<(), WorkflowError> {
        self.transition(&[StepStatus::Executing], StepStatus::Completed)?;
        self.finished_at = Some(Utc::now());
        self.result = Some(StepResult::Receipt {
            transaction_hash: receipt.transaction_hash,
            gas_used: receipt.gas_used,
        });
        Ok(())
    }

    /// Completes a step that had nothing to submit.
    ///
    /// # Errors
    ///
    /// Returns an error unless the step is executing.
    pub fn complete_without_operations(&mut self) -> Result<(), WorkflowError> {
        self.transition(&[StepStatus::Executing], StepStatus::Completed)?;
        self.finished_at = Some(Utc::now());
        self.result = Some(StepResult::Message {
            message: NO_OPERATION_NEEDED.to_string(),
        });
        Ok(())
    }

    /// Marks the step as failed, either because it did not compile or
    /// because its batch was rejected.
    ///
    /// # Errors
    ///
    /// Returns an error unless the step is executing.
    pub fn fail(&mut self, error: String) -> Result<(), WorkflowError> {
        self.transition(&[StepStatus::Executing], StepStatus::Failed)?;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
        Ok(())
    }

    /// Returns the transaction hash, if the step landed a batch.
    #[must_use]
    pub fn transaction_hash(&self) -> Option<&str> {
        match &self.result {
            Some(StepResult::Receipt {
                transaction_hash, ..
            }) => Some(transaction_hash),
            _ => None,
        }
    }

    /// Returns the gas used, if the step landed a batch.
    #[must_use]
    pub fn gas_used(&self) -> u64 {
        match &self.result {
            Some(StepResult::Receipt { gas_used, .. }) => *gas_used,
            _ => 0,
        }
    }

    /// Returns how long the step took, if it has started.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::Duration> {
        let start = self.started_at?;
        let end = self.finished_at.unwrap_or_else(Utc::now);
        Some(end - start)
    }
}

/// Snapshot of the orchestrator's progress, published after every
/// transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatus {
    /// The run in progress or last finished, if any.
    pub run_id: Option<RunId>,
    /// Steps of that run.
    pub steps: Vec<ExecutionStep>,
    /// Index of the step being worked on. `None` when idle.
    pub current_step: Option<usize>,
    /// True while a run is in flight.
    pub is_running: bool,
}

impl RunStatus {
    /// Returns true when no step is being worked on.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.current_step.is_none()
    }
}

/// Outcome of an `execute` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionReport {
    /// The run this report describes.
    pub run_id: RunId,
    /// True when every step completed.
    pub success: bool,
    /// Why the run stopped early, citing the failing step.
    pub error: Option<String>,
    /// Every step of the run, including those left pending.
    pub steps: Vec<ExecutionStep>,
    /// Hashes of every landed batch, in order.
    pub transaction_hashes: Vec<String>,
    /// Gas summed over every landed batch.
    pub total_gas_used: u64,
}

impl ExecutionReport {
    /// Summarizes the steps of a finished run.
    #[must_use]
    pub fn new(run_id: RunId, steps: Vec<ExecutionStep>, error: Option<String>) -> Self {
        let transaction_hashes = steps
            .iter()
            .filter_map(ExecutionStep::transaction_hash)
            .map(str::to_string)
            .collect();
        let total_gas_used = steps.iter().map(ExecutionStep::gas_used).sum();
        Self {
            run_id,
            success: error.is_none(),
            error,
            steps,
            transaction_hashes,
            total_gas_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{CoreAction, NodeKind, VaultActionConfig};

    fn step() -> ExecutionStep {
        let node = Node::new(
            "n1",
            "Supply USDC",
            NodeKind::CoreAction(CoreAction::Supply(VaultActionConfig::default())),
        );
        ExecutionStep::new(RunId::new(), &node)
    }

    fn receipt(hash: &str, gas_used: u64) -> BatchReceipt {
        BatchReceipt {
            transaction_hash: hash.to_string(),
            gas_used,
        }
    }

    #[test]
    fn status_terminal() {
        assert!(!StepStatus::Pending.is_terminal());
        assert!(!StepStatus::Executing.is_terminal());
        assert!(StepStatus::Completed.is_terminal());
        assert!(StepStatus::Failed.is_terminal());
    }

    #[test]
    fn step_lifecycle() {
        let mut step = step();
        assert_eq!(step.status, StepStatus::Pending);
        assert_eq!(step.description, "core-action: Supply USDC");

        step.start().unwrap();
        assert_eq!(step.status, StepStatus::Executing);
        assert!(step.started_at.is_some());

        step.complete(receipt("0xabc", 121_000)).unwrap();
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.transaction_hash(), Some("0xabc"));
        assert_eq!(step.gas_used(), 121_000);
        assert!(step.finished_at.is_some());
        assert!(step.duration().is_some());
    }

    #[test]
    fn completed_step_cannot_restart() {
        let mut step = step();
        step.start().unwrap();
        step.complete_without_operations().unwrap();

        let err = step.start().unwrap_err();
        assert_eq!(
            err,
            WorkflowError::InvalidStateTransition {
                from: "completed".to_string(),
                to: "executing".to_string(),
            }
        );
        assert!(step.fail("late".to_string()).is_err());
    }

    #[test]
    fn pending_step_cannot_complete() {
        let mut step = step();
        assert!(step.complete(receipt("0x1", 1)).is_err());
        assert_eq!(step.status, StepStatus::Pending);
    }

    #[test]
    fn only_executing_step_can_fail() {
        let mut step = step();
        assert!(step.fail("too early".to_string()).is_err());
        assert_eq!(step.status, StepStatus::Pending);

        step.start().unwrap();
        step.fail("unknown asset 'FOO'".to_string()).unwrap();
        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.error.as_deref(), Some("unknown asset 'FOO'"));
        assert!(step.duration().is_some());
    }

    #[test]
    fn report_aggregates_receipts() {
        let mut first = step();
        first.start().unwrap();
        first.complete(receipt("0x1", 100)).unwrap();

        let mut second = step();
        second.start().unwrap();
        second.complete_without_operations().unwrap();

        let mut third = step();
        third.start().unwrap();
        third.complete(receipt("0x3", 50)).unwrap();

        let report = ExecutionReport::new(RunId::new(), vec![first, second, third], None);
        assert!(report.success);
        assert_eq!(report.transaction_hashes, ["0x1", "0x3"]);
        assert_eq!(report.total_gas_used, 150);
    }

    #[test]
    fn step_result_serialization() {
        let result = StepResult::Message {
            message: NO_OPERATION_NEEDED.to_string(),
        };
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"type": "message", "message": "No operation needed"})
        );
    }

    #[test]
    fn idle_status() {
        let status = RunStatus::default();
        assert!(status.is_idle());
        assert!(!status.is_running);
    }
}
