//! Workflow orchestrator for simulating and executing graphs.
//!
//! The orchestrator runs the execution loop:
//! 1. Validate the graph (fail fast with every error)
//! 2. Order it topologically and keep the actionable nodes
//! 3. For each node: mark executing, compile, submit one batch
//! 4. Stop at the first failure, leaving later steps pending
//!
//! Steps within a run are strictly sequential: one batch in flight at a
//! time. Progress is published as [`RunStatus`] snapshots on a watch channel
//! owned by that run, so concurrent runs never overwrite each other's
//! status. The orchestrator itself performs no presentation I/O.

use crate::compiler::{CompiledOperation, DEFAULT_SLIPPAGE_PERCENT, NodeCompiler, operation_count};
use crate::error::{ExecutionError, WorkflowError};
use crate::execution::{ExecutionReport, ExecutionStep, RunStatus};
use crate::graph::WorkflowGraph;
use crate::node::{Node, NodeId};
use crate::order::order;
use crate::validate::{Validation, validate};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};
use vaultflow_chain::dry_run::DEFAULT_GAS_PER_OPERATION;
use vaultflow_chain::{BatchExecutor, ChainClient, Operation};
use vaultflow_core::{AccountContext, RunId};

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Gas charged per primitive operation in simulation estimates.
    #[serde(default = "default_gas_per_operation")]
    pub gas_per_operation: u64,

    /// Slippage tolerance for nodes that do not set one, in percent.
    #[serde(default = "default_slippage_percent")]
    pub default_slippage_percent: f64,
}

fn default_gas_per_operation() -> u64 {
    DEFAULT_GAS_PER_OPERATION
}

fn default_slippage_percent() -> f64 {
    DEFAULT_SLIPPAGE_PERCENT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gas_per_operation: default_gas_per_operation(),
            default_slippage_percent: default_slippage_percent(),
        }
    }
}

/// Compiled legs of one node, as reported by a simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedStep {
    pub node_id: NodeId,
    pub description: String,
    pub operations: Vec<CompiledOperation>,
}

/// Outcome of a `simulate` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Simulation {
    /// Compiled legs per actionable node, in execution order.
    pub operations: Vec<SimulatedStep>,
    /// Primitive operation count times the per-operation gas figure.
    pub estimated_cost: u64,
    /// Every node ID, control nodes included, in execution order.
    pub execution_order: Vec<NodeId>,
    /// Number of actionable nodes.
    pub node_count: usize,
}

impl Simulation {
    /// Returns the number of primitive operations across all steps.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.operations
            .iter()
            .map(|step| operation_count(&step.operations))
            .sum()
    }
}

/// A validated graph, ready to run.
struct Plan<'g> {
    account: &'g AccountContext,
    execution_order: Vec<NodeId>,
    actionable: Vec<&'g Node>,
}

enum StepOutcome {
    Completed,
    Failed(ExecutionError),
}

/// Drives workflow graphs through a chain client and a batch executor.
///
/// Holds no per-run state; one orchestrator can serve concurrent runs.
pub struct Orchestrator<C, E> {
    compiler: NodeCompiler<C>,
    executor: E,
    config: EngineConfig,
}

impl<C: ChainClient, E: BatchExecutor> Orchestrator<C, E> {
    /// Creates an orchestrator with default engine settings.
    #[must_use]
    pub fn new(client: C, executor: E) -> Self {
        Self::with_config(client, executor, EngineConfig::default())
    }

    /// Creates an orchestrator with the given engine settings.
    #[must_use]
    pub fn with_config(client: C, executor: E, config: EngineConfig) -> Self {
        let compiler =
            NodeCompiler::new(client).with_default_slippage(config.default_slippage_percent);
        Self {
            compiler,
            executor,
            config,
        }
    }

    /// Returns the batch executor.
    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Validates `graph` for execution by `account`.
    #[must_use]
    pub fn validate(&self, graph: &WorkflowGraph, account: Option<&AccountContext>) -> Validation {
        validate(graph, account)
    }

    /// Compiles every actionable node without submitting anything.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ValidationFailed`] for an invalid graph and
    /// [`WorkflowError::CompilationFailed`] for the first node that does not
    /// compile.
    #[instrument(skip_all, fields(nodes = graph.node_count()))]
    pub async fn simulate(
        &self,
        graph: &WorkflowGraph,
        account: Option<&AccountContext>,
    ) -> vaultflow_core::Result<Simulation, WorkflowError> {
        let plan = self.plan(graph, account)?;

        let mut operations = Vec::with_capacity(plan.actionable.len());
        for node in &plan.actionable {
            let compiled = self
                .compiler
                .compile(node, plan.account)
                .await
                .map_err(|e| WorkflowError::CompilationFailed {
                    node_id: node.id.clone(),
                    reason: e.to_string(),
                })?;
            operations.push(SimulatedStep {
                node_id: node.id.clone(),
                description: node.description(),
                operations: compiled,
            });
        }

        let mut simulation = Simulation {
            operations,
            estimated_cost: 0,
            execution_order: plan.execution_order,
            node_count: plan.actionable.len(),
        };
        let count = u64::try_from(simulation.operation_count()).unwrap_or(u64::MAX);
        simulation.estimated_cost = count.saturating_mul(self.config.gas_per_operation);

        info!(
            steps = simulation.node_count,
            operations = count,
            estimated_cost = simulation.estimated_cost,
            "simulation complete"
        );
        Ok(simulation)
    }

    /// Executes `graph`, one batch per actionable node.
    ///
    /// A failing step does not make this return an error: the report carries
    /// `success == false`, the failed step, and the steps left pending.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ValidationFailed`] for an invalid graph, in
    /// which case nothing is compiled or submitted.
    pub async fn execute(
        &self,
        graph: &WorkflowGraph,
        account: Option<&AccountContext>,
    ) -> vaultflow_core::Result<ExecutionReport, WorkflowError> {
        let (status, _) = watch::channel(RunStatus::default());
        self.execute_with_status(graph, account, &status).await
    }

    /// Executes `graph` like [`execute`](Self::execute), publishing a
    /// [`RunStatus`] snapshot on `status` after every step transition.
    ///
    /// Give each run its own channel. The last snapshot of a run has
    /// `is_running == false` and no current step.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::ValidationFailed`] for an invalid graph, in
    /// which case nothing is published.
    #[instrument(skip_all, fields(nodes = graph.node_count(), run_id = tracing::field::Empty))]
    pub async fn execute_with_status(
        &self,
        graph: &WorkflowGraph,
        account: Option<&AccountContext>,
        status: &watch::Sender<RunStatus>,
    ) -> vaultflow_core::Result<ExecutionReport, WorkflowError> {
        let plan = self.plan(graph, account)?;
        let run_id = RunId::new();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));

        let mut steps: Vec<ExecutionStep> = plan
            .actionable
            .iter()
            .map(|node| ExecutionStep::new(run_id, node))
            .collect();

        if steps.is_empty() {
            info!("no actionable operations");
            publish(status, run_id, &steps, None, false);
            return Ok(ExecutionReport::new(run_id, steps, None));
        }

        info!(steps = steps.len(), order = ?plan.execution_order, "run started");
        publish(status, run_id, &steps, None, true);

        let mut failure = None;
        for (index, node) in plan.actionable.iter().enumerate() {
            let outcome = self
                .run_step(status, run_id, index, node, plan.account, &mut steps)
                .await?;
            match outcome {
                StepOutcome::Completed => {}
                StepOutcome::Failed(e) => {
                    error!(
                        step = index,
                        node_id = %node.id,
                        error = %e,
                        "step failed, aborting run"
                    );
                    failure = Some(format!(
                        "Step {} failed ({}): {e}",
                        index + 1,
                        steps[index].description
                    ));
                    break;
                }
            }
        }

        publish(status, run_id, &steps, None, false);
        let report = ExecutionReport::new(run_id, steps, failure);
        info!(
            success = report.success,
            transactions = report.transaction_hashes.len(),
            total_gas_used = report.total_gas_used,
            "run finished"
        );
        Ok(report)
    }

    fn plan<'g>(
        &self,
        graph: &'g WorkflowGraph,
        account: Option<&'g AccountContext>,
    ) -> vaultflow_core::Result<Plan<'g>, WorkflowError> {
        let validation = validate(graph, account);
        let Some(account) = account.filter(|_| validation.valid) else {
            warn!(errors = ?validation.errors, "workflow failed validation");
            return Err(WorkflowError::ValidationFailed {
                errors: validation.errors,
            }
            .into());
        };

        let ordering = order(graph);
        let actionable = ordering
            .sequence
            .iter()
            .filter_map(|id| graph.node(id))
            .filter(|node| node.is_actionable())
            .collect();

        Ok(Plan {
            account,
            execution_order: ordering.sequence,
            actionable,
        })
    }

    async fn run_step(
        &self,
        status: &watch::Sender<RunStatus>,
        run_id: RunId,
        index: usize,
        node: &Node,
        account: &AccountContext,
        steps: &mut [ExecutionStep],
    ) -> vaultflow_core::Result<StepOutcome, WorkflowError> {
        steps[index].start()?;
        publish(status, run_id, steps, Some(index), true);

        let compiled = match self.compiler.compile(node, account).await {
            Ok(compiled) => compiled,
            Err(e) => {
                let e = ExecutionError::from(e);
                steps[index].fail(e.to_string())?;
                publish(status, run_id, steps, Some(index), true);
                return Ok(StepOutcome::Failed(e));
            }
        };

        let operations: Vec<Operation> = compiled
            .iter()
            .flat_map(|leg| leg.operations.iter().cloned())
            .collect();
        steps[index].compiled_operations = compiled;

        if operations.is_empty() {
            debug!(step = index, node_id = %node.id, "nothing to submit");
            steps[index].complete_without_operations()?;
            publish(status, run_id, steps, Some(index), true);
            return Ok(StepOutcome::Completed);
        }

        info!(
            step = index,
            node_id = %node.id,
            operations = steps[index].operation_count(),
            "submitting batch"
        );
        let outcome = match self.executor.execute_batch(&operations).await {
            Ok(receipt) => {
                let step = &mut steps[index];
                step.complete(receipt)?;
                info!(
                    step = index,
                    tx = step.transaction_hash(),
                    gas_used = step.gas_used(),
                    duration_ms = step.duration().map(|d| d.num_milliseconds()),
                    "step completed"
                );
                StepOutcome::Completed
            }
            Err(source) => {
                let e = ExecutionError::BatchFailed {
                    node_id: node.id.clone(),
                    source,
                };
                steps[index].fail(e.to_string())?;
                StepOutcome::Failed(e)
            }
        };
        publish(status, run_id, steps, Some(index), true);
        Ok(outcome)
    }
}

fn publish(
    status: &watch::Sender<RunStatus>,
    run_id: RunId,
    steps: &[ExecutionStep],
    current_step: Option<usize>,
    is_running: bool,
) {
    status.send_replace(RunStatus {
        run_id: Some(run_id),
        steps: steps.to_vec(),
        current_step,
        is_running,
    });
}
