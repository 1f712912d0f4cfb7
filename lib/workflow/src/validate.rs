//! Structural validation of workflow graphs.
//!
//! Every rule runs and every failure is collected, so the editor can show
//! the full list at once. Per-node checks walk nodes in sorted-ID order,
//! which keeps the error list independent of how nodes and edges were
//! shuffled.

use crate::graph::WorkflowGraph;
use crate::node::{ControlRole, CoreAction, Node, NodeKind, Strategy};
use crate::order::order;
use petgraph::graph::NodeIndex;
use petgraph::visit::Dfs;
use serde::Serialize;
use tracing::debug;
use vaultflow_core::AccountContext;

/// Smallest leverage factor a leverage strategy accepts.
pub const MIN_LEVERAGE_FACTOR: f64 = 1.1;

const CYCLE_MESSAGE: &str = "graph contains a cycle or disconnected component";

/// Result of validating a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    /// True when `errors` is empty.
    pub valid: bool,
    /// Human-readable problems, one per failed rule.
    pub errors: Vec<String>,
}

impl Validation {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validates `graph` for execution by `account`.
#[must_use]
pub fn validate(graph: &WorkflowGraph, account: Option<&AccountContext>) -> Validation {
    let mut errors = Vec::new();

    if account.is_none() {
        errors.push("Account required".to_string());
    }

    let starts = graph.control_nodes(ControlRole::Start);
    match starts.len() {
        0 => errors.push("Workflow must have a start node".to_string()),
        1 => {}
        _ => errors.push("Workflow can only have one start node".to_string()),
    }

    if graph.control_nodes(ControlRole::End).is_empty() {
        errors.push("Workflow must have an end node".to_string());
    }

    let ordering = order(graph);
    if ordering.has_cycle {
        debug!(unordered = ?ordering.unordered(graph), "graph has a cycle");
        errors.push(CYCLE_MESSAGE.to_string());
    } else if let [start] = starts.as_slice()
        && has_unreachable_nodes(graph, start)
    {
        errors.push(CYCLE_MESSAGE.to_string());
    }

    for id in graph.duplicate_ids() {
        errors.push(format!("Duplicate node id: {id}"));
    }

    let mut dangling = graph.dangling_edges();
    dangling.sort_by(|(a, a_missing), (b, b_missing)| (&a.id, a_missing).cmp(&(&b.id, b_missing)));
    for (edge, missing) in dangling {
        errors.push(format!("Edge {} references unknown node {missing}", edge.id));
    }

    let mut nodes: Vec<&Node> = graph.nodes.iter().collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    for node in nodes {
        check_node(node, &mut errors);
    }

    Validation::from_errors(errors)
}

fn has_unreachable_nodes(graph: &WorkflowGraph, start: &Node) -> bool {
    let Some(position) = graph.nodes.iter().position(|node| node.id == start.id) else {
        return false;
    };

    let dag = graph.dependency_graph();
    let mut reached = vec![false; dag.node_count()];
    let mut dfs = Dfs::new(&dag, NodeIndex::new(position));
    while let Some(index) = dfs.next(&dag) {
        reached[index.index()] = true;
    }
    reached.iter().any(|seen| !seen)
}

fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn check_node(node: &Node, errors: &mut Vec<String>) {
    let label = node.display_name();
    let mut fail = |message: &str| errors.push(format!("{label}: {message}"));

    match &node.kind {
        NodeKind::Control { .. } | NodeKind::Alert(_) | NodeKind::LpToolkit(_) => {}
        NodeKind::CoreAction(action) => match action {
            CoreAction::Supply(config)
            | CoreAction::Withdraw(config)
            | CoreAction::Borrow(config)
            | CoreAction::Repay(config) => {
                if is_blank(config.vault.as_ref()) {
                    fail("Vault address is required");
                }
                if is_blank(config.amount.as_ref()) {
                    fail("Amount is required");
                }
            }
            CoreAction::Swap(config) => {
                if is_blank(config.token_in.as_ref()) || is_blank(config.token_out.as_ref()) {
                    fail("Both input and output tokens are required");
                }
            }
            CoreAction::Permissions(config) => {
                let no_collaterals = config.collaterals.iter().all(|c| c.trim().is_empty());
                if is_blank(config.controller.as_ref()) && no_collaterals {
                    fail("Either controller or collaterals must be specified");
                }
            }
        },
        NodeKind::Strategy(strategy) => match strategy {
            Strategy::Leverage {
                collateral_asset,
                borrow_asset,
                leverage_factor,
                ..
            } => {
                if is_blank(collateral_asset.as_ref()) || is_blank(borrow_asset.as_ref()) {
                    fail("Both collateral and borrow assets are required");
                }
                if !leverage_factor.is_some_and(|factor| factor >= MIN_LEVERAGE_FACTOR) {
                    fail("Leverage factor must be at least 1.1x");
                }
            }
            Strategy::BorrowAgainstLp {
                borrow_asset,
                borrow_amount,
            } => {
                if is_blank(borrow_asset.as_ref()) || is_blank(borrow_amount.as_ref()) {
                    fail("Borrow asset and amount are required");
                }
            }
            Strategy::HedgedLp { .. } | Strategy::JitLiquidity { .. } => {}
        },
    }
}
