//! An executor that accepts every batch without touching a chain.
//!
//! Used by the command line's `execute` against the devnet configuration and
//! by tests that need a well-behaved executor. Each accepted batch gets a
//! synthetic transaction hash and a gas figure proportional to its size.

use crate::client::BatchExecutor;
use crate::error::ChainError;
use crate::operation::{BatchReceipt, Operation};
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;
use ulid::Ulid;

/// Base cost charged to every transaction.
const BASE_GAS: u64 = 21_000;

/// Default cost charged per operation in a batch.
pub const DEFAULT_GAS_PER_OPERATION: u64 = 100_000;

/// Accepts and records batches, returning synthetic receipts.
#[derive(Debug)]
pub struct DryRunExecutor {
    gas_per_operation: u64,
    submitted: Mutex<Vec<Vec<Operation>>>,
}

impl DryRunExecutor {
    /// Creates an executor charging the given gas per operation.
    #[must_use]
    pub fn new(gas_per_operation: u64) -> Self {
        Self {
            gas_per_operation,
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Returns every batch accepted so far, in submission order.
    #[must_use]
    pub fn submitted(&self) -> Vec<Vec<Operation>> {
        self.submitted
            .lock()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }
}

impl Default for DryRunExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_GAS_PER_OPERATION)
    }
}

#[async_trait]
impl BatchExecutor for DryRunExecutor {
    async fn execute_batch(&self, operations: &[Operation]) -> Result<BatchReceipt, ChainError> {
        let ulid = Ulid::new();
        let sequence = {
            let mut submitted = self.submitted.lock().map_err(|_| ChainError::BatchRejected {
                reason: "dry-run ledger poisoned".to_string(),
            })?;
            submitted.push(operations.to_vec());
            submitted.len() as u128
        };

        let count = u64::try_from(operations.len()).unwrap_or(u64::MAX);
        let receipt = BatchReceipt {
            transaction_hash: format!("0x{:032x}{:032x}", ulid.0, sequence),
            gas_used: BASE_GAS.saturating_add(self.gas_per_operation.saturating_mul(count)),
        };

        info!(
            tx = %receipt.transaction_hash,
            operations = operations.len(),
            gas_used = receipt.gas_used,
            "dry-run batch accepted"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;
    use serde_json::json;
    use vaultflow_core::Address;

    fn op() -> Operation {
        Operation::new(OperationKind::Supply, Address::zero(), json!({}))
    }

    #[tokio::test]
    async fn records_batches_and_charges_gas() {
        let executor = DryRunExecutor::new(1_000);
        let receipt = executor.execute_batch(&[op(), op()]).await.unwrap();

        assert_eq!(receipt.gas_used, 23_000);
        assert_eq!(receipt.transaction_hash.len(), 66);
        assert!(receipt.transaction_hash.starts_with("0x"));
        assert_eq!(executor.submitted().len(), 1);
        assert_eq!(executor.submitted()[0].len(), 2);
    }

    #[tokio::test]
    async fn hashes_are_unique() {
        let executor = DryRunExecutor::default();
        let a = executor.execute_batch(&[op()]).await.unwrap();
        let b = executor.execute_batch(&[op()]).await.unwrap();
        assert_ne!(a.transaction_hash, b.transaction_hash);
    }
}
