//! Error types for the chain seam.
//!
//! These are returned directly (not wrapped in a report) by the
//! [`ChainClient`](crate::ChainClient) and
//! [`BatchExecutor`](crate::BatchExecutor) traits so the engine can record
//! the message on the step that hit it.

use std::fmt;

/// Errors from chain-client queries and batch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The symbol is not in the asset registry.
    UnknownAsset { symbol: String },
    /// A read-only query failed.
    QueryFailed { query: String, reason: String },
    /// The pool cannot absorb the requested input amount.
    PoolCapacityExceeded {
        pool: String,
        amount_in: u128,
        limit: u128,
    },
    /// No quote could be produced for the pair.
    QuoteUnavailable { token_in: String, token_out: String },
    /// The executor rejected the batch.
    BatchRejected { reason: String },
    /// A client was constructed from unusable settings.
    InvalidConfig { reason: String },
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAsset { symbol } => write!(f, "unknown asset: {symbol}"),
            Self::QueryFailed { query, reason } => {
                write!(f, "chain query '{query}' failed: {reason}")
            }
            Self::PoolCapacityExceeded {
                pool,
                amount_in,
                limit,
            } => write!(f, "pool {pool} cannot absorb {amount_in} (limit {limit})"),
            Self::QuoteUnavailable {
                token_in,
                token_out,
            } => write!(f, "no quote available for {token_in} -> {token_out}"),
            Self::BatchRejected { reason } => write!(f, "batch rejected: {reason}"),
            Self::InvalidConfig { reason } => write!(f, "invalid chain client config: {reason}"),
        }
    }
}

impl std::error::Error for ChainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_asset_display() {
        let err = ChainError::UnknownAsset {
            symbol: "FOO".to_string(),
        };
        assert_eq!(err.to_string(), "unknown asset: FOO");
    }

    #[test]
    fn capacity_display_mentions_limit() {
        let err = ChainError::PoolCapacityExceeded {
            pool: "0xpool".to_string(),
            amount_in: 500,
            limit: 100,
        };
        assert!(err.to_string().contains("limit 100"));
    }

    #[test]
    fn batch_rejected_display() {
        let err = ChainError::BatchRejected {
            reason: "insufficient collateral".to_string(),
        };
        assert!(err.to_string().contains("insufficient collateral"));
    }
}
