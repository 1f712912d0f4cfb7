//! Chain-client seam for the vaultflow engine.
//!
//! The workflow engine composes and sequences chain calls but never encodes,
//! signs, or transports them. This crate defines the boundary it talks to:
//!
//! - **Operations**: opaque batch entries and the quantities they carry
//! - **Assets**: the symbol → vault/decimals registry
//! - **Traits**: [`ChainClient`] for builders and read-only queries,
//!   [`BatchExecutor`] for submitting a batch
//! - **Devnet collaborators**: a rate-table [`DevnetClient`] and a
//!   [`DryRunExecutor`] for local runs and tests

pub mod asset;
pub mod client;
pub mod devnet;
pub mod dry_run;
pub mod error;
pub mod operation;

pub use asset::{Asset, AssetRegistry};
pub use client::{BatchExecutor, ChainClient};
pub use devnet::{DevnetClient, DevnetConfig};
pub use dry_run::DryRunExecutor;
pub use error::ChainError;
pub use operation::{BatchReceipt, Operation, OperationKind, Quantity};
