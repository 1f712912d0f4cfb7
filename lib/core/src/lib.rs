//! Core value types and utilities for vaultflow.
//!
//! This crate provides the foundational types shared by the chain seam, the
//! workflow engine, and the command line: run identifiers, the rootcause
//! `Result` alias, account context, and decimal/base-unit conversion.

pub mod account;
pub mod error;
pub mod id;
pub mod units;

pub use account::{AccountContext, Address, ParseAddressError};
pub use error::Result;
pub use id::{ParseIdError, RunId};
pub use units::{UnitsError, format_units, parse_units};
