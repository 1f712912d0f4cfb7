//! Account context supplied by the wallet collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a string is not a 20-byte hex address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAddressError {
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid address '{}'", self.input)
    }
}

impl std::error::Error for ParseAddressError {}

/// A 20-byte account or contract address in `0x`-prefixed hex.
///
/// Stored lowercased so that checksummed and plain spellings compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// The all-zero address, which the chain uses to mean "none".
    #[must_use]
    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(40)))
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0[2..].bytes().all(|b| b == b'0')
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| ParseAddressError {
                input: s.to_string(),
            })?;
        if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseAddressError {
                input: s.to_string(),
            });
        }
        Ok(Self(format!("0x{}", hex.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for Address {
    type Error = ParseAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

/// The connected account a workflow runs on behalf of.
///
/// Passed explicitly into validation, compilation, and execution so the
/// engine never reads wallet state from ambient scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContext {
    /// The account's address; also the default recipient of borrows,
    /// withdrawals, and swap output.
    pub address: Address,
}

impl AccountContext {
    /// Creates a context for the given address.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}
