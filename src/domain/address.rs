//! Contract address parsing and display
//!
//! Addresses are accepted as `0x` followed by exactly 40 hex characters in
//! any casing, and always displayed in EIP-55 checksum casing.

use crate::error::{Error, Result};
use alloy_primitives::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Number of hex characters in an address body
pub const ADDRESS_HEX_LEN: usize = 40;

/// A syntactically valid 20-byte account identifier
///
/// Equality is byte-wise, which makes comparisons case-insensitive with
/// respect to the hex rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContractAddress(Address);

impl ContractAddress {
    /// The all-zero address, which the registry returns for unknown names
    pub const ZERO: ContractAddress = ContractAddress(Address::ZERO);

    /// Parse an address, rejecting anything that is not `0x` + 40 hex digits
    pub fn parse(input: &str) -> Result<Self> {
        let body = input.strip_prefix("0x").ok_or_else(|| Error::InvalidAddress {
            input: input.to_string(),
            reason: "missing 0x prefix".into(),
        })?;

        if body.len() != ADDRESS_HEX_LEN {
            return Err(Error::InvalidAddress {
                input: input.to_string(),
                reason: format!(
                    "expected {} hex characters, found {}",
                    ADDRESS_HEX_LEN,
                    body.len()
                ),
            });
        }

        if let Some(bad) = body.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::InvalidAddress {
                input: input.to_string(),
                reason: format!("invalid hex character {:?}", bad),
            });
        }

        let address = Address::from_str(input).map_err(|e| Error::InvalidAddress {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        let mixed_case = body.chars().any(|c| c.is_ascii_uppercase())
            && body.chars().any(|c| c.is_ascii_lowercase());
        if mixed_case && Address::parse_checksummed(input, None).is_err() {
            warn!(
                "Address {} does not match its EIP-55 checksum (expected {})",
                input,
                address.to_checksum(None)
            );
        }

        Ok(Self(address))
    }

    /// Underlying primitive address
    pub fn as_address(&self) -> Address {
        self.0
    }

    /// Check for the all-zero address
    pub fn is_zero(&self) -> bool {
        self.0 == Address::ZERO
    }

    /// EIP-55 checksum rendering
    pub fn to_checksum(&self) -> String {
        self.0.to_checksum(None)
    }
}

impl From<Address> for ContractAddress {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl FromStr for ContractAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl Serialize for ContractAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContractAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
