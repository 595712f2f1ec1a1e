//! Domain Ports - Core trait definitions for the contract registrar
//!
//! These traits define the boundary between registration logic and the
//! external registry. Adapters implement them to provide concrete transports.

use super::address::ContractAddress;
use crate::error::{Error, Result};
use alloy_primitives::B256;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// =============================================================================
// Registry Entry
// =============================================================================

/// A `(name, version) -> address` record as submitted to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Logical role of the contract (e.g. a token or staking contract)
    pub name: String,
    /// Free-form deployment version (e.g. "1.0")
    pub version: String,
    /// Deployed contract address
    pub address: ContractAddress,
}

impl RegistryEntry {
    /// Build an entry from raw operator input, validating every field
    pub fn new(name: &str, version: &str, address: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::Configuration("contract name must not be empty".into()));
        }
        if version.trim().is_empty() {
            return Err(Error::Configuration(format!(
                "version for {:?} must not be empty",
                name
            )));
        }
        let address = ContractAddress::parse(address.trim())?;
        // The registry answers zero for names it does not know
        if address.is_zero() {
            return Err(Error::InvalidAddress {
                input: address.to_string(),
                reason: "the zero address cannot be registered".into(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            address,
        })
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// Opaque handle to a submitted registration transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHandle(pub B256);

impl std::fmt::Display for TxHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receipt of a finalized transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction the receipt belongs to
    pub tx: TxHandle,
    /// Block that included the transaction
    pub block_number: u64,
    /// Whether execution succeeded (status 1)
    pub succeeded: bool,
}

// =============================================================================
// Registration Result
// =============================================================================

/// Outcome of comparing the read-back address with the submitted one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationOutcome {
    /// Registry reports the submitted address
    Matched,
    /// Registry reports a different address
    Mismatch,
    /// Registry has no entry for the name
    NotFound,
}

impl std::fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationOutcome::Matched => write!(f, "matched"),
            VerificationOutcome::Mismatch => write!(f, "mismatch"),
            VerificationOutcome::NotFound => write!(f, "notFound"),
        }
    }
}

/// Result of a register-then-verify round trip
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    /// True iff the read-back address equals the submitted address
    pub success: bool,
    /// Address the registry reported, if any
    pub registered_address: Option<ContractAddress>,
    pub name: String,
    pub version: String,
    pub submitted_address: ContractAddress,
    pub transaction_hash: TxHandle,
    pub block_number: u64,
    pub outcome: VerificationOutcome,
    pub verified_at: chrono::DateTime<chrono::Utc>,
}

impl RegistrationResult {
    /// Convert a failed verification into an error for callers that want `?`
    pub fn into_verified(self) -> Result<Self> {
        match self.outcome {
            VerificationOutcome::Matched => Ok(self),
            VerificationOutcome::Mismatch => Err(Error::VerificationMismatch {
                name: self.name,
                expected: self.submitted_address.to_string(),
                actual: self
                    .registered_address
                    .map(|a| a.to_string())
                    .unwrap_or_default(),
            }),
            VerificationOutcome::NotFound => Err(Error::NotFound { name: self.name }),
        }
    }
}

// =============================================================================
// Address Registry Port
// =============================================================================

/// Port for the external name/version address registry
#[async_trait]
pub trait AddressRegistry: Send + Sync {
    /// Submit `setContractAddress(name, version, address)`
    ///
    /// Returns as soon as the transaction is accepted for inclusion; callers
    /// must wait for [`AddressRegistry::transaction_receipt`] before treating
    /// the registration as effective.
    async fn set_contract_address(&self, entry: &RegistryEntry) -> Result<TxHandle>;

    /// Poll for the receipt of a submitted transaction
    ///
    /// Returns `None` until the transaction is finalized.
    async fn transaction_receipt(&self, tx: &TxHandle) -> Result<Option<TxReceipt>>;

    /// Query `getContractAddress(name)`
    ///
    /// Returns the address of the most recent registration under `name`,
    /// or [`Error::NotFound`] when there is none.
    async fn get_contract_address(&self, name: &str) -> Result<ContractAddress>;

    /// Chain the registry lives on
    async fn chain_id(&self) -> Result<u64>;

    /// Get backend name
    fn backend_name(&self) -> &str;
}

pub type AddressRegistryRef = Arc<dyn AddressRegistry>;
