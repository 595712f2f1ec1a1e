//! Registration Client
//!
//! Submits a registration, waits for it to finalize, reads the address back
//! and reports whether the registry agrees with what was submitted.

use crate::domain::address::ContractAddress;
use crate::domain::ports::{
    AddressRegistryRef, RegistrationResult, RegistryEntry, TxHandle, TxReceipt,
    VerificationOutcome,
};
use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

// =============================================================================
// Client Configuration
// =============================================================================

/// Timeouts and polling for registry operations
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bound on the submission call itself
    pub submit_timeout: Duration,
    /// Bound on the whole wait for finalization
    pub finalization_timeout: Duration,
    /// Bound on each read-only query
    pub query_timeout: Duration,
    /// Delay between receipt polls
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            submit_timeout: Duration::from_secs(30),
            finalization_timeout: Duration::from_secs(120),
            query_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(1000),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        let bounds = [
            ("SUBMIT_TIMEOUT_SECS", self.submit_timeout),
            ("FINALIZATION_TIMEOUT_SECS", self.finalization_timeout),
            ("QUERY_TIMEOUT_SECS", self.query_timeout),
            ("POLL_INTERVAL_MS", self.poll_interval),
        ];
        for (setting, value) in bounds {
            if value.is_zero() {
                return Err(Error::Configuration(format!("{} must be positive", setting)));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Registration Client
// =============================================================================

/// Register-then-verify client over an [`AddressRegistry`](crate::domain::ports::AddressRegistry)
///
/// Holds no state of its own: every verification re-queries the registry.
pub struct RegistrationClient {
    config: ClientConfig,
    registry: AddressRegistryRef,
}

impl RegistrationClient {
    /// Create a new registration client
    pub fn new(registry: AddressRegistryRef, config: ClientConfig) -> Self {
        Self { config, registry }
    }

    /// Name of the registry backend in use
    pub fn backend_name(&self) -> &str {
        self.registry.backend_name()
    }

    /// Chain the registry lives on
    pub async fn chain_id(&self) -> Result<u64> {
        bounded(
            self.config.query_timeout,
            "chain id query",
            self.registry.chain_id(),
        )
        .await
    }

    /// Register `address` under `(name, version)` and verify the read-back
    ///
    /// Input is validated before any network call. A registry that disagrees
    /// after a successful submission yields `success: false`, not an error.
    pub async fn register(
        &self,
        name: &str,
        version: &str,
        address: &str,
    ) -> Result<RegistrationResult> {
        let entry = RegistryEntry::new(name, version, address)?;
        self.register_entry(&entry).await
    }

    /// Register a pre-validated entry and verify the read-back
    pub async fn register_entry(&self, entry: &RegistryEntry) -> Result<RegistrationResult> {
        info!(
            "Registering {}@{} -> {} via {}",
            entry.name,
            entry.version,
            entry.address,
            self.backend_name()
        );

        let tx = self.submit(entry).await?;
        let receipt = self.await_finalization(&tx).await?;
        info!("{} finalized in block {}", tx, receipt.block_number);

        let (outcome, registered_address) = match self.lookup(&entry.name).await {
            Ok(found) if found == entry.address => (VerificationOutcome::Matched, Some(found)),
            Ok(found) => {
                warn!(
                    "Registry reports {} for {}, submitted {}",
                    found, entry.name, entry.address
                );
                (VerificationOutcome::Mismatch, Some(found))
            }
            Err(Error::NotFound { .. }) => {
                warn!("Registry has no entry for {} after finalization", entry.name);
                (VerificationOutcome::NotFound, None)
            }
            Err(e) => return Err(e),
        };

        info!("Verification of {}@{}: {}", entry.name, entry.version, outcome);

        Ok(RegistrationResult {
            success: outcome == VerificationOutcome::Matched,
            registered_address,
            name: entry.name.clone(),
            version: entry.version.clone(),
            submitted_address: entry.address,
            transaction_hash: tx,
            block_number: receipt.block_number,
            outcome,
            verified_at: chrono::Utc::now(),
        })
    }

    /// Register entries one after another, stopping at the first fatal error
    pub async fn register_all(&self, entries: &[RegistryEntry]) -> Result<Vec<RegistrationResult>> {
        let mut results = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            debug!("Registration {}/{}", index + 1, entries.len());
            results.push(self.register_entry(entry).await?);
        }
        Ok(results)
    }

    /// Read the address currently registered under `name`
    pub async fn lookup(&self, name: &str) -> Result<ContractAddress> {
        if name.trim().is_empty() {
            return Err(Error::Configuration("contract name must not be empty".into()));
        }
        bounded(
            self.config.query_timeout,
            "read-back query",
            self.registry.get_contract_address(name),
        )
        .await
    }

    async fn submit(&self, entry: &RegistryEntry) -> Result<TxHandle> {
        bounded(
            self.config.submit_timeout,
            "submission",
            self.registry.set_contract_address(entry),
        )
        .await
        .map_err(into_submission)
    }

    async fn await_finalization(&self, tx: &TxHandle) -> Result<TxReceipt> {
        let poll = async {
            loop {
                match self.registry.transaction_receipt(tx).await {
                    Ok(Some(receipt)) => return Ok(receipt),
                    Ok(None) => {
                        debug!("{} not finalized yet", tx);
                        tokio::time::sleep(self.config.poll_interval).await;
                    }
                    Err(e) => return Err(into_submission(e)),
                }
            }
        };

        let receipt = bounded(self.config.finalization_timeout, "finalization", poll).await?;
        if !receipt.succeeded {
            return Err(Error::Submission {
                reason: format!("{} reverted in block {}", tx, receipt.block_number),
            });
        }
        Ok(receipt)
    }
}

/// Run `fut` under `limit`, naming `operation` in the timeout error
async fn bounded<T>(
    limit: Duration,
    operation: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Error::Timeout {
            operation: operation.to_string(),
            after: limit,
        })?
}

/// Failures before finalization are submission failures
fn into_submission(err: Error) -> Error {
    match err {
        Error::Submission { .. } | Error::Timeout { .. } | Error::Configuration(_) => err,
        other => Error::Submission {
            reason: other.to_string(),
        },
    }
}
