//! In-memory Address Registry
//!
//! Mirrors the on-chain registry's last-write-wins semantics inside the
//! process. Used for standalone rehearsal runs and for exercising the
//! registration client, including the failure paths a live chain can produce.

use crate::domain::address::ContractAddress;
use crate::domain::ports::{AddressRegistry, RegistryEntry, TxHandle, TxReceipt};
use crate::error::{Error, Result};
use alloy_primitives::{keccak256, B256};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the in-memory registry
#[derive(Debug, Clone)]
pub struct MemoryRegistryConfig {
    /// Chain id reported to callers
    pub chain_id: u64,
    /// Receipt polls that return `None` before a transaction finalizes
    pub finalization_polls: u32,
}

impl Default for MemoryRegistryConfig {
    fn default() -> Self {
        Self {
            chain_id: 31337,
            finalization_polls: 0,
        }
    }
}

// =============================================================================
// Registry State
// =============================================================================

#[derive(Debug, Clone)]
struct StoredEntry {
    address: ContractAddress,
    /// Monotonic write sequence, used to pick the latest version per name
    sequence: u64,
}

#[derive(Debug, Clone)]
struct PendingTx {
    entry: RegistryEntry,
    polls_remaining: u32,
    receipt: Option<TxReceipt>,
}

/// Failure injection for rehearsing error paths
#[derive(Debug, Clone, Default)]
struct Faults {
    reject_reason: Option<String>,
    stall_finalization: bool,
    revert_transactions: bool,
    lookup_overrides: BTreeMap<String, ContractAddress>,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: BTreeMap<(String, String), StoredEntry>,
    pending: HashMap<TxHandle, PendingTx>,
    block_number: u64,
    sequence: u64,
    faults: Faults,
}

impl RegistryState {
    /// Most recently written entry under `name`, across versions
    fn latest(&self, name: &str) -> Option<&StoredEntry> {
        self.entries
            .iter()
            .filter(|((n, _), _)| n == name)
            .map(|(_, stored)| stored)
            .max_by_key(|stored| stored.sequence)
    }
}

// =============================================================================
// Memory Registry
// =============================================================================

/// In-process registry with last-write-wins semantics per `(name, version)`
pub struct MemoryRegistry {
    config: MemoryRegistryConfig,
    state: RwLock<RegistryState>,
    submissions: AtomicU64,
    queries: AtomicU64,
}

impl MemoryRegistry {
    /// Create a new in-memory registry
    pub fn new(config: MemoryRegistryConfig) -> Self {
        Self {
            config,
            state: RwLock::new(RegistryState::default()),
            submissions: AtomicU64::new(0),
            queries: AtomicU64::new(0),
        }
    }

    /// Number of `setContractAddress` calls received
    pub fn submissions(&self) -> u64 {
        self.submissions.load(Ordering::Relaxed)
    }

    /// Number of `getContractAddress` calls received
    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Address stored under an exact `(name, version)` key
    pub async fn get_version(&self, name: &str, version: &str) -> Option<ContractAddress> {
        self.state
            .read()
            .await
            .entries
            .get(&(name.to_string(), version.to_string()))
            .map(|stored| stored.address)
    }

    /// Number of distinct `(name, version)` keys
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Reject every subsequent submission with `reason`
    pub async fn reject_submissions(&self, reason: impl Into<String>) {
        self.state.write().await.faults.reject_reason = Some(reason.into());
    }

    /// Keep every subsequent transaction pending forever
    pub async fn stall_finalization(&self) {
        self.state.write().await.faults.stall_finalization = true;
    }

    /// Finalize subsequent transactions with a failed status and no write
    pub async fn revert_transactions(&self) {
        self.state.write().await.faults.revert_transactions = true;
    }

    /// Answer lookups for `name` with `address`, regardless of stored entries
    pub async fn override_lookup(&self, name: &str, address: ContractAddress) {
        self.state
            .write()
            .await
            .faults
            .lookup_overrides
            .insert(name.to_string(), address);
    }

    fn tx_hash(entry: &RegistryEntry, sequence: u64) -> B256 {
        let mut preimage = sequence.to_be_bytes().to_vec();
        preimage.extend_from_slice(entry.name.as_bytes());
        preimage.push(0);
        preimage.extend_from_slice(entry.version.as_bytes());
        preimage.extend_from_slice(entry.address.as_address().as_slice());
        keccak256(preimage)
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new(MemoryRegistryConfig::default())
    }
}

#[async_trait]
impl AddressRegistry for MemoryRegistry {
    async fn set_contract_address(&self, entry: &RegistryEntry) -> Result<TxHandle> {
        self.submissions.fetch_add(1, Ordering::Relaxed);
        let mut state = self.state.write().await;

        if let Some(reason) = &state.faults.reject_reason {
            return Err(Error::Submission {
                reason: reason.clone(),
            });
        }

        state.sequence += 1;
        let tx = TxHandle(Self::tx_hash(entry, state.sequence));
        state.pending.insert(
            tx,
            PendingTx {
                entry: entry.clone(),
                polls_remaining: self.config.finalization_polls,
                receipt: None,
            },
        );

        debug!(
            "Accepted {}@{} -> {} as {}",
            entry.name, entry.version, entry.address, tx
        );
        Ok(tx)
    }

    async fn transaction_receipt(&self, tx: &TxHandle) -> Result<Option<TxReceipt>> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if state.faults.stall_finalization {
            return Ok(None);
        }

        let pending = state.pending.get_mut(tx).ok_or_else(|| Error::Submission {
            reason: format!("unknown transaction {}", tx),
        })?;

        if let Some(receipt) = &pending.receipt {
            return Ok(Some(receipt.clone()));
        }

        if pending.polls_remaining > 0 {
            pending.polls_remaining -= 1;
            return Ok(None);
        }

        state.block_number += 1;
        let succeeded = !state.faults.revert_transactions;
        let receipt = TxReceipt {
            tx: *tx,
            block_number: state.block_number,
            succeeded,
        };
        pending.receipt = Some(receipt.clone());

        if succeeded {
            state.sequence += 1;
            let entry = pending.entry.clone();
            info!(
                "Block {}: {}@{} -> {}",
                state.block_number, entry.name, entry.version, entry.address
            );
            state.entries.insert(
                (entry.name, entry.version),
                StoredEntry {
                    address: entry.address,
                    sequence: state.sequence,
                },
            );
        }

        Ok(Some(receipt))
    }

    async fn get_contract_address(&self, name: &str) -> Result<ContractAddress> {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let state = self.state.read().await;

        if let Some(address) = state.faults.lookup_overrides.get(name) {
            return Ok(*address);
        }

        state
            .latest(name)
            .map(|stored| stored.address)
            .ok_or_else(|| Error::NotFound {
                name: name.to_string(),
            })
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(self.config.chain_id)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
