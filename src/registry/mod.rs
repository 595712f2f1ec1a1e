//! Address Registry Adapters
//!
//! Provides adapters for the contract registry:
//! - JSON-RPC: the deployed registry contract, through an Ethereum node
//! - Memory: an in-process registry for standalone runs

pub mod memory;
pub mod rpc;

pub use memory::*;
pub use rpc::*;

use crate::client::ClientConfig;
use crate::config::RegistrarConfig;
use crate::domain::ports::AddressRegistry;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Headroom between the client's deadlines and the HTTP deadline
const TRANSPORT_SLACK: Duration = Duration::from_secs(5);

/// Factory for creating registry adapters
pub struct RegistryFactory;

impl RegistryFactory {
    /// Create the adapter selected by the configuration
    pub fn create(config: &RegistrarConfig) -> Result<Arc<dyn AddressRegistry>> {
        if config.standalone {
            return Ok(Arc::new(MemoryRegistry::default()));
        }

        Ok(Arc::new(RpcRegistry::new(RpcRegistryConfig {
            rpc_url: config.rpc_url.clone(),
            registry_address: config.registry_address,
            sender: config.sender,
            confirmations: config.confirmations,
            request_timeout: Self::transport_timeout(&config.client),
        })?))
    }

    /// HTTP deadline that only fires after every client-side bound has
    pub fn transport_timeout(client: &ClientConfig) -> Duration {
        [
            client.submit_timeout,
            client.finalization_timeout,
            client.query_timeout,
        ]
        .into_iter()
        .max()
        .unwrap_or_default()
            + TRANSPORT_SLACK
    }
}
