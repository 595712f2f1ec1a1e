//! Registrar configuration
//!
//! Built once at process start from CLI flags and environment variables and
//! passed by reference to everything that needs it.

use crate::client::ClientConfig;
use crate::domain::address::ContractAddress;
use crate::error::{Error, Result};

/// Local development node
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Registry deployed by the first transaction of the default dev account
pub const DEFAULT_REGISTRY_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

/// Staking contract registered when no target is given
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0xcC7A9e9c8E60ecc12D5A6cd9BEFEFFCD253104E9";
pub const DEFAULT_CONTRACT_NAME: &str = "ETHStaking";
pub const DEFAULT_CONTRACT_VERSION: &str = "1.0";

/// Top-level configuration
#[derive(Debug, Clone)]
pub struct RegistrarConfig {
    /// JSON-RPC endpoint of the node
    pub rpc_url: String,
    /// Deployed registry contract
    pub registry_address: ContractAddress,
    /// Account that submits registrations
    pub sender: Option<ContractAddress>,
    /// Confirmations required before a registration counts as finalized
    pub confirmations: u64,
    /// Use the in-memory registry instead of a node
    pub standalone: bool,
    /// Timeouts and polling for the registration client
    pub client: ClientConfig,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            registry_address: ContractAddress::parse(DEFAULT_REGISTRY_ADDRESS)
                .expect("fallback registry address is well formed"),
            sender: None,
            confirmations: 1,
            standalone: false,
            client: ClientConfig::default(),
        }
    }
}

impl RegistrarConfig {
    /// Build a configuration from raw operator input
    pub fn new(
        rpc_url: &str,
        registry_address: &str,
        sender: Option<&str>,
        confirmations: u64,
        standalone: bool,
        client: ClientConfig,
    ) -> Result<Self> {
        let registry_address = parse_setting("REGISTRY_ADDRESS", registry_address)?;
        let sender = sender
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_setting("SENDER_ADDRESS", s))
            .transpose()?;

        let config = Self {
            rpc_url: rpc_url.trim().to_string(),
            registry_address,
            sender,
            confirmations,
            standalone,
            client,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check settings needed by every command
    pub fn validate(&self) -> Result<()> {
        if !self.standalone
            && !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://"))
        {
            return Err(Error::Configuration(format!(
                "RPC_URL must be an http(s) URL, got {:?}",
                self.rpc_url
            )));
        }
        if self.confirmations == 0 {
            return Err(Error::Configuration(
                "CONFIRMATIONS must be at least 1".into(),
            ));
        }
        self.client.validate()
    }

    /// Check settings needed by commands that submit transactions
    pub fn validate_for_submission(&self) -> Result<()> {
        self.validate()?;
        if !self.standalone && self.sender.is_none() {
            return Err(Error::Configuration(
                "SENDER_ADDRESS is not set; it names the account that signs registrations".into(),
            ));
        }
        Ok(())
    }
}

fn parse_setting(source: &str, raw: &str) -> Result<ContractAddress> {
    ContractAddress::parse(raw.trim())
        .map_err(|e| Error::Configuration(format!("{}: {}", source, e)))
}
