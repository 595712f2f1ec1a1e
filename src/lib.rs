//! Contract Registrar
//!
//! Registers deployed contract addresses in an on-chain name/version
//! registry, waits for the registration to finalize, and verifies that the
//! registry reports the submitted address.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    contract-registrar CLI                    │
//! │        register │ lookup │ apply <manifest.yaml>             │
//! ├──────────────────────────────────────────────────────────────┤
//! │                     RegistrationClient                       │
//! │   submit ─▶ await finalization ─▶ read back ─▶ compare       │
//! │   (every step bounded by a timeout)                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │                 AddressRegistry (port)                       │
//! │  ┌───────────────────────────┐  ┌─────────────────────────┐  │
//! │  │       RpcRegistry         │  │     MemoryRegistry      │  │
//! │  │ (JSON-RPC + ABI encoding) │  │ (standalone rehearsal)  │  │
//! │  └───────────────────────────┘  └─────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`client`]: Register-then-verify client
//! - [`registry`]: Registry adapters
//! - [`domain`]: Core domain types and traits
//! - [`config`]: Process-wide configuration
//! - [`manifest`]: Multi-contract registration manifests
//! - [`report`]: Result rendering
//! - [`error`]: Error types and handling

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod report;

// Re-export commonly used types
pub use client::{ClientConfig, RegistrationClient};

pub use config::RegistrarConfig;

pub use domain::{
    AddressRegistry, AddressRegistryRef, ContractAddress, RegistrationResult, RegistryEntry,
    TxHandle, TxReceipt, VerificationOutcome,
};

pub use error::{Error, Result};

pub use manifest::Manifest;

pub use registry::{MemoryRegistry, RegistryFactory, RpcRegistry};

pub use report::OutputFormat;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
