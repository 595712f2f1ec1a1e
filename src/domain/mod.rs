//! Domain layer - Core types and port definitions
//!
//! This module defines the registry entry model and the trait (port) that
//! registry adapters implement, following hexagonal architecture principles.

pub mod address;
pub mod ports;

pub use address::*;
pub use ports::*;
