//! Registration client
//!
//! Drives the register, finalize, read-back and compare sequence against
//! an address registry adapter.

pub mod registration;

pub use registration::*;
