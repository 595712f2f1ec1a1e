//! Error types for the contract registrar
//!
//! Provides structured error types for configuration, registry submission,
//! read-back verification and the JSON-RPC transport.

use std::time::Duration;
use thiserror::Error;

/// Process exit code for a fully successful run
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code for any fatal failure
pub const EXIT_FATAL: i32 = 1;

/// Process exit code when the run completed but verification failed
pub const EXIT_VERIFICATION_FAILED: i32 = 2;

/// Unified error type for the registrar
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },

    // =========================================================================
    // Registry Errors
    // =========================================================================
    #[error("Submission rejected: {reason}")]
    Submission { reason: String },

    #[error("No registry entry for {name:?}")]
    NotFound { name: String },

    #[error("Registry returned {actual} for {name:?}, expected {expected}")]
    VerificationMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Timed out waiting for {operation} after {after:?}")]
    Timeout { operation: String, after: Duration },

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Manifest parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code to report for this error
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            EXIT_FATAL
        } else {
            EXIT_VERIFICATION_FAILED
        }
    }

    /// Verification failures are reportable outcomes; everything else aborts the run
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::VerificationMismatch { .. } | Error::NotFound { .. }
        )
    }

    /// Check if this error was raised before any network call
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_) | Error::InvalidAddress { .. } | Error::YamlParse(_)
        )
    }

    /// Check if re-running the same invocation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::Transport(_))
    }
}

/// Result type alias for the registrar
pub type Result<T> = std::result::Result<T, Error>;
