//! Operator-facing rendering of registration results
//!
//! Business logic returns typed records; this module turns them into text
//! or JSON for stdout.

use crate::domain::address::ContractAddress;
use crate::domain::ports::RegistrationResult;
use crate::error::{Result, EXIT_SUCCESS, EXIT_VERIFICATION_FAILED};
use serde_json::json;
use std::fmt::Write;

/// Output format for results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render a single registration result
pub fn render(result: &RegistrationResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(render_text(result)),
    }
}

/// Render results of a multi-contract run
pub fn render_all(results: &[RegistrationResult], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(results)?),
        OutputFormat::Text => {
            let mut out = String::new();
            for result in results {
                out.push_str(&render_text(result));
            }
            let failed = results.iter().filter(|r| !r.success).count();
            let _ = writeln!(
                out,
                "{} registered, {} failed verification",
                results.len() - failed,
                failed
            );
            Ok(out)
        }
    }
}

/// Render the answer to a read-only lookup
pub fn render_lookup(name: &str, address: &ContractAddress, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
            "name": name,
            "address": address,
        }))?),
        OutputFormat::Text => Ok(format!("{}\n", address)),
    }
}

/// Exit code for a completed run: non-zero if any verification failed
pub fn exit_code(results: &[RegistrationResult]) -> i32 {
    if results.iter().all(|r| r.success) {
        EXIT_SUCCESS
    } else {
        EXIT_VERIFICATION_FAILED
    }
}

fn render_text(result: &RegistrationResult) -> String {
    let registered = result
        .registered_address
        .map(|a| a.to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}@{} {}",
        result.name,
        result.version,
        if result.success { "OK" } else { "FAILED" }
    );
    let _ = writeln!(out, "  submitted:  {}", result.submitted_address);
    let _ = writeln!(out, "  registered: {} ({})", registered, result.outcome);
    let _ = writeln!(
        out,
        "  tx:         {} (block {})",
        result.transaction_hash, result.block_number
    );
    out
}
