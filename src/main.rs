//! Contract Registrar
//!
//! Registers a deployed contract's address in the on-chain registry and
//! verifies the registry's answer. Every flag can also be supplied through
//! its environment variable, so the tool runs without arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use contract_registrar::config::{
    DEFAULT_CONTRACT_ADDRESS, DEFAULT_CONTRACT_NAME, DEFAULT_CONTRACT_VERSION,
    DEFAULT_REGISTRY_ADDRESS, DEFAULT_RPC_URL,
};
use contract_registrar::report;
use contract_registrar::{
    ClientConfig, Manifest, OutputFormat, RegistrarConfig, RegistrationClient, RegistryEntry,
    RegistryFactory, Result,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Contract Registrar - register and verify contract addresses on-chain
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-RPC endpoint of the node
    #[arg(long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Address of the deployed registry contract
    #[arg(long, env = "REGISTRY_ADDRESS", default_value = DEFAULT_REGISTRY_ADDRESS)]
    registry_address: String,

    /// Account that signs registrations (must be unlocked on the node)
    #[arg(long, env = "SENDER_ADDRESS")]
    sender: Option<String>,

    /// Confirmations required before a registration counts as finalized
    #[arg(long, env = "CONFIRMATIONS", default_value = "1")]
    confirmations: u64,

    /// Bound on the submission call in seconds
    #[arg(long, env = "SUBMIT_TIMEOUT_SECS", default_value = "30")]
    submit_timeout_secs: u64,

    /// Bound on the wait for finalization in seconds
    #[arg(long, env = "FINALIZATION_TIMEOUT_SECS", default_value = "120")]
    finalization_timeout_secs: u64,

    /// Bound on each read-only query in seconds
    #[arg(long, env = "QUERY_TIMEOUT_SECS", default_value = "30")]
    query_timeout_secs: u64,

    /// Delay between receipt polls in milliseconds
    #[arg(long, env = "POLL_INTERVAL_MS", default_value = "1000")]
    poll_interval_ms: u64,

    /// Run against an in-memory registry (no node required)
    #[arg(long, env = "STANDALONE")]
    standalone: bool,

    /// Result format on stdout
    #[arg(long, env = "OUTPUT", value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register one contract and verify the read-back (default)
    Register(RegisterArgs),

    /// Print the address currently registered under a name
    Lookup {
        /// Logical contract name
        #[arg(long, env = "CONTRACT_NAME", default_value = DEFAULT_CONTRACT_NAME)]
        name: String,
    },

    /// Register every contract listed in a YAML manifest, in order
    Apply {
        /// Manifest path
        manifest: PathBuf,
    },
}

#[derive(Parser, Debug)]
struct RegisterArgs {
    /// Logical contract name
    #[arg(long, env = "CONTRACT_NAME", default_value = DEFAULT_CONTRACT_NAME)]
    name: String,

    /// Deployment version
    #[arg(long = "contract-version", env = "CONTRACT_VERSION", default_value = DEFAULT_CONTRACT_VERSION)]
    contract_version: String,

    /// Deployed contract address
    #[arg(long, env = "CONTRACT_ADDRESS", default_value = DEFAULT_CONTRACT_ADDRESS)]
    address: String,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    ExitCode::from(exit_status(run(args).await) as u8)
}

/// Map the outcome of a run to the process exit status, reporting any error
fn exit_status(outcome: Result<i32>) -> i32 {
    match outcome {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            e.exit_code()
        }
    }
}

/// Without a subcommand the tool registers the contract named by the environment
fn resolve_command(command: Option<Command>) -> Command {
    command.unwrap_or_else(|| Command::Register(RegisterArgs::parse_from([contract_registrar::NAME])))
}

async fn run(args: Args) -> Result<i32> {
    let client_config = ClientConfig {
        submit_timeout: Duration::from_secs(args.submit_timeout_secs),
        finalization_timeout: Duration::from_secs(args.finalization_timeout_secs),
        query_timeout: Duration::from_secs(args.query_timeout_secs),
        poll_interval: Duration::from_millis(args.poll_interval_ms),
    };

    let config = RegistrarConfig::new(
        &args.rpc_url,
        &args.registry_address,
        args.sender.as_deref(),
        args.confirmations,
        args.standalone,
        client_config,
    )?;

    let command = resolve_command(args.command);

    // Everything the operator supplied is validated before the first network call
    let entries = match &command {
        Command::Register(register) => {
            config.validate_for_submission()?;
            vec![RegistryEntry::new(
                &register.name,
                &register.contract_version,
                &register.address,
            )?]
        }
        Command::Apply { manifest } => {
            config.validate_for_submission()?;
            Manifest::load(manifest)?.entries()?
        }
        Command::Lookup { .. } => Vec::new(),
    };

    info!("Starting Contract Registrar");
    info!("  Version: {}", contract_registrar::VERSION);
    info!("  Registry: {}", config.registry_address);
    info!("  Standalone mode: {}", config.standalone);

    let registry = RegistryFactory::create(&config)?;
    let client = RegistrationClient::new(registry, config.client.clone());

    let chain_id = client.chain_id().await?;
    info!("Connected to chain {} via {}", chain_id, client.backend_name());

    match command {
        Command::Lookup { name } => {
            let address = client.lookup(&name).await?;
            print!("{}", report::render_lookup(&name, &address, args.output)?);
            Ok(contract_registrar::error::EXIT_SUCCESS)
        }
        Command::Register(_) => {
            let result = client.register_entry(&entries[0]).await?;
            print!("{}", report::render(&result, args.output)?);
            Ok(report::exit_code(std::slice::from_ref(&result)))
        }
        Command::Apply { .. } => {
            let results = client.register_all(&entries).await?;
            print!("{}", report::render_all(&results, args.output)?);
            Ok(report::exit_code(&results))
        }
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // stdout carries the report; logs go to stderr
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use contract_registrar::error::{EXIT_FATAL, EXIT_SUCCESS, EXIT_VERIFICATION_FAILED};
    use contract_registrar::Error;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("contract-registrar").chain(argv.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_no_subcommand_registers_defaults() {
        let parsed = args(&[]);
        assert!(parsed.command.is_none());

        assert_matches!(
            resolve_command(parsed.command),
            Command::Register(RegisterArgs { name, contract_version, address })
                if name == DEFAULT_CONTRACT_NAME
                    && contract_version == DEFAULT_CONTRACT_VERSION
                    && address == DEFAULT_CONTRACT_ADDRESS
        );
    }

    #[test]
    fn test_explicit_subcommand_is_kept() {
        let parsed = args(&["lookup", "--name", "Treasury"]);
        assert_matches!(
            resolve_command(parsed.command),
            Command::Lookup { name } if name == "Treasury"
        );
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Args::try_parse_from(["contract-registrar", "--no-such-flag"]).is_err());
    }

    #[tokio::test]
    async fn test_standalone_default_run_succeeds() {
        let outcome = run(args(&["--standalone"])).await;
        assert_matches!(outcome, Ok(EXIT_SUCCESS));
        assert_eq!(exit_status(outcome), EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_standalone_lookup_of_unknown_name_exits_2() {
        let outcome = run(args(&["--standalone", "lookup", "--name", "Unknown"])).await;
        assert_matches!(outcome, Err(Error::NotFound { ref name }) if name == "Unknown");
        assert_eq!(exit_status(outcome), EXIT_VERIFICATION_FAILED);
    }

    #[tokio::test]
    async fn test_invalid_address_exits_1() {
        let outcome = run(args(&["--standalone", "register", "--address", "0x1234"])).await;
        assert_matches!(outcome, Err(Error::InvalidAddress { .. }));
        assert_eq!(exit_status(outcome), EXIT_FATAL);
    }

    #[tokio::test]
    async fn test_zero_address_exits_1() {
        let outcome = run(args(&[
            "--standalone",
            "register",
            "--address",
            "0x0000000000000000000000000000000000000000",
        ]))
        .await;
        assert_eq!(exit_status(outcome), EXIT_FATAL);
    }
}
