//! Stackpilot CLI entrypoint.
//!
//! This is the main entrypoint for the stackpilot command-line tool.

use std::path::Path;
use std::process::ExitCode;

use stackpilot::changeset::{CloudFormationChangeSets, ParameterOverride};
use stackpilot::cli::{derive_stack_name, Cli, DiffPresenter, TerminalOperator};
use stackpilot::error::{InputError, Result};
use stackpilot::orchestrator::{ChangeSetOrchestrator, UpdateRequest};
use stackpilot::template::{PayloadResolver, S3BlobStore};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Largest template file accepted, in bytes.
const MAX_TEMPLATE_SIZE: usize = 1 << 20;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_operator_exit() => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<()> {
    let template_body = load_template(&cli.template)?;
    let stack_name = cli
        .stack_name
        .clone()
        .unwrap_or_else(|| derive_stack_name(&cli.template));
    let overrides = cli
        .param
        .iter()
        .map(|spec| ParameterOverride::parse(spec))
        .collect::<Result<Vec<_>>>()?;

    let cancel = shutdown_token();

    let config = aws_config::load_from_env().await;
    let ops = CloudFormationChangeSets::new(&config);
    let resolver = PayloadResolver::new(S3BlobStore::new(&config));
    let operator = TerminalOperator::new();
    let presenter = DiffPresenter::new(cli.output);

    let mut orchestrator = ChangeSetOrchestrator::new(
        &ops,
        resolver,
        &operator,
        presenter,
        cancel,
        UpdateRequest {
            stack_name,
            template_body,
            overrides,
        },
    );

    orchestrator.run().await
}

/// Reads the template file, enforcing the hard size cap.
fn load_template(path: &Path) -> Result<String> {
    let body = std::fs::read_to_string(path)?;
    if body.len() > MAX_TEMPLATE_SIZE {
        return Err(InputError::TemplateTooLarge {
            size: body.len(),
            limit: MAX_TEMPLATE_SIZE,
        }
        .into());
    }
    Ok(body)
}

/// Wires Ctrl-C to a cancellation token observed at every suspend point.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let signal_token = token.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            return;
        }
        debug!("Received SIGINT (Ctrl+C)");
        signal_token.cancel();
    });

    token
}
