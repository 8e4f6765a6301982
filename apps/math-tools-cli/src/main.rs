mod args;
mod config;
mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use math_tools::MathToolsLocalClient;
use math_tools::domain::registry;
use math_tools_sdk::{
    ArgValue, Arguments, IntentResponse, MathToolsClient, OperationResult, Problem,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::Overrides;
use crate::logging::LogFormat;

/// Validated calls to a remote math server
#[derive(Parser)]
#[command(name = "math-tools")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the math server (overrides config and environment)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-attempt timeout, e.g. "2s" or "500ms"
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Retries after the first attempt
    #[arg(long, global = true)]
    retries: Option<usize>,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call an operation
    Call {
        /// Operation name, e.g. gcd
        operation: String,
        /// Argument as NAME=VALUE; repeat for each argument
        #[arg(
            short = 'a',
            long = "arg",
            value_name = "NAME=VALUE",
            value_parser = args::parse_pair
        )]
        args: Vec<(String, ArgValue)>,
    },
    /// Handle an intent, e.g. MathGcd
    Intent {
        intent_type: String,
        /// Slot as NAME=VALUE; repeat for each slot
        #[arg(
            short = 's',
            long = "slot",
            value_name = "NAME=VALUE",
            value_parser = args::parse_pair
        )]
        slots: Vec<(String, ArgValue)>,
    },
    /// Answer an English question, e.g. "what is the gcd of 12 and 18"
    Ask { utterance: String },
    /// List the operation catalog
    Operations,
    /// Validate configuration and print it with secrets redacted
    Check,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_format);

    let overrides = Overrides {
        base_url: cli.base_url,
        timeout: cli.timeout,
        max_retries: cli.retries,
    };

    let outcome = match cli.command {
        Commands::Operations => {
            print_json(registry::all())?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Check => {
            let config = config::load(cli.config.as_deref(), &overrides)?;
            print_json(&config)?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::Call { operation, args } => {
            let client = connect(cli.config.as_deref(), &overrides)?;
            let result = client
                .dispatch(&operation, args.into_iter().collect::<Arguments>())
                .await;
            result.map(|result| Output::Call { operation, result })
        }
        Commands::Intent { intent_type, slots } => {
            let client = connect(cli.config.as_deref(), &overrides)?;
            client
                .handle_intent(&intent_type, slots.into_iter().collect())
                .await
                .map(Output::Answer)
        }
        Commands::Ask { utterance } => {
            let client = connect(cli.config.as_deref(), &overrides)?;
            client.ask(&utterance).await.map(Output::Answer)
        }
    };

    match outcome {
        Ok(output) => {
            print_json(&output)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::info!(code = err.code(), "call failed");
            print_json(&Problem::from(&err))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Output {
    Call {
        operation: String,
        result: OperationResult,
    },
    Answer(IntentResponse),
}

fn connect(path: Option<&Path>, overrides: &Overrides) -> Result<MathToolsLocalClient> {
    let config = config::load(path, overrides)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());
    Ok(MathToolsLocalClient::connect(&config, cancel)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight call");
            cancel.cancel();
        }
    });
}
