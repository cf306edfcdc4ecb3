//! clibridge - run any CLI program as a text-generation backend.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use clibridge::client::{CliAdapter, CliLm};
use clibridge::codec::CompletionOutput;
use clibridge::config::BridgeConfig;
use clibridge::request::{GenerationOptions, GenerationRequest};

#[derive(Parser)]
#[command(
    name = "clibridge",
    about = "Bridge generation requests to CLI programs over stdin/stdout",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a prompt through an external command.
    Run {
        /// The prompt to send.
        prompt: String,
        /// Number of completions to request.
        #[arg(short, long, default_value_t = 1)]
        n: u64,
        /// Deadline in seconds for each invocation.
        #[arg(long)]
        timeout_secs: Option<f64>,
        /// Send the structured JSON payload instead of a plain transcript.
        #[arg(long)]
        structured: bool,
        /// Load bridge settings from a TOML file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// The command to run, e.g. `-- codex exec --json`.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

async fn run(
    prompt: String,
    n: u64,
    timeout_secs: Option<f64>,
    structured: bool,
    config: Option<PathBuf>,
    command: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut bridge_config = match config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::load_default()?,
    };
    if !command.is_empty() {
        bridge_config.command = command;
    }
    if let Some(secs) = timeout_secs {
        bridge_config.timeout_secs = Some(secs);
    }
    let spec = bridge_config.into_spec()?;

    let request = GenerationRequest::from_prompt(prompt)
        .with_options(GenerationOptions::new().with_n(n));

    if structured {
        let adapter = CliAdapter::new(spec);
        for (index, output) in adapter.generate(&request).await?.iter().enumerate() {
            match output {
                CompletionOutput::Text(text) => println!("[{index}] {text}"),
                CompletionOutput::Fields(fields) => {
                    for (name, value) in fields {
                        println!("[{index}] {name}: {value}");
                    }
                }
            }
        }
    } else {
        let lm = CliLm::new(spec);
        for (index, text) in lm.generate(&request).await?.iter().enumerate() {
            println!("[{index}] {text}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Commands::Run {
        prompt,
        n,
        timeout_secs,
        structured,
        config,
        command,
    } = cli.command;

    if let Err(error) = run(prompt, n, timeout_secs, structured, config, command).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
