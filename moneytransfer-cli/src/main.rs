//! Money Transfer CLI - shared ledger in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{accounts, history, new, transfer};

/// Money Transfer - move funds between ledger accounts
#[derive(Parser)]
#[command(name = "mt", version, about, long_about = None)]
struct Cli {
    /// Log debug events to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List accounts and balances
    Accounts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Transfer funds between two accounts
    Transfer {
        /// Sending account name
        from: String,
        /// Receiving account name
        to: String,
        /// Amount in minor units
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Give up waiting for account locks after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create new records
    New {
        #[command(subcommand)]
        command: new::NewCommands,
    },

    /// Show recent committed transfers
    History {
        /// Number of transfers to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            let message = format!("{:#}", e);
            tracing::warn!(error = %message, "command failed");
            output::error(&message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Accounts { json } => accounts::run(json),
        Commands::Transfer { from, to, amount, timeout_ms, json } => {
            transfer::run(&from, &to, &amount, timeout_ms, json)
        }
        Commands::New { command } => new::run(command),
        Commands::History { limit, json } => history::run(limit, json),
    }
}
