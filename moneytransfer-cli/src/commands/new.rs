//! New command - create new records

use std::process::ExitCode;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::get_context;
use crate::output::format_amount;

#[derive(Subcommand)]
pub enum NewCommands {
    /// Open a new account with an opening balance
    Account {
        /// Unique account name
        name: String,
        /// Opening balance in minor units
        #[arg(long, default_value_t = 0)]
        balance: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: NewCommands) -> Result<ExitCode> {
    match command {
        NewCommands::Account { name, balance, json } => run_account(&name, balance, json),
    }
}

fn run_account(name: &str, balance: i64, json: bool) -> Result<ExitCode> {
    let ctx = get_context()?;
    let account = ctx.account_service.open_account(name, balance)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&account)?);
    } else {
        println!("{}", "Account created".green());
        println!("  ID: {}", account.id);
        println!("  Name: {}", account.name);
        println!("  Balance: {}", format_amount(account.balance));
    }

    Ok(ExitCode::SUCCESS)
}
