//! Accounts command - list accounts and balances

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use moneytransfer_core::Account;

use super::get_context;
use crate::output::{align_right, create_table, format_amount, info};

#[derive(Serialize)]
struct AccountsReport<'a> {
    accounts: &'a [Account],
    total: i128,
}

pub fn run(json: bool) -> Result<ExitCode> {
    let ctx = get_context()?;
    let accounts = ctx.account_service.list_accounts()?;
    let total = ctx.account_service.total_balance()?;

    if json {
        let report = AccountsReport {
            accounts: &accounts,
            total,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    }

    if accounts.is_empty() {
        info("No accounts yet. Create one with `mt new account <NAME> --balance <AMOUNT>`");
        return Ok(ExitCode::SUCCESS);
    }

    let mut table = create_table();
    table.set_header(vec!["ID", "Name", "Balance"]);
    for account in &accounts {
        table.add_row(vec![
            account.id.to_string(),
            account.name.clone(),
            format_amount(account.balance),
        ]);
    }
    align_right(&mut table, &[0, 2]);

    println!("{}", table);
    println!("{} {}", "Total:".bold(), format_amount(total));

    Ok(ExitCode::SUCCESS)
}
