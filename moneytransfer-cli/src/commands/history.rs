//! History command - show the transfer journal

use std::process::ExitCode;

use anyhow::Result;

use super::get_context;
use crate::output::{align_right, create_table, format_amount, info};

pub fn run(limit: usize, json: bool) -> Result<ExitCode> {
    let ctx = get_context()?;
    let entries = ctx.account_service.history(limit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(ExitCode::SUCCESS);
    }

    if entries.is_empty() {
        info("No transfers yet");
        return Ok(ExitCode::SUCCESS);
    }

    let mut table = create_table();
    table.set_header(vec!["Time", "From", "To", "Amount", "Transfer ID"]);
    for entry in &entries {
        table.add_row(vec![
            entry.committed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.sender.clone(),
            entry.receiver.clone(),
            format_amount(entry.amount),
            entry.transfer_id.to_string(),
        ]);
    }
    align_right(&mut table, &[3]);

    println!("{}", table);
    Ok(ExitCode::SUCCESS)
}
