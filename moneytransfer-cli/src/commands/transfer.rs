//! Transfer command - move funds between two accounts

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;

use moneytransfer_core::{TransferOptions, TransferRequest, TransferResult};

use super::get_context;
use crate::output::{error, format_amount, success};

pub fn run(from: &str, to: &str, amount: &str, timeout_ms: Option<u64>, json: bool) -> Result<ExitCode> {
    // Malformed amount text is rejected before touching the ledger
    let result = match TransferRequest::parse(from, to, amount) {
        Ok(request) => {
            let ctx = get_context()?;
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| ctx.transfer_service.lock_timeout());
            ctx.transfer_service
                .execute_with(&request, TransferOptions::with_timeout(timeout))?
        }
        Err(reason) => TransferResult::Rejected(reason),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(match result {
        TransferResult::Committed(_) => ExitCode::SUCCESS,
        TransferResult::Rejected(_) => ExitCode::FAILURE,
    })
}

fn print_result(result: &TransferResult) {
    match result {
        TransferResult::Committed(receipt) => {
            success(&format!(
                "Transferred {} from {} to {}",
                format_amount(receipt.amount),
                receipt.sender,
                receipt.receiver
            ));
            println!("  Transfer ID: {}", receipt.transfer_id);
            println!(
                "  {}: {}",
                receipt.sender,
                format_amount(receipt.sender_balance)
            );
            println!(
                "  {}: {}",
                receipt.receiver,
                format_amount(receipt.receiver_balance)
            );
            println!("  Time: {}", receipt.committed_at.to_rfc3339());
        }
        TransferResult::Rejected(reason) => {
            error(&reason.to_string());
            eprintln!("  Reason: {}", reason.kind());
        }
    }
}
