//! Bill listing commands

use std::path::Path;

use anyhow::{Context, Result};
use billsense_core::{get_bills_by_priority_now, get_upcoming_bills, BillStatus, DetectedBill};

use super::{load_bills, money, truncate};

pub fn cmd_detect(
    config: Option<&Path>,
    file: &Path,
    prefs: Option<&Path>,
    json: bool,
) -> Result<()> {
    let bills = load_bills(config, file, prefs)?;

    if json {
        return print_json(&bills);
    }

    if bills.is_empty() {
        println!("No recurring bills found in {}", file.display());
        return Ok(());
    }

    println!();
    println!("📋 Detected Bills ({})", bills.len());
    println!("   ─────────────────────────────────────────────────────────────");
    for bill in get_bills_by_priority_now(&bills) {
        println!("{}", bill_row(&bill));
    }

    Ok(())
}

pub fn cmd_upcoming(
    config: Option<&Path>,
    file: &Path,
    days: i64,
    prefs: Option<&Path>,
    json: bool,
) -> Result<()> {
    if days < 0 {
        anyhow::bail!("--days must not be negative (got {})", days);
    }

    let bills = load_bills(config, file, prefs)?;
    let upcoming = get_upcoming_bills(&bills, days);

    if json {
        return print_json(&upcoming);
    }

    if upcoming.is_empty() {
        println!("No bills due in the next {} days", days);
        return Ok(());
    }

    println!();
    println!("📅 Due in the next {} days", days);
    println!("   ─────────────────────────────────────────────────────────────");
    for bill in &upcoming {
        println!("{}", bill_row(bill));
    }

    Ok(())
}

fn print_json(bills: &[DetectedBill]) -> Result<()> {
    let rendered = serde_json::to_string_pretty(bills).context("Failed to render bills as JSON")?;
    println!("{}", rendered);
    Ok(())
}

pub(crate) fn bill_row(bill: &DetectedBill) -> String {
    let status_icon = match bill.status {
        BillStatus::Active => "✅",
        BillStatus::Pending => "⏳",
        BillStatus::Cancelled => "❌",
    };

    format!(
        "   {} {:22} │ {:>9}/{:<9} │ due {} │ {:>3.0}% │ {}{}",
        status_icon,
        truncate(&bill.name, 22),
        money(bill.amount),
        bill.frequency.as_str(),
        bill.next_due_date,
        bill.confidence * 100.0,
        bill.category,
        if bill.user_modified { " (edited)" } else { "" }
    )
}
