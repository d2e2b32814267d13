//! Summary command

use std::path::Path;

use anyhow::Result;
use billsense_core::{
    calculate_monthly_total, find_duplicate_services, get_bills_by_category, summarize,
};
use chrono::Utc;

use super::{load_bills, money, truncate};

pub fn cmd_summary(config: Option<&Path>, file: &Path, prefs: Option<&Path>) -> Result<()> {
    let bills = load_bills(config, file, prefs)?;
    let summary = summarize(&bills, Utc::now().date_naive());

    println!();
    println!("📊 Bill Summary");
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Bills: {} ({} active, {} pending, {} cancelled)",
        summary.total_bills, summary.active, summary.pending, summary.cancelled
    );
    println!("   Monthly: {}", money(summary.monthly_total));
    println!("   Yearly:  {}", money(summary.yearly_total));
    println!("   Due this week: {}", summary.upcoming);

    if bills.is_empty() {
        return Ok(());
    }

    println!();
    println!("   By category");
    for (category, group) in get_bills_by_category(&bills) {
        let names: Vec<String> = group.iter().map(|b| truncate(&b.name, 16)).collect();
        println!(
            "   {:14} {:>10}/mo │ {}",
            truncate(&category, 14),
            money(calculate_monthly_total(&group)),
            names.join(", ")
        );
    }

    let duplicates = find_duplicate_services(&bills);
    if !duplicates.is_empty() {
        println!();
        println!("   ⚠️  Overlapping services");
        for dup in duplicates {
            println!(
                "   {} ({}): {} combined",
                dup.category,
                dup.names.join(", "),
                money(dup.monthly_total)
            );
        }
    }

    Ok(())
}
