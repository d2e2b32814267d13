//! Test utilities for billsense-core
//!
//! Builders for transaction fixtures shared by the unit tests.

use chrono::{Duration, NaiveDate};

use crate::models::{TransactionRecord, TransactionType};

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// A transaction with the given merchant; sign of `amount` sets the type
pub fn spend(id: &str, date_str: &str, amount: f64, merchant: &str) -> TransactionRecord {
    TransactionRecord {
        id: id.to_string(),
        amount,
        description: merchant.to_string(),
        merchant: merchant.to_string(),
        date: date(date_str),
        category: None,
        account_id: "acc_1".to_string(),
        bank_name: "Test Bank".to_string(),
        transaction_type: TransactionType::from_amount(amount),
    }
}

/// `count` payments of `amount`, `every_days` apart starting at `start`
pub fn series(
    prefix: &str,
    merchant: &str,
    amount: f64,
    start: &str,
    every_days: i64,
    count: usize,
) -> Vec<TransactionRecord> {
    let start = date(start);
    (0..count)
        .map(|i| {
            let day = start + Duration::days(every_days * i as i64);
            spend(
                &format!("{}_{}", prefix, i),
                &day.format("%Y-%m-%d").to_string(),
                amount,
                merchant,
            )
        })
        .collect()
}

/// `count` payments on the same day of consecutive months
pub fn monthly_series(
    prefix: &str,
    merchant: &str,
    amount: f64,
    year: i32,
    first_month: u32,
    day: u32,
    count: usize,
) -> Vec<TransactionRecord> {
    (0..count)
        .map(|i| {
            let month_index = first_month - 1 + i as u32;
            let d = NaiveDate::from_ymd_opt(year + (month_index / 12) as i32, month_index % 12 + 1, day)
                .unwrap();
            spend(
                &format!("{}_{}", prefix, i),
                &d.format("%Y-%m-%d").to_string(),
                amount,
                merchant,
            )
        })
        .collect()
}
