//! Transaction ingestion
//!
//! Banking backends disagree on field names (`merchant` vs `merchantName`,
//! `date` vs `timestamp`...) and on whether amounts are numbers or strings.
//! Everything is normalized into [`TransactionRecord`] here so the detector
//! only ever sees one shape. Malformed entries are skipped with a warning;
//! only a wrong top-level shape is an error.

use std::fs;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{TransactionRecord, TransactionType};

/// A transaction as it arrives, before normalization
#[derive(Debug, Default)]
struct RawTransaction {
    id: Option<Value>,
    amount: Option<Value>,
    description: Option<String>,
    merchant: Option<String>,
    date: Option<String>,
    category: Option<String>,
    account_id: Option<String>,
    bank_name: Option<String>,
    transaction_type: Option<String>,
}

impl RawTransaction {
    /// Read a JSON object, taking the first non-empty value among each
    /// field's accepted keys. Feeds that send both `merchant` and
    /// `merchantName` (or `date` and `timestamp`) resolve to the earlier key.
    fn from_json(item: Value) -> std::result::Result<Self, String> {
        let map = match item {
            Value::Object(map) => map,
            other => return Err(format!("expected an object, got {}", json_kind(&other))),
        };

        let value = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| map.get(*k))
                .find(|v| !is_blank(v))
                .cloned()
        };
        let text = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| map.get(*k))
                .filter_map(Value::as_str)
                .map(str::trim)
                .find(|s| !s.is_empty())
                .map(str::to_string)
        };

        Ok(Self {
            id: value(&["id", "transactionId", "transaction_id"]),
            amount: value(&["amount"]),
            description: text(&["description"]),
            merchant: text(&["merchant", "merchantName", "merchant_name"]),
            date: text(&[
                "date",
                "timestamp",
                "transactionDate",
                "transaction_date",
                "bookingDate",
            ]),
            category: text(&["category"]),
            account_id: text(&["accountId", "account_id"]),
            bank_name: text(&["bankName", "bank_name", "provider"]),
            transaction_type: text(&["type"]),
        })
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Parse a JSON transaction feed.
///
/// Accepts a bare array or an object with a `transactions` array.
pub fn parse_transactions_json(content: &str) -> Result<Vec<TransactionRecord>> {
    let root: Value = serde_json::from_str(content)?;

    let items = match root {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("transactions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::InvalidData(
                    "expected a `transactions` array in the top-level object".into(),
                ))
            }
        },
        other => {
            return Err(Error::InvalidData(format!(
                "expected an array of transactions, got {}",
                json_kind(&other)
            )))
        }
    };

    let total = items.len();
    let mut transactions = Vec::with_capacity(total);

    for (index, item) in items.into_iter().enumerate() {
        let raw = match RawTransaction::from_json(item) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping transaction #{}: {}", index, e);
                continue;
            }
        };

        match normalize_raw(raw) {
            Ok(tx) => transactions.push(tx),
            Err(reason) => warn!("Skipping transaction #{}: {}", index, reason),
        }
    }

    debug!(
        "Parsed {} JSON transactions ({} skipped)",
        transactions.len(),
        total - transactions.len()
    );
    Ok(transactions)
}

/// Column positions resolved from a CSV header row
struct CsvColumns {
    date: usize,
    amount: usize,
    description: Option<usize>,
    merchant: Option<usize>,
    id: Option<usize>,
    category: Option<usize>,
    account_id: Option<usize>,
    bank_name: Option<usize>,
    transaction_type: Option<usize>,
}

impl CsvColumns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers.iter().position(|h| {
                let h = h.trim().to_lowercase();
                names.iter().any(|n| h == *n)
            })
        };

        let date = find(&["date", "transaction date", "transaction_date", "booking date"])
            .ok_or_else(|| Error::Import("Missing date column".into()))?;
        let amount =
            find(&["amount"]).ok_or_else(|| Error::Import("Missing amount column".into()))?;
        let description = find(&["description"]);
        let merchant = find(&["merchant", "merchant name", "merchant_name"]);
        if description.is_none() && merchant.is_none() {
            return Err(Error::Import(
                "Missing description or merchant column".into(),
            ));
        }

        Ok(Self {
            date,
            amount,
            description,
            merchant,
            id: find(&["id", "transaction id", "transaction_id"]),
            category: find(&["category"]),
            account_id: find(&["account_id", "account id", "account"]),
            bank_name: find(&["bank_name", "bank name", "bank", "provider"]),
            transaction_type: find(&["type"]),
        })
    }
}

/// Parse a header-driven CSV export
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<Vec<TransactionRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = CsvColumns::from_headers(&headers)?;

    let mut transactions = Vec::new();
    let mut skipped = 0usize;

    for (index, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping CSV row {}: {}", index + 1, e);
                skipped += 1;
                continue;
            }
        };

        let field = |col: Option<usize>| {
            col.and_then(|i| record.get(i))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let raw = RawTransaction {
            id: field(columns.id).map(Value::String),
            amount: field(Some(columns.amount)).map(Value::String),
            description: field(columns.description),
            merchant: field(columns.merchant),
            date: field(Some(columns.date)),
            category: field(columns.category),
            account_id: field(columns.account_id),
            bank_name: field(columns.bank_name),
            transaction_type: field(columns.transaction_type),
        };

        match normalize_raw(raw) {
            Ok(tx) => transactions.push(tx),
            Err(reason) => {
                warn!("Skipping CSV row {}: {}", index + 1, reason);
                skipped += 1;
            }
        }
    }

    debug!(
        "Parsed {} CSV transactions ({} skipped)",
        transactions.len(),
        skipped
    );
    Ok(transactions)
}

/// Load transactions from a `.json` or `.csv` file
pub fn load_transactions(path: &Path) -> Result<Vec<TransactionRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => parse_transactions_json(&fs::read_to_string(path)?),
        "csv" => parse_transactions_csv(fs::File::open(path)?),
        _ => Err(Error::Import(format!(
            "Unsupported transaction file (expected .json or .csv): {}",
            path.display()
        ))),
    }
}

/// Turn a raw entry into a record, or explain why it was rejected
fn normalize_raw(raw: RawTransaction) -> std::result::Result<TransactionRecord, String> {
    let date_str = raw
        .date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or("missing date")?;
    let date = parse_date(date_str).ok_or_else(|| format!("unparseable date {:?}", date_str))?;

    let mut amount = match raw.amount {
        Some(Value::Number(n)) => n.as_f64().ok_or("amount out of range")?,
        Some(Value::String(s)) => parse_amount(&s).ok_or_else(|| format!("unparseable amount {:?}", s))?,
        Some(other) => return Err(format!("amount is a JSON {}", json_kind(&other))),
        None => return Err("missing amount".to_string()),
    };
    if !amount.is_finite() {
        return Err("amount is not a finite number".to_string());
    }

    // Some providers send magnitudes plus a direction; the sign follows the type
    let transaction_type = match raw.transaction_type.as_deref().map(str::parse::<TransactionType>) {
        Some(Ok(declared)) => {
            if (declared == TransactionType::Debit) != (amount < 0.0) && amount != 0.0 {
                amount = -amount;
            }
            declared
        }
        _ => TransactionType::from_amount(amount),
    };

    let merchant = raw.merchant.map(|m| m.trim().to_string()).unwrap_or_default();
    let description = raw
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| merchant.clone());

    let id = match raw.id {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => generate_id(&date, &description, amount),
    };

    Ok(TransactionRecord {
        id,
        amount,
        description,
        merchant,
        date,
        category: raw
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        account_id: raw.account_id.unwrap_or_default(),
        bank_name: raw.bank_name.unwrap_or_default(),
        transaction_type,
    })
}

/// Deterministic id for entries the provider sent without one
fn generate_id(date: &NaiveDate, description: &str, amount: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}|{}", date, description, amount).as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    // European day-first, the format UK bank exports use
    NaiveDate::parse_from_str(s, "%d/%m/%Y").ok()
}

/// Parse an amount string, handling currency symbols and thousands separators
fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .replace(['£', '$', '€', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned.parse::<f64>().ok().filter(|a| a.is_finite())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
