//! Billsense Core Library
//!
//! Recurring bill detection for personal finance data:
//! - Ingestion of loosely shaped JSON/CSV transaction feeds
//! - Merchant normalization and recurring-payment detection
//! - Derived statistics (monthly totals, upcoming bills, priorities)
//! - Caller-owned result cache and user preference merge
//! - TOML detection config with embedded defaults

pub mod cache;
pub mod config;
pub mod detect;
pub mod error;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod preferences;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_utils;

pub use cache::DetectionCache;
pub use config::{CategoryRule, DetectionConfig, FrequencyWindow, PatternType};
pub use detect::{detect_bills, BillDetector, UNCATEGORIZED};
pub use error::{Error, Result};
pub use ingest::{load_transactions, parse_transactions_csv, parse_transactions_json};
pub use models::{BillFrequency, BillStatus, DetectedBill, TransactionRecord, TransactionType};
pub use normalize::merchant_key;
pub use preferences::{apply_preferences, BillPreference, PreferenceStatus, Preferences};
pub use stats::{
    calculate_monthly_total, find_duplicate_services, get_bills_by_category,
    get_bills_by_priority, get_bills_by_priority_now, get_upcoming_bills, get_upcoming_bills_at,
    summarize, BillSummary, DuplicateServices,
};
