//! Domain models for Billsense

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A transaction as supplied by the banking aggregation backend,
/// after ingestion has normalized it into a single shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    /// Negative = outgoing spend, positive = incoming credit
    pub amount: f64,
    pub description: String,
    /// Payee as reported by the provider (may be empty)
    #[serde(default)]
    pub merchant: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub bank_name: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
}

impl TransactionRecord {
    /// Merchant name, falling back to the description when the provider
    /// left it blank.
    pub fn payee(&self) -> &str {
        if self.merchant.trim().is_empty() {
            &self.description
        } else {
            &self.merchant
        }
    }

    pub fn is_spend(&self) -> bool {
        self.amount < 0.0
    }
}

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
    Credit,
}

impl TransactionType {
    pub fn from_amount(amount: f64) -> Self {
        if amount < 0.0 {
            Self::Debit
        } else {
            Self::Credit
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" | "dr" => Ok(Self::Debit),
            "credit" | "cr" => Ok(Self::Credit),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bill payment frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillFrequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl BillFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        }
    }

    /// Get all frequencies, shortest first
    pub fn all() -> &'static [BillFrequency] {
        &[Self::Weekly, Self::Monthly, Self::Quarterly, Self::Yearly]
    }

    /// Multiplier that converts one payment into a monthly equivalent
    pub fn monthly_factor(&self) -> f64 {
        match self {
            Self::Weekly => 4.33,
            Self::Monthly => 1.0,
            Self::Quarterly => 1.0 / 3.0,
            Self::Yearly => 1.0 / 12.0,
        }
    }

    /// Typical number of days between payments
    pub fn nominal_days(&self) -> i64 {
        match self {
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::Quarterly => 91,
            Self::Yearly => 365,
        }
    }
}

impl std::str::FromStr for BillFrequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "yearly" | "annual" | "annually" => Ok(Self::Yearly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for BillFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bill status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Active,
    /// A payment is overdue but the bill has not lapsed yet
    Pending,
    Cancelled,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for BillStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "pending" => Ok(Self::Pending),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown bill status: {}", s)),
        }
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recurring outgoing payment pattern found in a transaction snapshot.
///
/// Recomputed on every detection run; never persisted by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedBill {
    /// Stable across runs for the same merchant and rounded amount
    pub id: String,
    pub name: String,
    pub merchant: String,
    pub merchant_key: String,
    /// Representative (median) payment magnitude
    pub amount: f64,
    pub frequency: BillFrequency,
    /// Median number of days between payments
    pub interval_days: i64,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    pub next_due_date: NaiveDate,
    /// Strength of the recurring pattern, 0.0 - 1.0
    pub confidence: f64,
    pub category: String,
    pub bank_name: String,
    pub status: BillStatus,
    pub transactions: Vec<TransactionRecord>,
    /// Set by the preference merge, never by the detector
    pub user_modified: bool,
}

impl DetectedBill {
    /// Payment amount expressed per month
    pub fn monthly_amount(&self) -> f64 {
        self.amount * self.frequency.monthly_factor()
    }

    pub fn occurrences(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_active(&self) -> bool {
        self.status == BillStatus::Active
    }
}
