//! Caller-owned cache for detection results
//!
//! Screens re-run detection on every refresh. The cache remembers the last
//! input fingerprint, the detector settings that produced the output, and
//! the output itself, so identical snapshots skip the work. Staleness is an
//! explicit check instead of hidden global state.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::DetectionConfig;
use crate::detect::BillDetector;
use crate::models::{DetectedBill, TransactionRecord};

#[derive(Debug, Clone, Default)]
pub struct DetectionCache {
    input_hash: Option<String>,
    config_hash: Option<String>,
    output: Vec<DetectedBill>,
    computed_at: Option<DateTime<Utc>>,
}

impl DetectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint of a transaction snapshot, independent of record order
    pub fn input_hash(transactions: &[TransactionRecord]) -> String {
        let mut sorted: Vec<&TransactionRecord> = transactions.iter().collect();
        sorted.sort_by(|a, b| {
            a.id.cmp(&b.id)
                .then_with(|| a.date.cmp(&b.date))
                .then_with(|| a.amount.total_cmp(&b.amount))
        });

        let mut hasher = Sha256::new();
        for tx in sorted {
            let date = tx.date.to_string();
            let amount = tx.amount.to_string();
            let fields = [
                tx.id.as_str(),
                date.as_str(),
                amount.as_str(),
                tx.description.as_str(),
                tx.merchant.as_str(),
                tx.category.as_deref().unwrap_or(""),
                tx.bank_name.as_str(),
                tx.transaction_type.as_str(),
            ];
            for field in fields {
                hasher.update(field.as_bytes());
                hasher.update([0x1f]);
            }
            hasher.update([0x1e]);
        }
        hex::encode(hasher.finalize())
    }

    /// Fingerprint of the detector settings. Only compared within one
    /// process; not stable across builds.
    pub fn config_hash(config: &DetectionConfig) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", config).as_bytes());
        hex::encode(hasher.finalize())
    }

    /// True when empty or older than `max_age`
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.is_stale_at(max_age, Utc::now())
    }

    pub fn is_stale_at(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        match self.computed_at {
            Some(computed_at) => now - computed_at > max_age,
            None => true,
        }
    }

    /// Cached bills for this snapshot, re-running detection when the input
    /// or detector settings changed, or the entry is stale
    pub fn get_or_detect(
        &mut self,
        detector: &BillDetector,
        transactions: &[TransactionRecord],
        max_age: Duration,
    ) -> &[DetectedBill] {
        self.get_or_detect_at(detector, transactions, max_age, Utc::now())
    }

    pub fn get_or_detect_at(
        &mut self,
        detector: &BillDetector,
        transactions: &[TransactionRecord],
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> &[DetectedBill] {
        let hash = Self::input_hash(transactions);
        let config_hash = Self::config_hash(detector.config());
        let same_input = self.input_hash.as_deref() == Some(hash.as_str());
        let same_config = self.config_hash.as_deref() == Some(config_hash.as_str());

        if same_input && same_config && !self.is_stale_at(max_age, now) {
            debug!("Detection cache hit ({} bills)", self.output.len());
            return &self.output;
        }

        let reason = if !same_input {
            "input changed"
        } else if !same_config {
            "config changed"
        } else {
            "stale"
        };
        debug!("Detection cache miss ({})", reason);
        self.output = detector.detect_bills(transactions);
        self.input_hash = Some(hash);
        self.config_hash = Some(config_hash);
        self.computed_at = Some(now);
        &self.output
    }

    pub fn invalidate(&mut self) {
        self.input_hash = None;
        self.config_hash = None;
        self.output.clear();
        self.computed_at = None;
    }

    /// Output of the last detection run, if any
    pub fn last_output(&self) -> Option<&[DetectedBill]> {
        self.computed_at.map(|_| self.output.as_slice())
    }

    pub fn computed_at(&self) -> Option<DateTime<Utc>> {
        self.computed_at
    }

    pub fn last_input_hash(&self) -> Option<&str> {
        self.input_hash.as_deref()
    }
}
