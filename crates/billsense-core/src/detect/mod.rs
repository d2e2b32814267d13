//! Recurring bill detection
//!
//! Turns a flat snapshot of bank transactions into the recurring outgoing
//! payments ("bills") it contains:
//! - spend is grouped by normalized merchant, then split into amount bands
//! - each band's day gaps are fitted to weekly / monthly / quarterly / yearly
//! - surviving groups are scored, categorized and given a next due date
//!
//! Detection is pure: the same input always yields value-equal output, with
//! no dependence on the wall clock or on previous runs.

mod category;
mod confidence;
mod frequency;
mod grouping;
pub(crate) mod stats;

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::models::{BillStatus, DetectedBill, TransactionRecord};
use crate::normalize::display_name;

pub use category::UNCATEGORIZED;
pub use confidence::ConfidenceBreakdown;

use self::category::{assign_category, representative_bank, representative_payee};
use self::frequency::{classify, day_gaps};
use self::grouping::{cluster_amounts, group_by_merchant, Candidate};
use self::stats::{median, median_i64, round_to};

/// Counters for the end-of-run summary log
#[derive(Debug, Default)]
struct RunStats {
    merchants: usize,
    too_few: usize,
    no_frequency: usize,
    irregular_dropped: usize,
    irregular_kept: usize,
}

/// Detects recurring bills in transaction snapshots
#[derive(Debug, Clone, Default)]
pub struct BillDetector {
    config: DetectionConfig,
}

impl BillDetector {
    pub fn new() -> Self {
        Self {
            config: DetectionConfig::default(),
        }
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Find the recurring bills in a transaction snapshot.
    ///
    /// Credits, non-finite amounts and payee-less records are ignored. Empty
    /// input (or input with no recurring spend) yields an empty list. Output
    /// is sorted by merchant key, then amount, then first payment date.
    pub fn detect_bills(&self, transactions: &[TransactionRecord]) -> Vec<DetectedBill> {
        let reference = latest_spend_date(transactions);
        let by_merchant = group_by_merchant(transactions);
        let mut run = RunStats {
            merchants: by_merchant.len(),
            ..Default::default()
        };

        let mut bills = Vec::new();
        for (key, members) in by_merchant {
            for candidate in cluster_amounts(&key, members, self.config.amount_tolerance) {
                if let Some(bill) = self.evaluate(&candidate, reference, &mut run) {
                    bills.push(bill);
                }
            }
        }

        bills.sort_by(|a, b| {
            a.merchant_key
                .cmp(&b.merchant_key)
                .then_with(|| a.amount.total_cmp(&b.amount))
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        });
        assign_ids(&mut bills);

        info!(
            "Detection complete: {} bills from {} transactions across {} merchants ({} groups too small, {} without a cycle, {} irregular dropped, {} irregular kept)",
            bills.len(),
            transactions.len(),
            run.merchants,
            run.too_few,
            run.no_frequency,
            run.irregular_dropped,
            run.irregular_kept
        );

        bills
    }

    /// Score a candidate group; `None` when it is not a recurring bill
    fn evaluate(
        &self,
        candidate: &Candidate<'_>,
        reference: Option<NaiveDate>,
        run: &mut RunStats,
    ) -> Option<DetectedBill> {
        let members = &candidate.members;
        let n = members.len();

        if n < self.config.min_occurrences {
            run.too_few += 1;
            return None;
        }

        let dates: Vec<NaiveDate> = members.iter().map(|t| t.date).collect();
        let gaps = day_gaps(&dates);

        let Some(fit) = classify(&gaps, &self.config) else {
            run.no_frequency += 1;
            debug!(
                "Skipping {} - gaps {:?} fit no billing cycle",
                candidate.merchant_key, gaps
            );
            return None;
        };

        if !fit.regular {
            if n < self.config.irregular_min_occurrences {
                run.irregular_dropped += 1;
                debug!(
                    "Skipping {} - {} irregular payments (need {})",
                    candidate.merchant_key, n, self.config.irregular_min_occurrences
                );
                return None;
            }
            run.irregular_kept += 1;
        }

        let interval_days = median_i64(&gaps)?.max(0);
        let amounts: Vec<f64> = members.iter().map(|t| t.amount.abs()).collect();
        let amount = round_to(median(&amounts), 2);
        let score = confidence::score(n, &gaps, fit.window_fit, &amounts, &self.config);

        let first_seen = *dates.first()?;
        let last_seen = *dates.last()?;
        let next_due_date = last_seen + Duration::days(interval_days);

        let status = match reference {
            Some(reference) if self.config.infer_lapsed_status => infer_status(
                next_due_date,
                interval_days,
                self.config.window(fit.frequency).grace_days,
                reference,
            ),
            _ => BillStatus::Active,
        };

        debug!(
            "Detected {} {} bill for {}: {:.2} x{} (confidence {:.2} = count {:.2}, interval {:.2}, amount {:.2}; {})",
            if fit.regular { "regular" } else { "irregular" },
            fit.frequency,
            candidate.merchant_key,
            amount,
            n,
            score.total,
            score.count,
            score.interval,
            score.amount,
            status
        );

        Some(DetectedBill {
            id: String::new(),
            name: display_name(&candidate.merchant_key),
            merchant: representative_payee(members).to_string(),
            merchant_key: candidate.merchant_key.clone(),
            amount,
            frequency: fit.frequency,
            interval_days,
            first_seen,
            last_seen,
            next_due_date,
            confidence: score.total,
            category: assign_category(members, &self.config.category_rules),
            bank_name: representative_bank(members).to_string(),
            status,
            transactions: members.iter().map(|t| (*t).clone()).collect(),
            user_modified: false,
        })
    }
}

/// Detect bills with the default configuration
pub fn detect_bills(transactions: &[TransactionRecord]) -> Vec<DetectedBill> {
    BillDetector::new().detect_bills(transactions)
}

/// Latest date among usable spend transactions; the "now" of a snapshot
fn latest_spend_date(transactions: &[TransactionRecord]) -> Option<NaiveDate> {
    transactions
        .iter()
        .filter(|t| t.amount.is_finite() && t.is_spend())
        .map(|t| t.date)
        .max()
}

/// Active until the grace period after the due date passes, pending while
/// one payment is missing, cancelled after that
fn infer_status(
    next_due: NaiveDate,
    interval_days: i64,
    grace_days: i64,
    reference: NaiveDate,
) -> BillStatus {
    let grace_end = next_due + Duration::days(grace_days);
    if reference <= grace_end {
        BillStatus::Active
    } else if reference <= grace_end + Duration::days(interval_days) {
        BillStatus::Pending
    } else {
        BillStatus::Cancelled
    }
}

/// Stable id for a merchant and rounded amount
pub(crate) fn bill_id(merchant_key: &str, amount: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}", merchant_key, amount.round() as i64).as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("bill_{}", &digest[..12])
}

/// Assign ids in output order; repeats get a `_2`, `_3`... suffix
fn assign_ids(bills: &mut [DetectedBill]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for bill in bills.iter_mut() {
        let base = bill_id(&bill.merchant_key, bill.amount);
        let count = seen.entry(base.clone()).or_insert(0);
        *count += 1;
        bill.id = if *count == 1 {
            base
        } else {
            format!("{}_{}", base, count)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillFrequency;
    use crate::test_utils::{date, monthly_series, series, spend};

    #[test]
    fn test_netflix_six_months() {
        let txs = monthly_series("nf", "NETFLIX.COM", -9.99, 2024, 1, 1, 6);
        let bills = detect_bills(&txs);

        assert_eq!(bills.len(), 1);
        let bill = &bills[0];
        assert_eq!(bill.frequency, BillFrequency::Monthly);
        assert_eq!(bill.amount, 9.99);
        assert_eq!(bill.merchant_key, "netflix");
        assert_eq!(bill.name, "Netflix");
        assert_eq!(bill.merchant, "NETFLIX.COM");
        assert_eq!(bill.category, "Subscriptions");
        assert_eq!(bill.status, BillStatus::Active);
        assert_eq!(bill.occurrences(), 6);
        assert_eq!(bill.first_seen, date("2024-01-01"));
        assert_eq!(bill.last_seen, date("2024-06-01"));
        assert!(bill.confidence > 0.9, "confidence {}", bill.confidence);
        assert!(!bill.user_modified);
        assert!(bill.id.starts_with("bill_"));
    }

    #[test]
    fn test_tesco_different_amounts_not_grouped() {
        let txs = vec![
            spend("1", "2024-01-12", -42.17, "TESCO STORES 4521"),
            spend("2", "2024-02-12", -18.30, "TESCO STORES 1187"),
        ];
        assert!(detect_bills(&txs).is_empty());
    }

    #[test]
    fn test_single_transaction_yields_nothing() {
        let txs = vec![spend("1", "2024-01-01", -15.99, "SPOTIFY")];
        assert!(detect_bills(&txs).is_empty());
        assert!(detect_bills(&[]).is_empty());
    }

    #[test]
    fn test_british_gas_outlier_excluded() {
        let txs = vec![
            spend("1", "2024-01-03", -55.0, "BRITISH GAS"),
            spend("2", "2024-02-03", -60.0, "BRITISH GAS"),
            spend("3", "2024-03-04", -58.0, "BRITISH GAS"),
            spend("4", "2024-04-03", -230.0, "BRITISH GAS"),
        ];
        let bills = detect_bills(&txs);

        assert_eq!(bills.len(), 1);
        let bill = &bills[0];
        assert_eq!(bill.occurrences(), 3);
        assert_eq!(bill.amount, 58.0);
        assert_eq!(bill.frequency, BillFrequency::Monthly);
        assert_eq!(bill.category, "Utilities");
        assert!(bill.transactions.iter().all(|t| t.amount != -230.0));
    }

    #[test]
    fn test_credits_are_not_bills() {
        let txs = monthly_series("sal", "ACME PAYROLL", 2500.0, 2024, 1, 28, 6);
        assert!(detect_bills(&txs).is_empty());
    }

    #[test]
    fn test_weekly_and_yearly() {
        let mut txs = series("gym", "PUREGYM", -8.0, "2024-01-05", 7, 8);
        txs.extend(vec![
            spend("p1", "2022-03-10", -95.0, "AMAZON PRIME"),
            spend("p2", "2023-03-10", -95.0, "AMAZON PRIME"),
            spend("p3", "2024-03-09", -95.0, "AMAZON PRIME"),
        ]);
        let bills = BillDetector::with_config(DetectionConfig {
            infer_lapsed_status: false,
            ..DetectionConfig::default()
        })
        .detect_bills(&txs);

        assert_eq!(bills.len(), 2);
        assert_eq!(bills[0].merchant_key, "amazon prime");
        assert_eq!(bills[0].frequency, BillFrequency::Yearly);
        assert_eq!(bills[1].merchant_key, "puregym");
        assert_eq!(bills[1].frequency, BillFrequency::Weekly);
        assert_eq!(bills[1].next_due_date, date("2024-03-01"));
    }

    #[test]
    fn test_irregular_pair_dropped_but_irregular_run_kept() {
        let pair = vec![
            spend("1", "2024-01-01", -20.0, "WINDOW CLEANER"),
            spend("2", "2024-02-15", -20.0, "WINDOW CLEANER"),
        ];
        assert!(detect_bills(&pair).is_empty());

        let run = vec![
            spend("1", "2024-01-01", -20.0, "WINDOW CLEANER"),
            spend("2", "2024-01-26", -20.0, "WINDOW CLEANER"),
            spend("3", "2024-03-02", -20.0, "WINDOW CLEANER"),
            spend("4", "2024-04-04", -20.0, "WINDOW CLEANER"),
            spend("5", "2024-04-30", -20.0, "WINDOW CLEANER"),
        ];
        let bills = detect_bills(&run);
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].frequency, BillFrequency::Monthly);

        let regular = detect_bills(&monthly_series("w", "WINDOW CLEANER", -20.0, 2024, 1, 1, 5));
        assert!(bills[0].confidence < regular[0].confidence);
    }

    #[test]
    fn test_status_lapses_against_latest_snapshot_date() {
        let mut txs = monthly_series("sp", "SPOTIFY", -10.99, 2024, 1, 15, 3);
        // Unrelated spend moves the snapshot forward
        txs.push(spend("x1", "2024-04-25", -3.50, "CORNER SHOP"));
        let pending = detect_bills(&txs);
        assert_eq!(pending[0].status, BillStatus::Pending);

        txs.push(spend("x2", "2024-07-01", -3.50, "CORNER SHOP"));
        let cancelled = detect_bills(&txs);
        assert_eq!(cancelled[0].status, BillStatus::Cancelled);

        let detector = BillDetector::with_config(DetectionConfig {
            infer_lapsed_status: false,
            ..DetectionConfig::default()
        });
        assert_eq!(detector.detect_bills(&txs)[0].status, BillStatus::Active);
    }

    #[test]
    fn test_infer_status_boundaries() {
        let due = date("2024-05-01");
        assert_eq!(infer_status(due, 30, 7, date("2024-05-08")), BillStatus::Active);
        assert_eq!(infer_status(due, 30, 7, date("2024-05-09")), BillStatus::Pending);
        assert_eq!(infer_status(due, 30, 7, date("2024-06-07")), BillStatus::Pending);
        assert_eq!(infer_status(due, 30, 7, date("2024-06-08")), BillStatus::Cancelled);
    }

    #[test]
    fn test_detection_is_pure() {
        let mut txs = monthly_series("nf", "NETFLIX.COM", -9.99, 2024, 1, 1, 6);
        txs.extend(monthly_series("sp", "SPOTIFY", -10.99, 2024, 1, 15, 4));
        txs.push(spend("t", "2024-02-02", -42.17, "TESCO STORES 4521"));

        let first = detect_bills(&txs);
        txs.reverse();
        let second = detect_bills(&txs);
        assert_eq!(first, second);
    }

    #[test]
    fn test_next_due_follows_last_payment() {
        let txs = monthly_series("nf", "NETFLIX.COM", -9.99, 2024, 1, 1, 6);
        let bill = &detect_bills(&txs)[0];
        assert!(bill.next_due_date >= bill.last_seen);
        // Median gap of 31, 29, 31, 30, 31
        assert_eq!(bill.interval_days, 31);
        assert_eq!(bill.next_due_date, date("2024-07-02"));
    }

    #[test]
    fn test_bill_id_is_stable_and_amount_sensitive() {
        assert_eq!(bill_id("netflix", 9.99), bill_id("netflix", 10.2));
        assert_ne!(bill_id("netflix", 9.99), bill_id("netflix", 15.99));
        assert_ne!(bill_id("netflix", 9.99), bill_id("spotify", 9.99));
        assert_eq!(bill_id("netflix", 9.99).len(), "bill_".len() + 12);
    }

    #[test]
    fn test_colliding_ids_get_suffix() {
        let mut txs = monthly_series("a", "GYM BOX", -9.5, 2024, 1, 1, 4);
        // 10.4 rounds like 9.5 but is outside a 1% band
        txs.extend(monthly_series("b", "GYM BOX", -10.4, 2024, 1, 10, 4));
        let detector = BillDetector::with_config(DetectionConfig {
            amount_tolerance: 0.01,
            ..DetectionConfig::default()
        });
        let bills = detector.detect_bills(&txs);

        assert_eq!(bills.len(), 2);
        assert_eq!(bills[1].id, format!("{}_2", bills[0].id));
    }
}
