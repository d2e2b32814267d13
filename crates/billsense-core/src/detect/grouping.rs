//! Grouping spend transactions into recurring-payment candidates

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::models::TransactionRecord;
use crate::normalize::merchant_key;

/// Spend transactions that share a merchant key and an amount band
#[derive(Debug, Clone)]
pub(crate) struct Candidate<'a> {
    pub merchant_key: String,
    /// Sorted by date, then id
    pub members: Vec<&'a TransactionRecord>,
}

/// Group spend transactions by normalized merchant key.
///
/// Credits are excluded. Records with a non-finite amount or no usable payee
/// are skipped with a warning rather than failing the run.
pub(crate) fn group_by_merchant(
    transactions: &[TransactionRecord],
) -> BTreeMap<String, Vec<&TransactionRecord>> {
    let mut by_merchant: BTreeMap<String, Vec<&TransactionRecord>> = BTreeMap::new();
    let mut credits = 0usize;

    for tx in transactions {
        if !tx.amount.is_finite() {
            warn!("Skipping transaction {} - amount is not a number", tx.id);
            continue;
        }

        if !tx.is_spend() {
            credits += 1;
            continue;
        }

        let key = merchant_key(tx.payee());
        if key.is_empty() {
            warn!("Skipping transaction {} - no merchant or description", tx.id);
            continue;
        }

        by_merchant.entry(key).or_default().push(tx);
    }

    debug!(
        "Grouped spend into {} merchants ({} credits excluded)",
        by_merchant.len(),
        credits
    );
    by_merchant
}

/// Split one merchant's transactions into amount bands.
///
/// Amounts are visited in ascending order of magnitude. A transaction joins the
/// current band while every member stays within `±tolerance` of the band
/// midpoint, otherwise it opens a new band. Outliers such as a one-off top-up
/// end up in a band of their own.
pub(crate) fn cluster_amounts<'a>(
    merchant_key: &str,
    mut members: Vec<&'a TransactionRecord>,
    tolerance: f64,
) -> Vec<Candidate<'a>> {
    members.sort_by(|a, b| {
        a.amount
            .abs()
            .total_cmp(&b.amount.abs())
            .then_with(|| a.date.cmp(&b.date))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut bands: Vec<Vec<&TransactionRecord>> = Vec::new();
    let mut band_min = 0.0;

    for tx in members {
        let magnitude = tx.amount.abs();
        match bands.last_mut() {
            Some(band) if within_band(band_min, magnitude, tolerance) => band.push(tx),
            _ => {
                band_min = magnitude;
                bands.push(vec![tx]);
            }
        }
    }

    bands
        .into_iter()
        .map(|mut band| {
            band.sort_by(|a, b| compare_chronological(a, b));
            Candidate {
                merchant_key: merchant_key.to_string(),
                members: band,
            }
        })
        .collect()
}

/// Both ends of `[low, high]` sit within `±tolerance` of its midpoint
fn within_band(low: f64, high: f64, tolerance: f64) -> bool {
    high - low <= tolerance * (high + low)
}

pub(crate) fn compare_chronological(a: &TransactionRecord, b: &TransactionRecord) -> Ordering {
    a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id))
}
