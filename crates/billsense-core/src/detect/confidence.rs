//! Confidence scoring for recurring-payment groups
//!
//! Three sub-scores, each in [0, 1], combined with the configured weights:
//! - count: more occurrences score higher, saturating at `count_saturation`
//! - interval: share of gaps inside the frequency window, damped by gap variance
//! - amount: damped by the coefficient of variation of payment amounts
//!
//! Every sub-score is non-decreasing in its input's "goodness" and the weights
//! are non-negative, so the combined score is monotonic in occurrence count,
//! interval regularity and amount consistency.

use serde::Serialize;

use crate::config::DetectionConfig;

use super::stats::{coefficient_of_variation, round_to};

/// How hard amount variation is penalized: a 25% spread zeroes the sub-score
const AMOUNT_CV_PENALTY: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBreakdown {
    pub count: f64,
    pub interval: f64,
    pub amount: f64,
    pub total: f64,
}

pub(crate) fn count_score(occurrences: usize, saturation: usize) -> f64 {
    if occurrences < 2 {
        return 0.0;
    }
    let span = saturation.saturating_sub(1).max(1) as f64;
    ((occurrences - 1) as f64 / span).min(1.0)
}

pub(crate) fn interval_score(gaps: &[i64], window_fit: f64) -> f64 {
    let gaps: Vec<f64> = gaps.iter().map(|&g| g as f64).collect();
    let regularity = (1.0 - coefficient_of_variation(&gaps)).max(0.0);
    (window_fit.clamp(0.0, 1.0) * regularity).clamp(0.0, 1.0)
}

pub(crate) fn amount_score(amounts: &[f64]) -> f64 {
    (1.0 - AMOUNT_CV_PENALTY * coefficient_of_variation(amounts)).clamp(0.0, 1.0)
}

/// Score a group from its size, day gaps, window fit and payment magnitudes
pub(crate) fn score(
    occurrences: usize,
    gaps: &[i64],
    window_fit: f64,
    amounts: &[f64],
    config: &DetectionConfig,
) -> ConfidenceBreakdown {
    let count = count_score(occurrences, config.count_saturation);
    let interval = interval_score(gaps, window_fit);
    let amount = amount_score(amounts);

    let total = config.count_weight * count
        + config.interval_weight * interval
        + config.amount_weight * amount;

    ConfidenceBreakdown {
        count: round_to(count, 4),
        interval: round_to(interval, 4),
        amount: round_to(amount, 4),
        total: round_to(total.clamp(0.0, 1.0), 4),
    }
}
