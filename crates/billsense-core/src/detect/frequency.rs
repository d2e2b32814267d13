//! Frequency classification from day gaps between payments

use crate::config::DetectionConfig;
use crate::models::BillFrequency;

use super::stats::median_i64;

/// Shortest median gap that can still be a bill; same-day repeats are not
const MIN_MEDIAN_GAP_DAYS: i64 = 2;

/// Longest median gap considered recurring at all
const MAX_MEDIAN_GAP_DAYS: i64 = 400;

/// Result of fitting a group's day gaps to a frequency bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FrequencyFit {
    pub frequency: BillFrequency,
    /// Fraction of gaps inside the bucket's window, 0.0 - 1.0
    pub window_fit: f64,
    /// A strict majority of gaps landed in the bucket's window
    pub regular: bool,
}

/// Day gaps between consecutive payments (input must be sorted by date)
pub(crate) fn day_gaps(dates: &[chrono::NaiveDate]) -> Vec<i64> {
    dates.windows(2).map(|w| (w[1] - w[0]).num_days()).collect()
}

/// Pick the frequency bucket for a set of gaps.
///
/// The bucket whose window holds a strict majority of gaps wins. Without a
/// majority the bucket is chosen from the median gap and the fit is marked
/// irregular; the caller decides whether irregular groups survive. Returns
/// `None` when the median gap is outside any plausible billing cycle.
pub(crate) fn classify(gaps: &[i64], config: &DetectionConfig) -> Option<FrequencyFit> {
    if gaps.is_empty() {
        return None;
    }

    let total = gaps.len();
    let in_window = |frequency: BillFrequency| {
        let window = config.window(frequency);
        gaps.iter().filter(|&&gap| window.contains(gap)).count()
    };

    for frequency in BillFrequency::all() {
        let count = in_window(*frequency);
        if count * 2 > total {
            return Some(FrequencyFit {
                frequency: *frequency,
                window_fit: count as f64 / total as f64,
                regular: true,
            });
        }
    }

    let median_gap = median_i64(gaps)?;
    let frequency = frequency_for_median_gap(median_gap)?;

    Some(FrequencyFit {
        frequency,
        window_fit: in_window(frequency) as f64 / total as f64,
        regular: false,
    })
}

/// Coarse bucket for drifting payment dates. Fortnightly payments have no
/// bucket of their own and count as weekly, so monthly totals overstate them
/// rather than halve them.
fn frequency_for_median_gap(median_gap: i64) -> Option<BillFrequency> {
    if median_gap < MIN_MEDIAN_GAP_DAYS {
        None
    } else if median_gap <= 14 {
        Some(BillFrequency::Weekly)
    } else if median_gap < 60 {
        Some(BillFrequency::Monthly)
    } else if median_gap < 200 {
        Some(BillFrequency::Quarterly)
    } else if median_gap <= MAX_MEDIAN_GAP_DAYS {
        Some(BillFrequency::Yearly)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DetectionConfig {
        DetectionConfig::default()
    }

    #[test]
    fn test_classify_calendar_months() {
        let fit = classify(&[31, 29, 31, 30, 31], &config()).unwrap();
        assert_eq!(fit.frequency, BillFrequency::Monthly);
        assert!(fit.regular);
        assert_eq!(fit.window_fit, 1.0);
    }

    #[test]
    fn test_classify_weekly_with_jitter() {
        let fit = classify(&[7, 6, 8, 7], &config()).unwrap();
        assert_eq!(fit.frequency, BillFrequency::Weekly);
        assert!(fit.regular);
    }

    #[test]
    fn test_classify_quarterly_and_yearly() {
        assert_eq!(
            classify(&[91, 92, 90], &config()).unwrap().frequency,
            BillFrequency::Quarterly
        );
        assert_eq!(
            classify(&[365], &config()).unwrap().frequency,
            BillFrequency::Yearly
        );
    }

    #[test]
    fn test_majority_tolerates_one_late_payment() {
        // Weekend drift pushes one gap outside the window
        let fit = classify(&[30, 34, 31, 29], &config()).unwrap();
        assert_eq!(fit.frequency, BillFrequency::Monthly);
        assert!(fit.regular);
        assert_eq!(fit.window_fit, 0.75);
    }

    #[test]
    fn test_irregular_gaps_fall_back_to_median() {
        let fit = classify(&[25, 36, 33, 26], &config()).unwrap();
        assert_eq!(fit.frequency, BillFrequency::Monthly);
        assert!(!fit.regular);
        assert_eq!(fit.window_fit, 0.0);
    }

    #[test]
    fn test_fortnightly_counts_as_weekly() {
        let fit = classify(&[14, 14, 14], &config()).unwrap();
        assert_eq!(fit.frequency, BillFrequency::Weekly);
        assert!(!fit.regular);

        assert_eq!(
            classify(&[15, 16, 15], &config()).unwrap().frequency,
            BillFrequency::Monthly
        );
    }

    #[test]
    fn test_too_long_or_too_short_is_rejected() {
        assert!(classify(&[500, 480], &config()).is_none());
        assert!(classify(&[0, 1, 0], &config()).is_none());
        assert!(classify(&[], &config()).is_none());
    }

    #[test]
    fn test_day_gaps() {
        let dates = [
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        ];
        assert_eq!(day_gaps(&dates), vec![31, 29]);
    }
}
