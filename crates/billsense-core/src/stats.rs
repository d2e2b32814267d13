//! Derived statistics over detected bills
//!
//! Pure functions used by presentation layers. Functions that depend on the
//! current date come in two forms: one taking `today` explicitly and a
//! convenience wrapper that reads the clock.

use std::cmp::Ordering;

use chrono::{Duration, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::detect::stats::round_to;
use crate::detect::UNCATEGORIZED;
use crate::models::{BillStatus, DetectedBill};

/// Bills due within this many days are surfaced first by priority ordering
pub const DUE_SOON_DAYS: i64 = 7;

/// Sum of active bills, each normalized to a monthly amount
pub fn calculate_monthly_total(bills: &[DetectedBill]) -> f64 {
    let total: f64 = bills
        .iter()
        .filter(|b| b.is_active())
        .map(DetectedBill::monthly_amount)
        .sum();
    round_to(total, 2)
}

/// Bills due between today and `within_days` from now, soonest first
pub fn get_upcoming_bills(bills: &[DetectedBill], within_days: i64) -> Vec<DetectedBill> {
    get_upcoming_bills_at(bills, within_days, Utc::now().date_naive())
}

/// Bills with `today <= next_due_date <= today + within_days`, soonest first
pub fn get_upcoming_bills_at(
    bills: &[DetectedBill],
    within_days: i64,
    today: NaiveDate,
) -> Vec<DetectedBill> {
    if within_days < 0 {
        return Vec::new();
    }
    // A window past the calendar's end means every future due date counts
    let horizon = Duration::try_days(within_days)
        .and_then(|window| today.checked_add_signed(window))
        .unwrap_or(NaiveDate::MAX);

    let mut upcoming: Vec<DetectedBill> = bills
        .iter()
        .filter(|b| b.next_due_date >= today && b.next_due_date <= horizon)
        .cloned()
        .collect();
    upcoming.sort_by_key(|b| b.next_due_date);
    upcoming
}

/// Bills grouped by category, keys in first-seen order
pub fn get_bills_by_category(bills: &[DetectedBill]) -> IndexMap<String, Vec<DetectedBill>> {
    let mut by_category: IndexMap<String, Vec<DetectedBill>> = IndexMap::new();
    for bill in bills {
        by_category
            .entry(bill.category.clone())
            .or_default()
            .push(bill.clone());
    }
    by_category
}

/// Priority tier; lower sorts first
fn priority_tier(bill: &DetectedBill, today: NaiveDate) -> u8 {
    match bill.status {
        BillStatus::Active if (bill.next_due_date - today).num_days() <= DUE_SOON_DAYS => 0,
        BillStatus::Active => 1,
        BillStatus::Pending => 2,
        BillStatus::Cancelled => 3,
    }
}

/// Order bills for attention.
///
/// Active bills due within a week (or overdue) come first, soonest first.
/// Everything else follows by tier (active, pending, cancelled), then higher
/// confidence, then higher amount. The sort is stable: bills with equal keys
/// keep their input order.
pub fn get_bills_by_priority(bills: &[DetectedBill], today: NaiveDate) -> Vec<DetectedBill> {
    let mut ordered = bills.to_vec();
    ordered.sort_by(|a, b| {
        let tier_a = priority_tier(a, today);
        let tier_b = priority_tier(b, today);

        tier_a
            .cmp(&tier_b)
            .then_with(|| {
                if tier_a == 0 {
                    a.next_due_date.cmp(&b.next_due_date)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| b.confidence.total_cmp(&a.confidence))
            .then_with(|| b.amount.total_cmp(&a.amount))
    });
    ordered
}

/// [`get_bills_by_priority`] against today's date
pub fn get_bills_by_priority_now(bills: &[DetectedBill]) -> Vec<DetectedBill> {
    get_bills_by_priority(bills, Utc::now().date_naive())
}

/// Several active bills in one category, e.g. two video streaming services
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateServices {
    pub category: String,
    pub names: Vec<String>,
    pub bill_ids: Vec<String>,
    /// Combined monthly cost of the overlapping bills
    pub monthly_total: f64,
}

/// Categories holding two or more active bills. Uncategorized bills are
/// never reported.
pub fn find_duplicate_services(bills: &[DetectedBill]) -> Vec<DuplicateServices> {
    let active: Vec<DetectedBill> = bills
        .iter()
        .filter(|b| b.is_active() && b.category != UNCATEGORIZED)
        .cloned()
        .collect();

    get_bills_by_category(&active)
        .into_iter()
        .filter(|(_, group)| group.len() >= 2)
        .map(|(category, group)| DuplicateServices {
            monthly_total: calculate_monthly_total(&group),
            names: group.iter().map(|b| b.name.clone()).collect(),
            bill_ids: group.iter().map(|b| b.id.clone()).collect(),
            category,
        })
        .collect()
}

/// Headline numbers for a set of bills
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
    pub total_bills: usize,
    pub active: usize,
    pub pending: usize,
    pub cancelled: usize,
    pub monthly_total: f64,
    pub yearly_total: f64,
    /// Bills due within the next week
    pub upcoming: usize,
}

pub fn summarize(bills: &[DetectedBill], today: NaiveDate) -> BillSummary {
    let count = |status: BillStatus| bills.iter().filter(|b| b.status == status).count();
    let monthly_total = calculate_monthly_total(bills);

    BillSummary {
        total_bills: bills.len(),
        active: count(BillStatus::Active),
        pending: count(BillStatus::Pending),
        cancelled: count(BillStatus::Cancelled),
        monthly_total,
        yearly_total: round_to(monthly_total * 12.0, 2),
        upcoming: get_upcoming_bills_at(bills, DUE_SOON_DAYS, today).len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillFrequency;
    use crate::test_utils::date;

    fn bill(id: &str, category: &str, amount: f64, frequency: BillFrequency, due: &str) -> DetectedBill {
        DetectedBill {
            id: id.to_string(),
            name: id.to_string(),
            merchant: id.to_uppercase(),
            merchant_key: id.to_string(),
            amount,
            frequency,
            interval_days: frequency.nominal_days(),
            first_seen: date("2024-01-01"),
            last_seen: date("2024-01-01"),
            next_due_date: date(due),
            confidence: 0.8,
            category: category.to_string(),
            bank_name: "Test Bank".to_string(),
            status: BillStatus::Active,
            transactions: Vec::new(),
            user_modified: false,
        }
    }

    fn ids(bills: &[DetectedBill]) -> Vec<&str> {
        bills.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_monthly_total_weekly_and_yearly() {
        let bills = vec![
            bill("gym", "Fitness", 10.0, BillFrequency::Weekly, "2024-06-01"),
            bill("prime", "Subscriptions", 120.0, BillFrequency::Yearly, "2024-06-01"),
        ];
        assert!((calculate_monthly_total(&bills) - 53.30).abs() < 1e-9);
    }

    #[test]
    fn test_monthly_total_ignores_inactive() {
        let mut cancelled = bill("old", "Subscriptions", 15.0, BillFrequency::Monthly, "2024-06-01");
        cancelled.status = BillStatus::Cancelled;
        let bills = vec![
            bill("nf", "Subscriptions", 9.99, BillFrequency::Monthly, "2024-06-01"),
            bill("water", "Utilities", 90.0, BillFrequency::Quarterly, "2024-06-01"),
            cancelled,
        ];
        assert_eq!(calculate_monthly_total(&bills), 39.99);
        assert_eq!(calculate_monthly_total(&[]), 0.0);
    }

    #[test]
    fn test_upcoming_within_window() {
        let today = date("2024-06-01");
        let bills = vec![
            bill("thirty", "Other", 1.0, BillFrequency::Monthly, "2024-07-01"),
            bill("two", "Other", 1.0, BillFrequency::Monthly, "2024-06-03"),
            bill("ten", "Other", 1.0, BillFrequency::Monthly, "2024-06-11"),
        ];
        assert_eq!(ids(&get_upcoming_bills_at(&bills, 7, today)), vec!["two"]);
        assert_eq!(
            ids(&get_upcoming_bills_at(&bills, 30, today)),
            vec!["two", "ten", "thirty"]
        );
    }

    #[test]
    fn test_upcoming_edges() {
        let today = date("2024-06-01");
        let bills = vec![
            bill("past", "Other", 1.0, BillFrequency::Monthly, "2024-05-31"),
            bill("today", "Other", 1.0, BillFrequency::Monthly, "2024-06-01"),
            bill("edge", "Other", 1.0, BillFrequency::Monthly, "2024-06-08"),
        ];
        assert_eq!(
            ids(&get_upcoming_bills_at(&bills, 7, today)),
            vec!["today", "edge"]
        );
        assert!(get_upcoming_bills_at(&bills, -1, today).is_empty());
    }

    #[test]
    fn test_upcoming_with_window_past_calendar_end() {
        let today = date("2024-01-01");
        let bills = vec![
            bill("past", "Other", 1.0, BillFrequency::Monthly, "2023-12-01"),
            bill("soon", "Other", 1.0, BillFrequency::Monthly, "2024-01-05"),
            bill("later", "Other", 1.0, BillFrequency::Yearly, "2030-01-01"),
        ];
        assert!(get_upcoming_bills_at(&[], 1_000_000_000, today).is_empty());
        assert_eq!(
            ids(&get_upcoming_bills_at(&bills, 1_000_000_000, today)),
            vec!["soon", "later"]
        );
        assert_eq!(
            ids(&get_upcoming_bills_at(&bills, i64::MAX, today)),
            vec!["soon", "later"]
        );
    }

    #[test]
    fn test_by_category_preserves_order() {
        let bills = vec![
            bill("nf", "Subscriptions", 9.99, BillFrequency::Monthly, "2024-06-01"),
            bill("gas", "Utilities", 60.0, BillFrequency::Monthly, "2024-06-03"),
            bill("sp", "Subscriptions", 10.99, BillFrequency::Monthly, "2024-06-02"),
        ];
        let grouped = get_bills_by_category(&bills);
        let keys: Vec<&String> = grouped.keys().collect();
        assert_eq!(keys, vec!["Subscriptions", "Utilities"]);
        assert_eq!(ids(&grouped["Subscriptions"]), vec!["nf", "sp"]);
    }

    #[test]
    fn test_priority_order() {
        let today = date("2024-06-01");
        let mut pending = bill("pending", "Other", 500.0, BillFrequency::Monthly, "2024-06-02");
        pending.status = BillStatus::Pending;
        let mut confident = bill("confident", "Other", 5.0, BillFrequency::Monthly, "2024-07-01");
        confident.confidence = 0.95;

        let bills = vec![
            pending,
            bill("later", "Other", 50.0, BillFrequency::Monthly, "2024-06-20"),
            confident,
            bill("soon", "Other", 5.0, BillFrequency::Monthly, "2024-06-05"),
            bill("sooner", "Other", 5.0, BillFrequency::Monthly, "2024-06-02"),
        ];
        assert_eq!(
            ids(&get_bills_by_priority(&bills, today)),
            vec!["sooner", "soon", "confident", "later", "pending"]
        );
    }

    #[test]
    fn test_priority_is_stable_for_equal_keys() {
        let today = date("2024-06-01");
        let bills = vec![
            bill("b", "Other", 20.0, BillFrequency::Monthly, "2024-07-10"),
            bill("a", "Other", 20.0, BillFrequency::Monthly, "2024-07-20"),
            bill("c", "Other", 20.0, BillFrequency::Monthly, "2024-07-01"),
        ];
        assert_eq!(ids(&get_bills_by_priority(&bills, today)), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_duplicate_services() {
        let mut lapsed = bill("hulu", "Subscriptions", 7.99, BillFrequency::Monthly, "2024-06-01");
        lapsed.status = BillStatus::Cancelled;
        let bills = vec![
            bill("nf", "Subscriptions", 9.99, BillFrequency::Monthly, "2024-06-01"),
            bill("gas", "Utilities", 60.0, BillFrequency::Monthly, "2024-06-03"),
            bill("sp", "Subscriptions", 10.99, BillFrequency::Monthly, "2024-06-02"),
            bill("x", "Other", 1.0, BillFrequency::Monthly, "2024-06-02"),
            bill("y", "Other", 2.0, BillFrequency::Monthly, "2024-06-02"),
            lapsed,
        ];
        let dups = find_duplicate_services(&bills);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].category, "Subscriptions");
        assert_eq!(dups[0].bill_ids, vec!["nf", "sp"]);
        assert_eq!(dups[0].monthly_total, 20.98);
    }

    #[test]
    fn test_summarize() {
        let today = date("2024-06-01");
        let mut pending = bill("p", "Other", 30.0, BillFrequency::Monthly, "2024-05-20");
        pending.status = BillStatus::Pending;
        let bills = vec![
            bill("nf", "Subscriptions", 10.0, BillFrequency::Monthly, "2024-06-03"),
            bill("gas", "Utilities", 50.0, BillFrequency::Monthly, "2024-06-20"),
            pending,
        ];
        let summary = summarize(&bills, today);
        assert_eq!(summary.total_bills, 3);
        assert_eq!(summary.active, 2);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.cancelled, 0);
        assert_eq!(summary.monthly_total, 60.0);
        assert_eq!(summary.yearly_total, 720.0);
        assert_eq!(summary.upcoming, 1);
    }
}
