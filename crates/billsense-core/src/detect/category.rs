//! Category assignment and representative field selection

use crate::config::CategoryRule;
use crate::models::TransactionRecord;

pub const UNCATEGORIZED: &str = "Other";

/// Most common non-empty value, ties resolved by earliest occurrence.
///
/// `values` must be in chronological order so "earliest" is meaningful.
pub(crate) fn most_common<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    // (value, count) in first-seen order; groups are small
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, n)| count > n) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Category for a group: provider category first, then merchant rules
pub(crate) fn assign_category(members: &[&TransactionRecord], rules: &[CategoryRule]) -> String {
    if let Some(category) = most_common(members.iter().filter_map(|t| t.category.as_deref())) {
        return category.to_string();
    }

    let payee = representative_payee(members);
    rules
        .iter()
        .find(|rule| rule.matches(payee))
        .map(|rule| rule.category.clone())
        .unwrap_or_else(|| UNCATEGORIZED.to_string())
}

pub(crate) fn representative_payee<'a>(members: &[&'a TransactionRecord]) -> &'a str {
    most_common(members.iter().map(|t| t.payee())).unwrap_or("")
}

pub(crate) fn representative_bank<'a>(members: &[&'a TransactionRecord]) -> &'a str {
    most_common(members.iter().map(|t| t.bank_name.as_str())).unwrap_or("")
}
