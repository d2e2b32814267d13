//! User overrides merged onto detected bills
//!
//! Detection is recomputed on every refresh, so user choices (re-categorize,
//! mark inactive, hide) live separately, keyed by bill id, and are applied to
//! each fresh detection result.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::models::{BillStatus, DetectedBill};

/// Status a user can set on a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceStatus {
    Active,
    /// Paused or not currently paying
    Inactive,
    Cancelled,
}

/// A user-inactive bill is cancelled; `Pending` stays the detector's
/// missed-payment state.
impl From<PreferenceStatus> for BillStatus {
    fn from(status: PreferenceStatus) -> Self {
        match status {
            PreferenceStatus::Active => BillStatus::Active,
            PreferenceStatus::Inactive => BillStatus::Cancelled,
            PreferenceStatus::Cancelled => BillStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPreference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PreferenceStatus>,
    #[serde(default)]
    pub excluded: bool,
}

impl BillPreference {
    fn is_override(&self) -> bool {
        self.category.is_some() || self.status.is_some()
    }
}

/// Preferences by bill id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preferences {
    bills: BTreeMap<String, BillPreference>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `{ "<bill id>": { category, status, excluded } }`
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let prefs = Self::from_json(&fs::read_to_string(path)?)?;
        debug!(
            "Loaded {} bill preferences from {}",
            prefs.len(),
            path.display()
        );
        Ok(prefs)
    }

    pub fn set(&mut self, bill_id: impl Into<String>, preference: BillPreference) {
        self.bills.insert(bill_id.into(), preference);
    }

    pub fn get(&self, bill_id: &str) -> Option<&BillPreference> {
        self.bills.get(bill_id)
    }

    pub fn len(&self) -> usize {
        self.bills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bills.is_empty()
    }
}

/// Apply user preferences to a detection result.
///
/// Excluded bills are dropped. Overridden bills get the user's category or
/// status and are marked `user_modified`. Order is preserved.
pub fn apply_preferences(bills: Vec<DetectedBill>, preferences: &Preferences) -> Vec<DetectedBill> {
    let before = bills.len();

    let merged: Vec<DetectedBill> = bills
        .into_iter()
        .filter_map(|mut bill| {
            let Some(pref) = preferences.get(&bill.id) else {
                return Some(bill);
            };
            if pref.excluded {
                return None;
            }
            if let Some(category) = &pref.category {
                bill.category = category.clone();
            }
            if let Some(status) = pref.status {
                bill.status = status.into();
            }
            if pref.is_override() {
                bill.user_modified = true;
            }
            Some(bill)
        })
        .collect();

    debug!(
        "Applied preferences: {} bills kept, {} excluded",
        merged.len(),
        before - merged.len()
    );
    merged
}
