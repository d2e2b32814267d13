//! Shared loading pipeline for bill commands

use std::path::Path;

use anyhow::{Context, Result};
use billsense_core::{
    apply_preferences, load_transactions, BillDetector, DetectedBill, DetectionConfig, Preferences,
};
use tracing::debug;

/// Load config, read transactions, detect bills and merge preferences
pub fn load_bills(
    config_path: Option<&Path>,
    file: &Path,
    prefs: Option<&Path>,
) -> Result<Vec<DetectedBill>> {
    let config = DetectionConfig::load(config_path).context("Failed to load detection config")?;

    let transactions = load_transactions(file)
        .with_context(|| format!("Failed to read transactions from {}", file.display()))?;
    debug!(
        "Loaded {} transactions from {}",
        transactions.len(),
        file.display()
    );

    let bills = BillDetector::with_config(config).detect_bills(&transactions);

    match prefs {
        Some(path) => {
            let preferences = Preferences::load(path)
                .with_context(|| format!("Failed to read preferences from {}", path.display()))?;
            Ok(apply_preferences(bills, &preferences))
        }
        None => Ok(bills),
    }
}
