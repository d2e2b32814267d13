//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `bills` - Bill listing commands (detect, upcoming)
//! - `summary` - Totals, categories and overlapping services
//! - `config` - Detection config inspection
//! - `pipeline` - Shared loading pipeline (config, transactions, preferences)

pub mod bills;
pub mod config;
pub mod pipeline;
pub mod summary;

// Re-export command functions for main.rs
pub use bills::*;
pub use config::*;
pub use pipeline::*;
pub use summary::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an amount as pounds
pub fn money(amount: f64) -> String {
    format!("£{:.2}", amount)
}
