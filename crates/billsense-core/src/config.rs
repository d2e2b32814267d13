//! Detection configuration
//!
//! Thresholds, frequency windows and category rules for the bill detector.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a layered resolution:
//! 1. Embedded defaults (compiled into binary) are parsed first
//! 2. An explicit override path, if given and present, is applied on top
//! 3. Otherwise the override in the config dir (~/.config/billsense/detection.toml)
//!
//! Keys missing from an override keep the embedded value.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::BillFrequency;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/detection.toml");

/// Inclusive day-gap window for a frequency bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyWindow {
    pub min_days: i64,
    pub max_days: i64,
    /// Days past the due date before a missing payment counts as missed
    pub grace_days: i64,
}

impl FrequencyWindow {
    pub const fn new(min_days: i64, max_days: i64, grace_days: i64) -> Self {
        Self {
            min_days,
            max_days,
            grace_days,
        }
    }

    pub fn contains(&self, gap_days: i64) -> bool {
        gap_days >= self.min_days && gap_days <= self.max_days
    }
}

/// How a category rule pattern is matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Case-insensitive substring, `|` separates alternatives
    #[default]
    Contains,
    Regex,
    Exact,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Regex => "regex",
            Self::Exact => "exact",
        }
    }
}

impl std::str::FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" => Ok(Self::Contains),
            "regex" => Ok(Self::Regex),
            "exact" => Ok(Self::Exact),
            _ => Err(format!("Unknown pattern type: {}", s)),
        }
    }
}

/// Maps merchant names to a category when the provider gave none
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: String,
    pub pattern: String,
    pub pattern_type: PatternType,
    regex: Option<Regex>,
}

impl CategoryRule {
    pub fn new(category: &str, pattern: &str, pattern_type: PatternType) -> Result<Self> {
        let regex = match pattern_type {
            PatternType::Regex => Some(Regex::new(pattern)?),
            PatternType::Contains | PatternType::Exact => None,
        };

        Ok(Self {
            category: category.to_string(),
            pattern: pattern.to_string(),
            pattern_type,
            regex,
        })
    }

    /// Check if a merchant name matches this rule
    pub fn matches(&self, merchant: &str) -> bool {
        let merchant_upper = merchant.to_uppercase();

        match self.pattern_type {
            PatternType::Contains => self
                .pattern
                .split('|')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .any(|p| merchant_upper.contains(&p.to_uppercase())),
            PatternType::Regex => self
                .regex
                .as_ref()
                .is_some_and(|re| re.is_match(merchant) || re.is_match(&merchant_upper)),
            PatternType::Exact => merchant_upper.trim() == self.pattern.to_uppercase(),
        }
    }
}

/// Detection configuration
#[derive(Debug, Clone)]
pub struct DetectionConfig {
    /// Members of a group stay within +/- this fraction of the group midpoint
    pub amount_tolerance: f64,
    /// Minimum payments for a group to count as recurring (at least 2)
    pub min_occurrences: usize,
    /// Groups whose gaps fit no frequency window need this many payments
    pub irregular_min_occurrences: usize,

    // Confidence weights (normalized to sum to 1.0)
    pub count_weight: f64,
    pub interval_weight: f64,
    pub amount_weight: f64,
    /// Occurrence count where the count sub-score saturates at 1.0
    pub count_saturation: usize,

    pub weekly: FrequencyWindow,
    pub monthly: FrequencyWindow,
    pub quarterly: FrequencyWindow,
    pub yearly: FrequencyWindow,

    /// Infer pending/cancelled from missing recent payments
    pub infer_lapsed_status: bool,

    /// Tried in order when no member transaction has a provider category
    pub category_rules: Vec<CategoryRule>,
}

impl DetectionConfig {
    /// Built-in numeric defaults with no category rules
    fn builtin() -> Self {
        Self {
            amount_tolerance: 0.05,
            min_occurrences: 2,
            irregular_min_occurrences: 3,
            count_weight: 0.40,
            interval_weight: 0.35,
            amount_weight: 0.25,
            count_saturation: 6,
            weekly: FrequencyWindow::new(5, 9, 3),
            monthly: FrequencyWindow::new(28, 31, 7),
            quarterly: FrequencyWindow::new(85, 95, 14),
            yearly: FrequencyWindow::new(355, 375, 30),
            infer_lapsed_status: true,
            category_rules: Vec::new(),
        }
    }

    /// Load config: embedded defaults, then the override file if present
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let base = apply_toml(Self::builtin(), DEFAULT_CONFIG)?;

        let path = match override_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };

        match path {
            Some(path) if path.exists() => {
                debug!("Loading detection config override from {}", path.display());
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                apply_toml(base, &content)
            }
            _ => Ok(base),
        }
    }

    /// Parse a config from TOML content layered over the embedded defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let base = apply_toml(Self::builtin(), DEFAULT_CONFIG)?;
        apply_toml(base, content)
    }

    /// Get the day-gap window for a frequency
    pub fn window(&self, frequency: BillFrequency) -> &FrequencyWindow {
        match frequency {
            BillFrequency::Weekly => &self.weekly,
            BillFrequency::Monthly => &self.monthly,
            BillFrequency::Quarterly => &self.quarterly,
            BillFrequency::Yearly => &self.yearly,
        }
    }

    /// Render the effective config as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        let window = |w: &FrequencyWindow| RawWindow {
            min_days: Some(w.min_days),
            max_days: Some(w.max_days),
            grace_days: Some(w.grace_days),
        };

        let raw = RawConfig {
            grouping: Some(RawGrouping {
                amount_tolerance: Some(self.amount_tolerance),
                min_occurrences: Some(self.min_occurrences),
                irregular_min_occurrences: Some(self.irregular_min_occurrences),
            }),
            confidence: Some(RawConfidence {
                count_weight: Some(self.count_weight),
                interval_weight: Some(self.interval_weight),
                amount_weight: Some(self.amount_weight),
                count_saturation: Some(self.count_saturation),
            }),
            frequency: Some(RawFrequencies {
                weekly: Some(window(&self.weekly)),
                monthly: Some(window(&self.monthly)),
                quarterly: Some(window(&self.quarterly)),
                yearly: Some(window(&self.yearly)),
            }),
            status: Some(RawStatus {
                infer_lapsed_status: Some(self.infer_lapsed_status),
            }),
            categories: Some(
                self.category_rules
                    .iter()
                    .map(|rule| RawCategory {
                        name: rule.category.clone(),
                        pattern: rule.pattern.clone(),
                        pattern_type: Some(rule.pattern_type),
                    })
                    .collect(),
            ),
        };

        toml::to_string_pretty(&raw)
            .map_err(|e| Error::Config(format!("Failed to render config: {}", e)))
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        apply_toml(Self::builtin(), DEFAULT_CONFIG).unwrap_or_else(|_| Self::builtin())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("billsense").join("detection.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawConfig {
    grouping: Option<RawGrouping>,
    confidence: Option<RawConfidence>,
    frequency: Option<RawFrequencies>,
    status: Option<RawStatus>,
    categories: Option<Vec<RawCategory>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawGrouping {
    amount_tolerance: Option<f64>,
    min_occurrences: Option<usize>,
    irregular_min_occurrences: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawConfidence {
    count_weight: Option<f64>,
    interval_weight: Option<f64>,
    amount_weight: Option<f64>,
    count_saturation: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawFrequencies {
    weekly: Option<RawWindow>,
    monthly: Option<RawWindow>,
    quarterly: Option<RawWindow>,
    yearly: Option<RawWindow>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawWindow {
    min_days: Option<i64>,
    max_days: Option<i64>,
    grace_days: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawStatus {
    infer_lapsed_status: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RawCategory {
    name: String,
    pattern: String,
    pattern_type: Option<PatternType>,
}

/// Apply TOML content on top of an existing config, then validate
fn apply_toml(mut config: DetectionConfig, content: &str) -> Result<DetectionConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    if let Some(grouping) = raw.grouping {
        if let Some(tolerance) = grouping.amount_tolerance {
            config.amount_tolerance = tolerance;
        }
        if let Some(min) = grouping.min_occurrences {
            config.min_occurrences = min;
        }
        if let Some(min) = grouping.irregular_min_occurrences {
            config.irregular_min_occurrences = min;
        }
    }

    if let Some(confidence) = raw.confidence {
        if let Some(w) = confidence.count_weight {
            config.count_weight = w;
        }
        if let Some(w) = confidence.interval_weight {
            config.interval_weight = w;
        }
        if let Some(w) = confidence.amount_weight {
            config.amount_weight = w;
        }
        if let Some(saturation) = confidence.count_saturation {
            config.count_saturation = saturation;
        }
    }

    if let Some(frequency) = raw.frequency {
        apply_window(&mut config.weekly, frequency.weekly);
        apply_window(&mut config.monthly, frequency.monthly);
        apply_window(&mut config.quarterly, frequency.quarterly);
        apply_window(&mut config.yearly, frequency.yearly);
    }

    if let Some(status) = raw.status {
        if let Some(infer) = status.infer_lapsed_status {
            config.infer_lapsed_status = infer;
        }
    }

    // A categories list replaces the previous rules wholesale
    if let Some(categories) = raw.categories {
        config.category_rules = categories
            .iter()
            .map(|c| {
                CategoryRule::new(&c.name, &c.pattern, c.pattern_type.unwrap_or_default())
                    .map_err(|e| Error::Config(format!("Invalid rule for {}: {}", c.name, e)))
            })
            .collect::<Result<Vec<_>>>()?;
    }

    validate(config)
}

fn apply_window(window: &mut FrequencyWindow, raw: Option<RawWindow>) {
    if let Some(raw) = raw {
        if let Some(min) = raw.min_days {
            window.min_days = min;
        }
        if let Some(max) = raw.max_days {
            window.max_days = max;
        }
        if let Some(grace) = raw.grace_days {
            window.grace_days = grace;
        }
    }
}

/// Reject nonsensical values and normalize the confidence weights
fn validate(mut config: DetectionConfig) -> Result<DetectionConfig> {
    if !(config.amount_tolerance > 0.0 && config.amount_tolerance < 1.0) {
        return Err(Error::Config(format!(
            "amount_tolerance must be between 0 and 1, got {}",
            config.amount_tolerance
        )));
    }

    if config.min_occurrences < 2 {
        return Err(Error::Config(
            "min_occurrences must be at least 2 (one payment is not recurring)".into(),
        ));
    }

    if config.irregular_min_occurrences < config.min_occurrences {
        return Err(Error::Config(
            "irregular_min_occurrences must not be below min_occurrences".into(),
        ));
    }

    if config.count_saturation < 2 {
        return Err(Error::Config("count_saturation must be at least 2".into()));
    }

    let weights = [
        config.count_weight,
        config.interval_weight,
        config.amount_weight,
    ];
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(Error::Config(
            "confidence weights must be non-negative".into(),
        ));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(Error::Config(
            "at least one confidence weight must be positive".into(),
        ));
    }
    config.count_weight /= total;
    config.interval_weight /= total;
    config.amount_weight /= total;

    for frequency in BillFrequency::all() {
        let window = config.window(*frequency);
        if window.min_days < 1 || window.min_days > window.max_days || window.grace_days < 0 {
            return Err(Error::Config(format!(
                "invalid {} window: {}..={} days, grace {}",
                frequency, window.min_days, window.max_days, window.grace_days
            )));
        }
    }

    Ok(config)
}
