//! Application settings loading from ledger.toml
//!
//! Every field has a default, so a missing file or a partial file both yield
//! usable settings.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_SETTINGS_PATH: &str = "ledger.toml";

/// Configuration structure representing the entire ledger.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Owner balance rules
    pub balances: BalanceSettings,
    /// Seat value prediction parameters
    pub prediction: PredictionSettings,
    /// Team performance parameters
    pub performance: PerformanceSettings,
}

/// Rules applied by the owner balance aggregator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BalanceSettings {
    /// `from_owner` payment categories left out of recurring balance math
    pub excluded_payment_categories: Vec<String>,
    /// Exact `from_owner` payment amounts left out of recurring balance math
    pub excluded_payment_amounts: Vec<f64>,
    /// Keep owners that hold no seats but have payment history in lifetime balances
    pub include_payment_only_owners: bool,
}

impl Default for BalanceSettings {
    fn default() -> Self {
        Self {
            excluded_payment_categories: vec!["seat_license".to_string()],
            excluded_payment_amounts: Vec::new(),
            include_payment_only_owners: false,
        }
    }
}

impl BalanceSettings {
    /// Whether a `from_owner` payment is left out of recurring balance math.
    #[must_use]
    pub fn excludes_payment(&self, category: &str, amount: f64) -> bool {
        self.excluded_payment_categories
            .iter()
            .any(|excluded| excluded == category)
            || self
                .excluded_payment_amounts
                .iter()
                .any(|excluded| (excluded - amount).abs() < 0.005)
    }
}

/// Parameters for the seat value predictor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictionSettings {
    /// How long a computed prediction stays valid
    pub validity_days: i64,
    /// Window for "recent" similar-seat sales
    pub recent_sales_days: i64,
    /// Clamp the confidence score to `[0, 100]` instead of reporting the raw sum
    pub clamp_confidence: bool,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            validity_days: 7,
            recent_sales_days: 30,
            clamp_confidence: false,
        }
    }
}

/// Parameters for the team performance calculator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PerformanceSettings {
    /// A game counts as a win when its attendance exceeds this many records
    pub win_attendance_threshold: u64,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            win_attendance_threshold: 3,
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Loading settings from {}", path_ref.display());
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read settings file {}: {e}", path_ref.display()),
    })?;

    parse_settings(&contents)
}

/// Parses settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse ledger.toml: {e}"),
    })
}

/// Loads settings from `LEDGER_CONFIG` or ./ledger.toml, falling back to defaults
/// when the file does not exist.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var("LEDGER_CONFIG").unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    if Path::new(&path).exists() {
        load_settings(&path)
    } else {
        info!("No settings file at {path}, using defaults.");
        Ok(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            [balances]
            excluded_payment_categories = ["seat_license", "psl_transfer"]
            excluded_payment_amounts = [1249.55]
            include_payment_only_owners = true

            [prediction]
            validity_days = 3
            recent_sales_days = 14
            clamp_confidence = true

            [performance]
            win_attendance_threshold = 5
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.balances.excluded_payment_categories.len(), 2);
        assert_eq!(settings.balances.excluded_payment_amounts, vec![1249.55]);
        assert!(settings.balances.include_payment_only_owners);
        assert_eq!(settings.prediction.validity_days, 3);
        assert_eq!(settings.prediction.recent_sales_days, 14);
        assert!(settings.prediction.clamp_confidence);
        assert_eq!(settings.performance.win_attendance_threshold, 5);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings = parse_settings("[prediction]\nvalidity_days = 1\n").unwrap();
        assert_eq!(settings.prediction.validity_days, 1);
        assert_eq!(settings.prediction.recent_sales_days, 30);
        assert_eq!(
            settings.balances.excluded_payment_categories,
            vec!["seat_license".to_string()]
        );
        assert!(settings.balances.excluded_payment_amounts.is_empty());
        assert_eq!(settings.performance.win_attendance_threshold, 3);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = parse_settings("[prediction\nvalidity_days = ");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_excludes_payment_by_category_and_amount() {
        let settings = BalanceSettings {
            excluded_payment_amounts: vec![1249.55],
            ..BalanceSettings::default()
        };
        assert!(settings.excludes_payment("seat_license", 10.0));
        assert!(settings.excludes_payment("parking", 1249.55));
        assert!(!settings.excludes_payment("parking", 1249.0));
    }
}
