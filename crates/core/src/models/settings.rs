use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use super::rates::FallbackRates;

/// Engine configuration. Every field has a default, so a partial JSON document is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Currency monetary amounts are displayed in (e.g., "USD", "VND").
    pub display_currency: String,

    /// Approximate rates used while a real rate is being fetched.
    pub fallback_rates: FallbackRates,

    /// Histories shorter than this are reported without annualization.
    pub min_annualize_days: i64,

    /// Absolute total returns below this (in percent) are shown as exactly 0.
    pub noise_threshold_pct: f64,

    pub days_per_year: f64,

    /// HTTP timeout for the built-in rate providers.
    pub request_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            display_currency: "USD".to_string(),
            fallback_rates: FallbackRates::default(),
            min_annualize_days: 30,
            noise_threshold_pct: 0.01,
            days_per_year: 365.25,
            request_timeout_secs: 30,
        }
    }
}

impl EngineSettings {
    /// Parse settings from JSON and validate them.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let code = self.display_currency.trim();
        if !is_currency_code(code) {
            return Err(CoreError::InvalidSettings(format!(
                "display_currency '{code}' is not a three-letter currency code"
            )));
        }
        if self.min_annualize_days < 1 {
            return Err(CoreError::InvalidSettings(
                "min_annualize_days must be at least 1".into(),
            ));
        }
        if !self.noise_threshold_pct.is_finite() || self.noise_threshold_pct < 0.0 {
            return Err(CoreError::InvalidSettings(
                "noise_threshold_pct must be a finite, non-negative number".into(),
            ));
        }
        if !self.days_per_year.is_finite() || self.days_per_year <= 0.0 {
            return Err(CoreError::InvalidSettings(
                "days_per_year must be a finite, positive number".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::InvalidSettings(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        for (key, rate) in self.fallback_rates.entries() {
            let well_formed = key
                .split_once('-')
                .is_some_and(|(from, to)| is_currency_code(from) && is_currency_code(to));
            if !well_formed {
                return Err(CoreError::InvalidSettings(format!(
                    "fallback rate key '{key}' must look like 'USD-VND'"
                )));
            }
            if !rate.is_finite() || *rate <= 0.0 {
                return Err(CoreError::InvalidSettings(format!(
                    "fallback rate {key} must be finite and positive, got {rate}"
                )));
            }
        }
        Ok(())
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}
