use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An ordered currency pair, e.g. `USD → VND`. Codes are stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub from: String,
    pub to: String,
}

impl CurrencyPair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into().to_uppercase(),
            to: to.into().to_uppercase(),
        }
    }

    /// The `"FROM-TO"` key used by embedded rate tables and the fallback table.
    pub fn key(&self) -> String {
        format!("{}-{}", self.from, self.to)
    }

    pub fn inverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }
}

impl std::fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

/// Rate cache key: one rate per pair per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateKey {
    pub pair: CurrencyPair,
    pub date: NaiveDate,
}

impl RateKey {
    pub fn new(pair: CurrencyPair, date: NaiveDate) -> Self {
        Self { pair, date }
    }
}

/// Rate table embedded in a data-source row, keyed `"<FROM>-<TO>"`.
pub type InlineRates = HashMap<String, f64>;

/// Returns a usable rate: finite and strictly positive.
pub(crate) fn usable_rate(rate: f64) -> Option<f64> {
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Fixed approximate rates used while the real rate is being fetched.
///
/// Lookups try the direct key, then the inverse key, and otherwise return 1.0.
/// Keys read from configuration are trimmed and upper-cased, so `"usd-vnd"` works too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, f64>", into = "HashMap<String, f64>")]
pub struct FallbackRates {
    rates: HashMap<String, f64>,
}

impl FallbackRates {
    pub fn new() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    /// Register an approximate rate for `from → to`.
    pub fn with_rate(mut self, from: &str, to: &str, rate: f64) -> Self {
        self.insert(from, to, rate);
        self
    }

    pub fn insert(&mut self, from: &str, to: &str, rate: f64) {
        self.rates.insert(CurrencyPair::new(from, to).key(), rate);
    }

    /// Approximate rate for a pair. Never fails.
    pub fn rate_for(&self, pair: &CurrencyPair) -> f64 {
        if pair.is_identity() {
            return 1.0;
        }
        if let Some(rate) = self.rates.get(&pair.key()).copied().and_then(usable_rate) {
            return rate;
        }
        self.rates
            .get(&pair.inverse().key())
            .copied()
            .and_then(usable_rate)
            .map(|inverse| 1.0 / inverse)
            .unwrap_or(1.0)
    }

    /// Whether the table has an entry (direct or inverse) for the pair.
    pub fn knows(&self, pair: &CurrencyPair) -> bool {
        self.rates.contains_key(&pair.key()) || self.rates.contains_key(&pair.inverse().key())
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.rates.iter()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl From<HashMap<String, f64>> for FallbackRates {
    fn from(raw: HashMap<String, f64>) -> Self {
        Self {
            rates: raw
                .into_iter()
                .map(|(key, rate)| (key.trim().to_uppercase(), rate))
                .collect(),
        }
    }
}

impl From<FallbackRates> for HashMap<String, f64> {
    fn from(fallback: FallbackRates) -> Self {
        fallback.rates
    }
}

impl Default for FallbackRates {
    /// USD ↔ VND is the only pair the tracker ships an approximation for.
    fn default() -> Self {
        Self::new().with_rate("USD", "VND", 25_000.0)
    }
}
