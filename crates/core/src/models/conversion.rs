use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use super::rates::{usable_rate, CurrencyPair, InlineRates, RateKey};

/// A request to show one row's monetary amounts in a target currency.
///
/// Build with [`ConversionRequest::new`], which validates and upper-cases the codes.
/// Deserialization goes through the same checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawConversionRequest")]
pub struct ConversionRequest {
    /// Identifies the source row (transaction, borrowing...). Part of the result cache key.
    pub row_id: String,

    /// Main amount in the row's own currency
    pub amount_local: f64,

    /// Optional secondary amount (the row's cash flow), converted with the same rate
    pub cashflow_local: Option<f64>,

    pub local_currency: String,

    pub target_currency: String,

    /// Date the row is valued at; rates are looked up per calendar day.
    pub as_of_date: NaiveDate,

    /// Rate table embedded in the row by the data source, if any
    pub inline_rates: Option<InlineRates>,
}

/// Wire shape of a request before validation.
#[derive(Deserialize)]
struct RawConversionRequest {
    row_id: String,
    amount_local: f64,
    #[serde(default)]
    cashflow_local: Option<f64>,
    local_currency: String,
    target_currency: String,
    as_of_date: NaiveDate,
    #[serde(default)]
    inline_rates: Option<InlineRates>,
}

impl TryFrom<RawConversionRequest> for ConversionRequest {
    type Error = CoreError;

    fn try_from(raw: RawConversionRequest) -> Result<Self, Self::Error> {
        let mut request = Self::new(
            raw.row_id,
            raw.amount_local,
            &raw.local_currency,
            &raw.target_currency,
            raw.as_of_date,
        )?;
        request.cashflow_local = raw.cashflow_local;
        request.inline_rates = raw.inline_rates;
        Ok(request)
    }
}

impl ConversionRequest {
    pub fn new(
        row_id: impl Into<String>,
        amount_local: f64,
        local_currency: &str,
        target_currency: &str,
        as_of_date: NaiveDate,
    ) -> Result<Self, CoreError> {
        let row_id = row_id.into();
        if row_id.trim().is_empty() {
            return Err(CoreError::InvalidRequest("row id must not be empty".into()));
        }
        Ok(Self {
            row_id,
            amount_local,
            cashflow_local: None,
            local_currency: normalize_currency(local_currency)?,
            target_currency: normalize_currency(target_currency)?,
            as_of_date,
            inline_rates: None,
        })
    }

    pub fn with_cashflow(mut self, cashflow_local: f64) -> Self {
        self.cashflow_local = Some(cashflow_local);
        self
    }

    pub fn with_inline_rates(mut self, rates: InlineRates) -> Self {
        self.inline_rates = Some(rates);
        self
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.local_currency, &self.target_currency)
    }

    pub fn rate_key(&self) -> RateKey {
        RateKey::new(self.pair(), self.as_of_date)
    }

    pub fn amount_key(&self) -> AmountKey {
        AmountKey {
            row_id: self.row_id.clone(),
            target_currency: self.target_currency.to_uppercase(),
        }
    }

    /// Direct `"FROM-TO"` rate from the embedded table, when usable.
    pub fn inline_rate(&self) -> Option<f64> {
        let rates = self.inline_rates.as_ref()?;
        rates
            .get(&self.pair().key())
            .copied()
            .and_then(usable_rate)
    }

    /// Apply a rate to this row's amounts. Non-finite products become 0.
    pub fn apply_rate(&self, rate: f64) -> ConvertedAmount {
        ConvertedAmount {
            amount: sanitize(self.amount_local * rate),
            cashflow: self.cashflow_local.map(|c| sanitize(c * rate)),
        }
    }
}

fn normalize_currency(code: &str) -> Result<String, CoreError> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::InvalidRequest(format!(
            "'{code}' is not a three-letter currency code"
        )));
    }
    Ok(code.to_uppercase())
}

fn sanitize(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Converted-amount cache key: `(row_id, target_currency)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AmountKey {
    pub row_id: String,
    pub target_currency: String,
}

/// A row's amounts after conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvertedAmount {
    pub amount: f64,
    pub cashflow: Option<f64>,
}

/// Which resolution tier produced a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionSource {
    /// Previously resolved for this row and target currency
    Cached,
    /// Same currency on both sides
    Identity,
    /// Rate embedded in the source row
    Inline,
    /// Rate fetched earlier for the same pair and day
    RateCache,
    /// Approximate rate while the real one is being fetched
    Fallback,
}

impl std::fmt::Display for ConversionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionSource::Cached => write!(f, "Cached"),
            ConversionSource::Identity => write!(f, "Identity"),
            ConversionSource::Inline => write!(f, "Inline"),
            ConversionSource::RateCache => write!(f, "RateCache"),
            ConversionSource::Fallback => write!(f, "Fallback"),
        }
    }
}

/// Result of [`crate::services::conversion_service::ConversionCache::convert`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub amount: f64,
    pub cashflow: Option<f64>,
    /// True when produced by the fallback table; the UI may badge it.
    pub is_stale: bool,
    pub source: ConversionSource,
}

impl ConversionResult {
    pub(crate) fn fresh(converted: ConvertedAmount, source: ConversionSource) -> Self {
        Self {
            amount: converted.amount,
            cashflow: converted.cashflow,
            is_stale: false,
            source,
        }
    }

    pub(crate) fn stale(converted: ConvertedAmount) -> Self {
        Self {
            amount: converted.amount,
            cashflow: converted.cashflow,
            is_stale: true,
            source: ConversionSource::Fallback,
        }
    }
}

/// Snapshot of the conversion caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub converted_amounts: usize,
    pub rates: usize,
    pub in_flight: usize,
}
