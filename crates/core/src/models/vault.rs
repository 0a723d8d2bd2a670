use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::performance::PerformanceResult;
use super::valuation::Reconstruction;

/// Statically configured facts about a vault, used when the ledger cannot anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultProfile {
    pub vault_id: String,

    pub inception_date: NaiveDate,

    /// Price per share at inception
    pub reference_price: f64,

    /// Configured AUM, used when the ledger has no valuation mark
    #[serde(default)]
    pub configured_aum: Option<f64>,

    /// Configured price per share, used when no implied price can be derived
    #[serde(default)]
    pub configured_price: Option<f64>,

    #[serde(default)]
    pub server_roi: Option<f64>,

    #[serde(default)]
    pub server_apr: Option<f64>,
}

impl VaultProfile {
    pub fn new(vault_id: impl Into<String>, inception_date: NaiveDate, reference_price: f64) -> Self {
        Self {
            vault_id: vault_id.into(),
            inception_date,
            reference_price,
            configured_aum: None,
            configured_price: None,
            server_roi: None,
            server_apr: None,
        }
    }

    pub fn with_configured(mut self, aum: Option<f64>, price: Option<f64>) -> Self {
        self.configured_aum = aum;
        self.configured_price = price;
        self
    }

    pub fn with_server_figures(mut self, roi: Option<f64>, apr: Option<f64>) -> Self {
        self.server_roi = roi;
        self.server_apr = apr;
        self
    }
}

/// Where a vault metric came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricSource {
    /// Reconstructed from the ledger
    Derived,
    /// Taken from the vault profile
    Configured,
    /// Neither the ledger nor the profile had it
    Unavailable,
}

impl std::fmt::Display for MetricSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricSource::Derived => write!(f, "Derived"),
            MetricSource::Configured => write!(f, "Configured"),
            MetricSource::Unavailable => write!(f, "Unavailable"),
        }
    }
}

/// Everything a vault detail view shows about value and performance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultMetrics {
    pub vault_id: String,
    pub as_of_date: NaiveDate,
    pub aum: Option<f64>,
    pub aum_source: MetricSource,
    pub price_per_share: Option<f64>,
    pub price_source: MetricSource,
    pub reconstruction: Reconstruction,
    pub performance: PerformanceResult,
}
