use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inputs for a return/annualized-rate computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceInput {
    /// Price at inception (or any reference point)
    pub reference_price: f64,

    /// Current price, possibly implied from the ledger
    pub current_price: f64,

    pub inception_date: NaiveDate,

    pub as_of_date: NaiveDate,

    /// Server-computed total return in percent; wins over the local figure when finite
    #[serde(default)]
    pub server_roi: Option<f64>,

    /// Server-computed annualized rate in percent; wins over the local figure when finite
    #[serde(default)]
    pub server_apr: Option<f64>,
}

impl PerformanceInput {
    pub fn new(
        reference_price: f64,
        current_price: f64,
        inception_date: NaiveDate,
        as_of_date: NaiveDate,
    ) -> Self {
        Self {
            reference_price,
            current_price,
            inception_date,
            as_of_date,
            server_roi: None,
            server_apr: None,
        }
    }

    pub fn with_server_figures(mut self, roi: Option<f64>, apr: Option<f64>) -> Self {
        self.server_roi = roi;
        self.server_apr = apr;
        self
    }
}

/// Where a performance figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FigureSource {
    Local,
    Server,
}

/// Derived performance figures. Never persisted; never NaN or infinite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceResult {
    pub total_return_percent: f64,
    pub annualized_percent: f64,
    pub days_elapsed: i64,
    pub return_source: FigureSource,
    pub annualized_source: FigureSource,
}
