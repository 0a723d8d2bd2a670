use crate::models::performance::{FigureSource, PerformanceInput, PerformanceResult};
use crate::models::settings::EngineSettings;

/// Computes total return and annualized rate from a reference and a current price.
///
/// Client-side fallback only: finite server-supplied ROI/APR always win.
/// Never panics and never returns NaN or infinity.
#[derive(Debug, Clone)]
pub struct PerformanceCalculator {
    min_annualize_days: i64,
    noise_threshold_pct: f64,
    days_per_year: f64,
}

impl PerformanceCalculator {
    pub fn new() -> Self {
        Self::from_settings(&EngineSettings::default())
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            min_annualize_days: settings.min_annualize_days,
            noise_threshold_pct: settings.noise_threshold_pct,
            days_per_year: settings.days_per_year,
        }
    }

    pub fn compute(&self, input: &PerformanceInput) -> PerformanceResult {
        // Same-day inception counts as one day.
        let days_elapsed = (input.as_of_date - input.inception_date).num_days().max(1);

        let mut total_return = self.total_return(input.reference_price, input.current_price);
        if total_return.abs() < self.noise_threshold_pct {
            total_return = 0.0;
        }

        // Compounding a few days of return produces absurd yearly figures.
        let annualized = if days_elapsed < self.min_annualize_days {
            total_return
        } else {
            let years = days_elapsed as f64 / self.days_per_year;
            ((1.0 + total_return / 100.0).powf(1.0 / years) - 1.0) * 100.0
        };

        let (total_return_percent, return_source) = match input.server_roi.filter(|v| v.is_finite()) {
            Some(roi) => (roi, FigureSource::Server),
            None => (finite_or_zero(total_return), FigureSource::Local),
        };
        let (annualized_percent, annualized_source) = match input.server_apr.filter(|v| v.is_finite()) {
            Some(apr) => (apr, FigureSource::Server),
            None => (finite_or_zero(annualized), FigureSource::Local),
        };

        PerformanceResult {
            total_return_percent,
            annualized_percent,
            days_elapsed,
            return_source,
            annualized_source,
        }
    }

    fn total_return(&self, reference_price: f64, current_price: f64) -> f64 {
        if reference_price > 0.0
            && reference_price.is_finite()
            && current_price.is_finite()
            && current_price > 0.0
        {
            finite_or_zero((current_price / reference_price - 1.0) * 100.0)
        } else {
            0.0
        }
    }
}

impl Default for PerformanceCalculator {
    fn default() -> Self {
        Self::new()
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
