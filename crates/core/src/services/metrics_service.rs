use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::ledger::{LedgerEntry, ShareState};
use crate::models::performance::PerformanceInput;
use crate::models::vault::{MetricSource, VaultMetrics, VaultProfile};
use crate::providers::traits::LedgerProvider;
use crate::services::performance_service::PerformanceCalculator;
use crate::services::valuation_service::ValuationReconstructor;

/// Combines ledger reconstruction and performance into the figures a vault view shows.
///
/// Derived values win; the vault profile's configured values fill the gaps.
pub struct VaultMetricsService {
    reconstructor: ValuationReconstructor,
    calculator: PerformanceCalculator,
}

impl VaultMetricsService {
    pub fn new(calculator: PerformanceCalculator) -> Self {
        Self {
            reconstructor: ValuationReconstructor::new(),
            calculator,
        }
    }

    pub fn vault_metrics(
        &self,
        profile: &VaultProfile,
        entries: &[LedgerEntry],
        share_state: &ShareState,
        as_of: NaiveDate,
    ) -> VaultMetrics {
        let reconstruction = self.reconstructor.reconstruct(entries, share_state);

        let (aum, aum_source) = resolve(reconstruction.rolling_aum, profile.configured_aum);
        let (price_per_share, price_source) =
            resolve(reconstruction.implied_price_per_share, profile.configured_price);

        if aum_source != MetricSource::Derived {
            log::debug!(
                "vault {}: no usable valuation mark, AUM is {aum_source}",
                profile.vault_id
            );
        }
        if price_source == MetricSource::Unavailable {
            log::warn!("vault {}: no share price available", profile.vault_id);
        }

        let input = PerformanceInput::new(
            profile.reference_price,
            price_per_share.unwrap_or(0.0),
            profile.inception_date,
            as_of,
        )
        .with_server_figures(profile.server_roi, profile.server_apr);
        let performance = self.calculator.compute(&input);

        VaultMetrics {
            vault_id: profile.vault_id.clone(),
            as_of_date: as_of,
            aum,
            aum_source,
            price_per_share,
            price_source,
            reconstruction,
            performance,
        }
    }

    /// Load the vault's ledger and share state, then compute its metrics.
    /// Provider failures are returned as-is.
    pub async fn load_vault_metrics(
        &self,
        ledger: &dyn LedgerProvider,
        profile: &VaultProfile,
        as_of: NaiveDate,
    ) -> Result<VaultMetrics, CoreError> {
        let entries = ledger.load_ledger(&profile.vault_id).await?;
        let share_state = ledger.load_share_state(&profile.vault_id).await?;
        log::debug!(
            "loaded {} ledger entries for vault {} from {}",
            entries.len(),
            profile.vault_id,
            ledger.name()
        );
        Ok(self.vault_metrics(profile, &entries, &share_state, as_of))
    }
}

impl Default for VaultMetricsService {
    fn default() -> Self {
        Self::new(PerformanceCalculator::default())
    }
}

fn resolve(derived: Option<f64>, configured: Option<f64>) -> (Option<f64>, MetricSource) {
    if let Some(v) = derived {
        return (Some(v), MetricSource::Derived);
    }
    match configured.filter(|v| v.is_finite()) {
        Some(v) => (Some(v), MetricSource::Configured),
        None => (None, MetricSource::Unavailable),
    }
}
