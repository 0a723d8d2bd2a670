pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::NaiveDate;
use models::{
    conversion::{CacheStats, ConversionRequest, ConversionResult},
    ledger::{LedgerEntry, ShareState},
    performance::{PerformanceInput, PerformanceResult},
    settings::EngineSettings,
    valuation::Reconstruction,
    vault::{VaultMetrics, VaultProfile},
};
use providers::{
    registry::RateProviderRegistry,
    traits::{LedgerProvider, RateProvider},
};
use services::{
    conversion_service::ConversionCache, metrics_service::VaultMetricsService,
    performance_service::PerformanceCalculator, valuation_service::ValuationReconstructor,
};
use std::sync::Arc;

use errors::CoreError;

/// Main entry point for the valuation core. One instance per user session.
///
/// Owns the session's conversion caches and the configured calculators.
/// Views receive a reference (or a clone of the conversion cache) instead of
/// keeping their own copies of the conversion and valuation logic.
#[must_use]
pub struct ValuationService {
    settings: EngineSettings,
    conversion: ConversionCache,
    reconstructor: ValuationReconstructor,
    calculator: PerformanceCalculator,
    metrics_service: VaultMetricsService,
}

impl std::fmt::Debug for ValuationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValuationService")
            .field("display_currency", &self.settings.display_currency)
            .field("cache", &self.conversion.stats())
            .finish()
    }
}

impl ValuationService {
    /// Create a service with the default rate providers.
    pub fn new(settings: EngineSettings) -> Result<Self, CoreError> {
        let registry = RateProviderRegistry::new_with_defaults(&settings);
        Self::with_provider(settings, Arc::new(registry))
    }

    /// Create a service with an explicit rate provider (tests, custom backends).
    pub fn with_provider(
        settings: EngineSettings,
        provider: Arc<dyn RateProvider>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let calculator = PerformanceCalculator::from_settings(&settings);
        Ok(Self {
            conversion: ConversionCache::new(provider, settings.fallback_rates.clone()),
            reconstructor: ValuationReconstructor::new(),
            metrics_service: VaultMetricsService::new(calculator.clone()),
            calculator,
            settings,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ── Currency conversion ─────────────────────────────────────────

    /// Convert one row's amounts. Never blocks and never fails.
    pub fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        self.conversion.convert(request)
    }

    pub fn convert_batch(&self, requests: &[ConversionRequest]) -> Vec<ConversionResult> {
        self.conversion.convert_batch(requests)
    }

    /// Convert into the configured display currency.
    pub fn convert_for_display(
        &self,
        row_id: &str,
        amount: f64,
        currency: &str,
        date: NaiveDate,
    ) -> Result<ConversionResult, CoreError> {
        let request =
            ConversionRequest::new(row_id, amount, currency, &self.settings.display_currency, date)?;
        Ok(self.conversion.convert(&request))
    }

    /// Handle to the shared conversion cache, for views that convert on their own.
    #[must_use]
    pub fn conversion_cache(&self) -> ConversionCache {
        self.conversion.clone()
    }

    /// Wait for all rate fetches started so far.
    pub async fn settle(&self) {
        self.conversion.settle().await;
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.conversion.stats()
    }

    // ── Valuation & performance ─────────────────────────────────────

    #[must_use]
    pub fn reconstruct(&self, entries: &[LedgerEntry], share_state: &ShareState) -> Reconstruction {
        self.reconstructor.reconstruct(entries, share_state)
    }

    #[must_use]
    pub fn compute_performance(&self, input: &PerformanceInput) -> PerformanceResult {
        self.calculator.compute(input)
    }

    #[must_use]
    pub fn vault_metrics(
        &self,
        profile: &VaultProfile,
        entries: &[LedgerEntry],
        share_state: &ShareState,
        as_of: NaiveDate,
    ) -> VaultMetrics {
        self.metrics_service
            .vault_metrics(profile, entries, share_state, as_of)
    }

    pub async fn load_vault_metrics(
        &self,
        ledger: &dyn LedgerProvider,
        profile: &VaultProfile,
        as_of: NaiveDate,
    ) -> Result<VaultMetrics, CoreError> {
        self.metrics_service
            .load_vault_metrics(ledger, profile, as_of)
            .await
    }

    // ── Session ─────────────────────────────────────────────────────

    /// Forget everything cached this session (logout).
    pub fn reset(&self) {
        log::debug!("resetting conversion caches");
        self.conversion.reset();
    }
}
