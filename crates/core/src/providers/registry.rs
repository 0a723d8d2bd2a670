use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::settings::EngineSettings;

use super::frankfurter::FrankfurterProvider;
use super::traits::RateProvider;

/// Ordered chain of rate providers.
///
/// `get_rate` tries providers in registration order and returns the first
/// finite, positive rate. If the primary fails (API down, pair not covered),
/// the next one is tried. The registry is itself a `RateProvider`, so the
/// conversion cache never knows how many sources sit behind it.
pub struct RateProviderRegistry {
    providers: Vec<Box<dyn RateProvider>>,
}

impl RateProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with the default providers configured from `settings`.
    pub fn new_with_defaults(settings: &EngineSettings) -> Self {
        let mut registry = Self::new();

        // Frankfurter: ECB reference rates, no API key needed
        registry.register(Box::new(FrankfurterProvider::with_timeout(
            settings.request_timeout_secs,
        )));

        registry
    }

    /// Register a new provider at the end of the chain.
    pub fn register(&mut self, provider: Box<dyn RateProvider>) {
        self.providers.push(provider);
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for RateProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateProvider for RateProviderRegistry {
    fn name(&self) -> &str {
        "Registry"
    }

    async fn get_rate(&self, from: &str, to: &str, date: NaiveDate) -> Result<f64, CoreError> {
        if self.providers.is_empty() {
            return Err(CoreError::NoProvider);
        }

        let mut last_error = None;
        for provider in &self.providers {
            match provider.get_rate(from, to, date).await {
                Ok(rate) if rate.is_finite() && rate > 0.0 => return Ok(rate),
                Ok(rate) => {
                    last_error = Some(CoreError::Api {
                        provider: provider.name().to_string(),
                        message: format!(
                            "Invalid rate returned for {from}/{to}: {rate} (must be finite and positive)"
                        ),
                    });
                }
                Err(e) => {
                    log::debug!("{} failed for {from}/{to} on {date}: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(CoreError::NoProvider))
    }
}
