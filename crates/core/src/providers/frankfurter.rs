use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::CoreError;
use super::traits::RateProvider;

const BASE_URL: &str = "https://api.frankfurter.dev/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Frankfurter API provider for fiat exchange rates.
///
/// - **Free**: No API key, no rate limits, open-source.
/// - **Source**: European Central Bank (ECB) reference rates.
/// - **Endpoints**: `/latest` for today onwards, `/{date}` for past days.
///
/// ECB does not publish every currency (VND, for one, is missing); such pairs fail
/// and the conversion cache keeps serving its fallback rate.
pub struct FrankfurterProvider {
    client: Client,
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self::with_base_url(BASE_URL, timeout_secs)
    }

    /// Point the provider at another deployment (self-hosted Frankfurter, a mock server).
    pub fn with_base_url(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, base: &str, target: &str, date: NaiveDate, today: NaiveDate) -> String {
        if date >= today {
            format!("{}/latest?base={base}&symbols={target}", self.base_url)
        } else {
            let date_str = date.format("%Y-%m-%d");
            format!("{}/{date_str}?base={base}&symbols={target}", self.base_url)
        }
    }
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── Frankfurter API response types ──────────────────────────────────

#[derive(Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    fn name(&self) -> &str {
        "Frankfurter"
    }

    async fn get_rate(&self, from: &str, to: &str, date: NaiveDate) -> Result<f64, CoreError> {
        let base = from.to_uppercase();
        let target = to.to_uppercase();

        // Same currency → rate is 1.0
        if base == target {
            return Ok(1.0);
        }

        let today = chrono::Utc::now().date_naive();
        let url = self.url_for(&base, &target, date, today);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(CoreError::Api {
                provider: "Frankfurter".into(),
                message: format!("HTTP {} for {base}/{target} on {date}", resp.status()),
            });
        }

        let body: RatesResponse = resp.json().await.map_err(|e| CoreError::Api {
            provider: "Frankfurter".into(),
            message: format!("Failed to parse rate for {base}/{target} on {date}: {e}"),
        })?;

        body.rates
            .get(&target)
            .copied()
            .ok_or_else(|| CoreError::RateNotAvailable {
                from: base.clone(),
                to: target.clone(),
                date: date.to_string(),
            })
    }
}
