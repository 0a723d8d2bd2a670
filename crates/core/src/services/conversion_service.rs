use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

use crate::models::conversion::{
    AmountKey, CacheStats, ConversionRequest, ConversionResult, ConversionSource, ConvertedAmount,
};
use crate::models::rates::{usable_rate, CurrencyPair, FallbackRates, RateKey};
use crate::providers::traits::RateProvider;

/// Session-scoped conversion state. Append-only until `reset`.
#[derive(Default)]
struct CacheState {
    /// Bumped on reset; fetches started under an older generation are discarded.
    generation: u64,
    amounts: HashMap<AmountKey, ConvertedAmount>,
    rates: HashMap<RateKey, f64>,
    /// Keys with a fetch in flight. Membership is the per-key mutex.
    loading: HashSet<RateKey>,
    tasks: Vec<JoinHandle<()>>,
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Converts row amounts between currencies without ever blocking the caller.
///
/// Resolution order, first hit wins:
/// 1. converted amount already resolved for `(row_id, target)`
/// 2. identity (`local == target`), never cached
/// 3. rate embedded in the row (`"FROM-TO"` key)
/// 4. rate fetched earlier for the same pair and day
/// 5. fallback table, marked stale, while one background fetch per `(pair, day)` runs
///
/// Tiers 3 and 4 (and a completed fetch) cache the converted amount, so a row
/// keeps the same number for the rest of the session. Fallback results are not
/// cached: the next call after the real rate lands picks it up.
///
/// Clones share the same caches. Fetches are spawned on the ambient tokio runtime.
#[derive(Clone)]
pub struct ConversionCache {
    provider: Arc<dyn RateProvider>,
    fallback: Arc<FallbackRates>,
    state: Arc<Mutex<CacheState>>,
}

impl ConversionCache {
    pub fn new(provider: Arc<dyn RateProvider>, fallback: FallbackRates) -> Self {
        Self {
            provider,
            fallback: Arc::new(fallback),
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Convert one row. Always returns a finite, best-effort number.
    pub fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        let amount_key = request.amount_key();
        let pair = request.pair();

        let mut state = lock(&self.state);

        if let Some(cached) = state.amounts.get(&amount_key) {
            log::trace!("conversion cache hit for row {}", request.row_id);
            return ConversionResult::fresh(*cached, ConversionSource::Cached);
        }

        if pair.is_identity() {
            return ConversionResult::fresh(request.apply_rate(1.0), ConversionSource::Identity);
        }

        if let Some(rate) = request.inline_rate() {
            let converted = *state
                .amounts
                .entry(amount_key)
                .or_insert_with(|| request.apply_rate(rate));
            return ConversionResult::fresh(converted, ConversionSource::Inline);
        }

        let rate_key = request.rate_key();
        if let Some(rate) = state.rates.get(&rate_key).copied() {
            let converted = *state
                .amounts
                .entry(amount_key)
                .or_insert_with(|| request.apply_rate(rate));
            return ConversionResult::fresh(converted, ConversionSource::RateCache);
        }

        // Check-and-set under the same lock as the lookups above.
        if state.loading.insert(rate_key.clone()) {
            self.spawn_fetch(&mut state, request.clone(), rate_key);
        }
        drop(state);

        let rate = self.fallback.rate_for(&pair);
        ConversionResult::stale(request.apply_rate(rate))
    }

    /// Convert several rows, preserving order.
    pub fn convert_batch(&self, requests: &[ConversionRequest]) -> Vec<ConversionResult> {
        requests.iter().map(|r| self.convert(r)).collect()
    }

    fn spawn_fetch(&self, state: &mut CacheState, request: ConversionRequest, rate_key: RateKey) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!(
                    "no async runtime available; cannot fetch {} for {}",
                    rate_key.pair,
                    rate_key.date
                );
                state.loading.remove(&rate_key);
                return;
            }
        };

        log::debug!("fetching {} for {}", rate_key.pair, rate_key.date);

        let provider = Arc::clone(&self.provider);
        let shared = Arc::clone(&self.state);
        let generation = state.generation;

        let task = runtime.spawn(async move {
            let result = provider
                .get_rate(&rate_key.pair.from, &rate_key.pair.to, rate_key.date)
                .await;

            let mut state = lock(&shared);
            if state.generation != generation {
                log::debug!("discarding {} fetched before reset", rate_key.pair);
                return;
            }
            state.loading.remove(&rate_key);

            match result {
                Ok(rate) => match usable_rate(rate) {
                    Some(rate) => {
                        let rate = *state.rates.entry(rate_key.clone()).or_insert(rate);
                        state
                            .amounts
                            .entry(request.amount_key())
                            .or_insert_with(|| request.apply_rate(rate));
                        log::debug!("cached {} = {rate} for {}", rate_key.pair, rate_key.date);
                    }
                    None => log::warn!(
                        "{} returned unusable rate {rate} for {} on {}",
                        provider.name(),
                        rate_key.pair,
                        rate_key.date
                    ),
                },
                Err(e) => log::warn!(
                    "rate fetch for {} on {} failed: {e}",
                    rate_key.pair,
                    rate_key.date
                ),
            }
        });

        state.tasks.retain(|t| !t.is_finished());
        state.tasks.push(task);
    }

    /// Wait for every fetch spawned so far, including ones spawned while waiting.
    pub async fn settle(&self) {
        loop {
            let tasks = std::mem::take(&mut lock(&self.state).tasks);
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    log::warn!("rate fetch task ended abnormally: {e}");
                }
            }
        }
    }

    /// Drop everything cached this session. Fetches still in flight finish
    /// but do not write into the new session's caches.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        state.amounts.clear();
        state.rates.clear();
        state.loading.clear();
    }

    /// Rate fetched for a pair on a day, if any.
    pub fn cached_rate(&self, from: &str, to: &str, date: NaiveDate) -> Option<f64> {
        let key = RateKey::new(CurrencyPair::new(from, to), date);
        lock(&self.state).rates.get(&key).copied()
    }

    pub fn is_loading(&self, from: &str, to: &str, date: NaiveDate) -> bool {
        let key = RateKey::new(CurrencyPair::new(from, to), date);
        lock(&self.state).loading.contains(&key)
    }

    pub fn stats(&self) -> CacheStats {
        let state = lock(&self.state);
        CacheStats {
            converted_amounts: state.amounts.len(),
            rates: state.rates.len(),
            in_flight: state.loading.len(),
        }
    }
}
