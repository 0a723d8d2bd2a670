use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::ledger::{LedgerEntry, ShareState};

/// Source of exchange rates.
///
/// Each API (Frankfurter, a backend endpoint, a test double) implements this trait.
/// The conversion cache only ever calls `get_rate`; swapping providers touches
/// nothing else.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Rate to multiply an amount in `from` by to get `to`, as of `date`.
    async fn get_rate(&self, from: &str, to: &str, date: NaiveDate) -> Result<f64, CoreError>;
}

/// Source of vault ledger data, owned by the external ledger service.
///
/// Entries are expected to be deduplicated and to belong to the one vault asked for.
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn load_ledger(&self, vault_id: &str) -> Result<Vec<LedgerEntry>, CoreError>;

    async fn load_share_state(&self, vault_id: &str) -> Result<ShareState, CoreError>;
}
