use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Values derived from a vault ledger anchored at its last valuation mark.
///
/// `rolling_aum` and `implied_price_per_share` are `None` when the ledger has
/// no usable anchor; callers fall back to statically configured figures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reconstruction {
    /// Anchor AUM plus net USD flows since the anchor
    pub rolling_aum: Option<f64>,

    /// `rolling_aum / total_shares_outstanding`, absent when share accounting is inconsistent
    pub implied_price_per_share: Option<f64>,

    /// Timestamp of the valuation mark used as anchor
    pub anchor_timestamp: Option<DateTime<Utc>>,

    /// Deposits minus withdrawals (USD) after the anchor
    pub net_flow_usd: f64,

    /// Shares issued minus shares redeemed after the anchor
    pub flow_shares: f64,

    /// Shares outstanding at the anchor, when the current total is known
    pub shares_at_anchor: Option<f64>,
}

impl Reconstruction {
    /// No anchor: nothing can be derived.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn is_anchored(&self) -> bool {
        self.rolling_aum.is_some()
    }
}
