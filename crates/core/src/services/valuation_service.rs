use crate::models::ledger::{LedgerEntry, LedgerEntryKind, ShareState};
use crate::models::valuation::Reconstruction;

/// Rebuilds a vault's current AUM and implied share price from its ledger.
///
/// A vault's price is marked periodically (a `Valuation` entry) while deposits
/// and withdrawals keep coming in between marks. The reconstruction anchors at
/// the most recent mark and layers on only the flows recorded after it. Flows
/// move AUM and share count together, so they never move the implied price.
pub struct ValuationReconstructor;

impl ValuationReconstructor {
    pub fn new() -> Self {
        Self
    }

    /// Derive rolling AUM and implied price-per-share.
    ///
    /// Returns an absent reconstruction when the ledger holds no valuation mark
    /// or the last mark's amount is not finite.
    pub fn reconstruct(&self, entries: &[LedgerEntry], share_state: &ShareState) -> Reconstruction {
        // Stable sort keeps arrival order for equal timestamps.
        let mut ordered: Vec<&LedgerEntry> =
            entries.iter().filter(|e| e.timestamp.is_some()).collect();
        ordered.sort_by_key(|e| e.timestamp);

        let Some(anchor_idx) = ordered.iter().rposition(|e| e.kind.is_valuation()) else {
            return Reconstruction::absent();
        };
        let anchor = ordered[anchor_idx];

        let base_aum = match anchor.kind {
            LedgerEntryKind::Valuation { aum_usd } if aum_usd.is_finite() => aum_usd,
            _ => return Reconstruction::absent(),
        };

        let (net_flow_usd, flow_shares) = ordered[anchor_idx + 1..]
            .iter()
            .fold((0.0, 0.0), |(usd, shares), e| {
                (usd + e.kind.signed_flow_usd(), shares + e.kind.signed_flow_shares())
            });

        let rolling_aum = base_aum + net_flow_usd;

        let total_shares = share_state
            .total_shares_outstanding
            .filter(|t| t.is_finite());
        let shares_at_anchor = total_shares.map(|t| t - flow_shares);

        let implied_price_per_share = match (total_shares, shares_at_anchor) {
            (Some(total), Some(at_anchor)) if at_anchor > 0.0 && total > 0.0 => {
                Some(rolling_aum / total).filter(|p| p.is_finite())
            }
            _ => None,
        };

        Reconstruction {
            rolling_aum: Some(rolling_aum).filter(|a| a.is_finite()),
            implied_price_per_share,
            anchor_timestamp: anchor.timestamp,
            net_flow_usd,
            flow_shares,
            shares_at_anchor,
        }
    }
}

impl Default for ValuationReconstructor {
    fn default() -> Self {
        Self::new()
    }
}
