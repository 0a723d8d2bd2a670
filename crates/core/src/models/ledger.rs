use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// What happened in a single ledger record.
///
/// Deposits and withdrawals are cash flows that issue or redeem shares.
/// A valuation is an authoritative mark of the vault's total AUM and is not a flow.
/// Amounts are positive magnitudes; the variant carries the sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEntryKind {
    Deposit {
        #[serde(default, deserialize_with = "zero_if_null")]
        amount_usd: f64,
        #[serde(default, deserialize_with = "zero_if_null")]
        shares: f64,
    },
    Withdraw {
        #[serde(default, deserialize_with = "zero_if_null")]
        amount_usd: f64,
        #[serde(default, deserialize_with = "zero_if_null")]
        shares: f64,
    },
    Valuation {
        /// A mark without an amount is not a usable anchor.
        #[serde(default = "missing_amount", deserialize_with = "missing_if_null")]
        aum_usd: f64,
    },
}

fn missing_amount() -> f64 {
    f64::NAN
}

// A null flow amount counts as zero; a null mark is a missing anchor.
// serde_json writes a non-finite f64 as null, so this also reads our own output back.
fn zero_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

fn missing_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_else(missing_amount))
}

impl LedgerEntryKind {
    /// Signed USD contribution of a flow. Valuations and non-finite amounts contribute 0.
    pub fn signed_flow_usd(&self) -> f64 {
        match self {
            LedgerEntryKind::Deposit { amount_usd, .. } => finite_or_zero(*amount_usd),
            LedgerEntryKind::Withdraw { amount_usd, .. } => -finite_or_zero(*amount_usd),
            LedgerEntryKind::Valuation { .. } => 0.0,
        }
    }

    /// Signed share contribution of a flow. Valuations and non-finite counts contribute 0.
    pub fn signed_flow_shares(&self) -> f64 {
        match self {
            LedgerEntryKind::Deposit { shares, .. } => finite_or_zero(*shares),
            LedgerEntryKind::Withdraw { shares, .. } => -finite_or_zero(*shares),
            LedgerEntryKind::Valuation { .. } => 0.0,
        }
    }

    pub fn is_valuation(&self) -> bool {
        matches!(self, LedgerEntryKind::Valuation { .. })
    }
}

impl std::fmt::Display for LedgerEntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerEntryKind::Deposit { .. } => write!(f, "Deposit"),
            LedgerEntryKind::Withdraw { .. } => write!(f, "Withdraw"),
            LedgerEntryKind::Valuation { .. } => write!(f, "Valuation"),
        }
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// One immutable record of vault activity, as supplied by the ledger service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier
    pub id: Uuid,

    /// When the entry was recorded. Entries without one are skipped during reconstruction.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    /// Flow or mark, with its per-variant amounts
    #[serde(flatten)]
    pub kind: LedgerEntryKind,

    /// Optional free-text notes
    #[serde(default)]
    pub notes: Option<String>,
}

impl LedgerEntry {
    pub fn new(kind: LedgerEntryKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Some(timestamp),
            kind,
            notes: None,
        }
    }

    pub fn deposit(amount_usd: f64, shares: f64, timestamp: DateTime<Utc>) -> Self {
        Self::new(LedgerEntryKind::Deposit { amount_usd, shares }, timestamp)
    }

    pub fn withdraw(amount_usd: f64, shares: f64, timestamp: DateTime<Utc>) -> Self {
        Self::new(LedgerEntryKind::Withdraw { amount_usd, shares }, timestamp)
    }

    pub fn valuation(aum_usd: f64, timestamp: DateTime<Utc>) -> Self {
        Self::new(LedgerEntryKind::Valuation { aum_usd }, timestamp)
    }

    /// Attach notes to an entry.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Current share totals reported by the ledger owner. Not derived by this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareState {
    #[serde(default)]
    pub total_shares_outstanding: Option<f64>,
}

impl ShareState {
    pub fn new(total_shares_outstanding: f64) -> Self {
        Self {
            total_shares_outstanding: Some(total_shares_outstanding),
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }
}
