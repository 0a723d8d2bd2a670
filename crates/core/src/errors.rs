use thiserror::Error;

/// Unified error type for the vault-valuation-core library.
///
/// Data-quality problems (missing anchor, unavailable rate) are never errors:
/// they surface as `None` results or stale conversions. `CoreError` is reserved
/// for malformed input and for failures reported by external providers.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Caller input ────────────────────────────────────────────────
    #[error("Invalid conversion request: {0}")]
    InvalidRequest(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No rate provider registered")]
    NoProvider,

    #[error("Rate not available for {from} → {to} on {date}")]
    RateNotAvailable {
        from: String,
        to: String,
        date: String,
    },

    // ── Ledger ──────────────────────────────────────────────────────
    #[error("Ledger unavailable for vault {vault_id}: {message}")]
    LedgerUnavailable {
        vault_id: String,
        message: String,
    },
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors embed the full URL; keep the query string out of logs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
