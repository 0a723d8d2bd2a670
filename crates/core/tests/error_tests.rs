// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError variants, Display formatting, From impls
// ═══════════════════════════════════════════════════════════════════

use vault_valuation_core::errors::CoreError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn invalid_request() {
        let err = CoreError::InvalidRequest("row id must not be empty".into());
        assert_eq!(
            err.to_string(),
            "Invalid conversion request: row id must not be empty"
        );
    }

    #[test]
    fn invalid_settings() {
        let err = CoreError::InvalidSettings("days_per_year must be positive".into());
        assert_eq!(err.to_string(), "Invalid settings: days_per_year must be positive");
    }

    #[test]
    fn deserialization() {
        let err = CoreError::Deserialization("EOF".into());
        assert_eq!(err.to_string(), "Deserialization error: EOF");
    }

    #[test]
    fn api() {
        let err = CoreError::Api {
            provider: "Frankfurter".into(),
            message: "HTTP 500".into(),
        };
        assert_eq!(err.to_string(), "API error (Frankfurter): HTTP 500");
    }

    #[test]
    fn network() {
        let err = CoreError::Network("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn no_provider() {
        assert_eq!(CoreError::NoProvider.to_string(), "No rate provider registered");
    }

    #[test]
    fn rate_not_available() {
        let err = CoreError::RateNotAvailable {
            from: "USD".into(),
            to: "VND".into(),
            date: "2025-01-15".into(),
        };
        assert_eq!(err.to_string(), "Rate not available for USD → VND on 2025-01-15");
    }

    #[test]
    fn ledger_unavailable() {
        let err = CoreError::LedgerUnavailable {
            vault_id: "vault-1".into(),
            message: "timeout".into(),
        };
        assert_eq!(err.to_string(), "Ledger unavailable for vault vault-1: timeout");
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod from_impls {
    use super::*;

    #[test]
    fn from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let err: CoreError = json_err.into();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }

    #[tokio::test]
    async fn from_reqwest_redacts_query() {
        // Port 9 (discard) on localhost: connection is refused without touching the network.
        let reqwest_err = reqwest::Client::new()
            .get("http://127.0.0.1:9/latest?base=USD&symbols=EUR")
            .send()
            .await
            .unwrap_err();
        let err: CoreError = reqwest_err.into();
        match err {
            CoreError::Network(msg) => assert!(!msg.contains("symbols=EUR"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
